extern crate casbin;
extern crate chrono;
extern crate default;
extern crate dotenv;
extern crate hex;
extern crate itertools;
extern crate log;
extern crate serde;
extern crate serde_json;
extern crate sha2;
extern crate sqlx;
extern crate thiserror;

pub mod config;
pub mod core;
pub mod database;
pub mod error;
pub mod impls;
pub mod privilege;

pub use crate::error::Error;
