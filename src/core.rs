pub mod models;
pub mod permissions;
pub mod ports;
pub mod services;
pub mod uploader;
