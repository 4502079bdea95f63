pub mod action_log;
pub mod answer;
pub mod option;
pub mod question;
