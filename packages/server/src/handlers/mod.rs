pub mod client_log;
pub mod files;
pub mod health;
