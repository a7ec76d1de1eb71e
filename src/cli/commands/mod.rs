pub mod auth;
pub mod browse;
pub mod init;
pub mod list;
pub mod play;
pub mod utils;
