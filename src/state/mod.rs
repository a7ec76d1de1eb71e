mod config;
pub mod library;

pub use config::Config;
pub use library::{spawn_refresh, Library, RefreshOutcome, RefreshResult};
