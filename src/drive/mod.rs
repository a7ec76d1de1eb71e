pub mod client;
mod traits;
mod types;

pub use client::{media_url, DriveClient, DEFAULT_API_BASE};
pub use traits::FileLister;
pub use types::TrackRef;
