pub mod engine;
pub mod events;
pub mod mpv;
pub mod session;

pub use engine::{EngineFactory, MediaRequest, PlaybackEngine};
pub use events::{EngineEvent, PlaybackEvent, PlaybackState};
pub use mpv::MpvFactory;
pub use session::{SessionManager, SessionOptions};
