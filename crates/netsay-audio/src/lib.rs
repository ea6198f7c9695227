pub mod output;
pub mod playback;
pub mod session;

pub use output::AudioOutput;
pub use playback::CpalOutput;
pub use session::{StreamSession, DEFAULT_WRITE_TIMEOUT};
