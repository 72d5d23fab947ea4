mod encoder;
mod loudness;
mod reference;

pub use encoder::WavFileEncoder;
pub use loudness::{normalize_loudness, LoudnessSettings};
pub use reference::WavReferenceAudioLoader;
