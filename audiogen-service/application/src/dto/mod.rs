mod generate_audio;
mod health;

pub use generate_audio::GenerateAudioRequest;
pub use health::{HealthReport, HealthStatus, PingResponse};
