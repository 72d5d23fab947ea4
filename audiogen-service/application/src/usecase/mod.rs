mod generate_audio;
mod health;

pub use generate_audio::{GenerateAudioUseCase, GenerateAudioUseCaseImpl, GenerationSettings};
pub use health::{HealthUseCase, HealthUseCaseImpl};
