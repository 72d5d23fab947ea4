use std::path::{Path, PathBuf};

use async_trait::async_trait;
use audiogen_domain::{DomainError, ReferenceAudio, ReferenceAudioPort};

/// Reads reference melodies from WAV files on the worker's filesystem.
#[derive(Default)]
pub struct WavReferenceAudioLoader;

impl WavReferenceAudioLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReferenceAudioPort for WavReferenceAudioLoader {
    async fn load(&self, path: &Path) -> Result<ReferenceAudio, DomainError> {
        let path: PathBuf = path.to_path_buf();
        let audio = tokio::task::spawn_blocking(move || read_wav(&path))
            .await
            .map_err(|err| {
                DomainError::internal_error(&format!("wav reader task failed: {err}"))
            })??;

        tracing::debug!(
            sample_rate_hz = audio.sample_rate_hz,
            channels = audio.channels.len(),
            frames = audio.frame_count(),
            "reference audio decoded"
        );
        Ok(audio)
    }
}

fn read_wav(path: &Path) -> Result<ReferenceAudio, DomainError> {
    let reader = hound::WavReader::open(path).map_err(|err| {
        DomainError::io_error(&format!("cannot open {}: {err}", path.display()))
    })?;
    let spec = reader.spec();
    let channel_count = usize::from(spec.channels);
    if channel_count == 0 {
        return Err(DomainError::invalid_input("reference audio has no channels"));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>(),
        hound::SampleFormat::Int => {
            let max_val = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
        }
    }
    .map_err(|err| DomainError::io_error(&format!("cannot decode {}: {err}", path.display())))?;

    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, sample) in channels.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    Ok(ReferenceAudio {
        sample_rate_hz: spec.sample_rate,
        channels,
    })
}
