use std::path::{Path, PathBuf};

use async_trait::async_trait;
use audiogen_domain::{
    AudioEncoderPort, AudioFormat, DependencyProbe, DomainError, EncodedAudio, MonoAudio,
};

use uuid::Uuid;

use crate::{normalize_loudness, LoudnessSettings};

/// Writes mono 16-bit PCM WAV files into a scratch directory.
pub struct WavFileEncoder {
    output_dir: PathBuf,
    loudness: LoudnessSettings,
}

impl WavFileEncoder {
    pub fn new(output_dir: impl Into<PathBuf>, loudness: LoudnessSettings) -> Self {
        Self {
            output_dir: output_dir.into(),
            loudness,
        }
    }
}

#[async_trait]
impl AudioEncoderPort for WavFileEncoder {
    async fn encode(&self, audio: MonoAudio, stem: &str) -> Result<EncodedAudio, DomainError> {
        if audio.sample_rate_hz == 0 {
            return Err(DomainError::invalid_input(
                "sample rate must be greater than zero",
            ));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let format = AudioFormat::Wav;
        let filename = format!("{stem}.{}", format.extension());
        // Same-second requests share a stem; the scratch file must not collide.
        let path = self
            .output_dir
            .join(format!("{stem}-{}.{}", Uuid::new_v4().simple(), format.extension()));

        let loudness = self.loudness;
        let target = path.clone();
        let written = async {
            let gain_db =
                tokio::task::spawn_blocking(move || write_pcm16(&target, audio, &loudness))
                    .await
                    .map_err(|err| {
                        DomainError::internal_error(&format!("wav writer task failed: {err}"))
                    })??;
            let bytes = tokio::fs::read(&path).await?;
            Ok::<_, DomainError>((gain_db, bytes))
        }
        .await;
        let (gain_db, bytes) = discard_on_error(&path, written).await?;

        tracing::debug!(
            path = %path.display(),
            gain_db,
            bytes = bytes.len(),
            "encoded wav file"
        );

        Ok(EncodedAudio {
            path,
            filename,
            format,
            bytes,
        })
    }
}

#[async_trait]
impl DependencyProbe for WavFileEncoder {
    fn dependency_name(&self) -> &'static str {
        "audio_workspace"
    }

    async fn is_available(&self) -> bool {
        match tokio::fs::create_dir_all(&self.output_dir).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    output_dir = %self.output_dir.display(),
                    error = %err,
                    "audio workspace is not writable"
                );
                false
            }
        }
    }
}

// A partial file is never handed to the caller, so nothing else removes it.
async fn discard_on_error<T>(
    path: &Path,
    result: Result<T, DomainError>,
) -> Result<T, DomainError> {
    if result.is_err() {
        if let Err(err) = tokio::fs::remove_file(path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to remove partial wav file"
                );
            }
        }
    }
    result
}

fn write_pcm16(
    path: &Path,
    audio: MonoAudio,
    loudness: &LoudnessSettings,
) -> Result<f32, DomainError> {
    let mut samples = audio.samples;
    let gain_db = normalize_loudness(&mut samples, loudness);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in samples {
        writer
            .write_sample(to_pcm16(sample))
            .map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;

    Ok(gain_db)
}

fn to_pcm16(sample: f32) -> i16 {
    (sample * 32_768.0).round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

fn wav_error(error: hound::Error) -> DomainError {
    DomainError::io_error(&format!("wav encoding failed: {error}"))
}
