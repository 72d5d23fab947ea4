use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use audiogen_application::{
    Clock, ErrorKind, GenerateAudioRequest, GenerateAudioUseCase, GenerateAudioUseCaseImpl,
    GenerationOutcome, GenerationSettings,
};
use audiogen_domain::{
    AudioEncoderPort, AudioFormat, DomainError, EncodedAudio, GenerationParams, GenerativeModel,
    ModelFamily, ModelRegistryPort, ModelVariant, MonoAudio, ObjectStoragePort, RawAudio,
    ReferenceAudio, ReferenceAudioPort, StoredObject,
};

#[derive(Clone, Copy)]
enum ModelBehaviour {
    Tone,
    Fail,
    Hang,
    Panic,
    NoChannels,
    ZeroSampleRate,
}

struct StubModel {
    behaviour: ModelBehaviour,
    seen: Arc<Mutex<Vec<GenerationParams>>>,
}

#[async_trait]
impl GenerativeModel for StubModel {
    fn model_id(&self) -> &str {
        "stub/model"
    }

    fn sample_rate_hz(&self) -> u32 {
        8_000
    }

    async fn generate(&self, params: GenerationParams) -> Result<RawAudio, DomainError> {
        let frames = params.duration_secs as usize * 8_000;
        self.seen.lock().expect("lock").push(params);
        match self.behaviour {
            ModelBehaviour::Tone => Ok(RawAudio {
                sample_rate_hz: 8_000,
                channels: vec![vec![0.5; frames], vec![-0.5; frames]],
            }),
            ModelBehaviour::Fail => Err(DomainError::external_service_error(
                "model",
                "out of memory",
            )),
            ModelBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(RawAudio {
                    sample_rate_hz: 8_000,
                    channels: vec![Vec::new()],
                })
            }
            ModelBehaviour::Panic => panic!("tensor shape mismatch"),
            ModelBehaviour::NoChannels => Ok(RawAudio {
                sample_rate_hz: 8_000,
                channels: Vec::new(),
            }),
            ModelBehaviour::ZeroSampleRate => Ok(RawAudio {
                sample_rate_hz: 0,
                channels: vec![vec![0.5; frames]],
            }),
        }
    }
}

struct StubRegistry {
    behaviour: ModelBehaviour,
    fail_load: bool,
    loads: AtomicUsize,
    requested: Mutex<Vec<(ModelFamily, ModelVariant)>>,
    seen: Arc<Mutex<Vec<GenerationParams>>>,
}

impl StubRegistry {
    fn new(behaviour: ModelBehaviour) -> Self {
        Self {
            behaviour,
            fail_load: false,
            loads: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::new(ModelBehaviour::Tone)
        }
    }
}

#[async_trait]
impl ModelRegistryPort for StubRegistry {
    async fn load(
        &self,
        family: ModelFamily,
        variant: ModelVariant,
    ) -> Result<Arc<dyn GenerativeModel>, DomainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().expect("lock").push((family, variant));
        if self.fail_load {
            return Err(DomainError::external_service_error(
                "model_registry",
                "repository not found",
            ));
        }
        Ok(Arc::new(StubModel {
            behaviour: self.behaviour,
            seen: self.seen.clone(),
        }))
    }
}

struct StubReferenceAudio {
    fail: bool,
}

#[async_trait]
impl ReferenceAudioPort for StubReferenceAudio {
    async fn load(&self, path: &Path) -> Result<ReferenceAudio, DomainError> {
        if self.fail {
            return Err(DomainError::io_error(&format!(
                "{} does not exist",
                path.display()
            )));
        }
        Ok(ReferenceAudio {
            sample_rate_hz: 8_000,
            channels: vec![vec![0.1; 800]],
        })
    }
}

/// Writes the samples as raw little-endian floats and reads them back.
struct StubEncoder {
    dir: PathBuf,
}

#[async_trait]
impl AudioEncoderPort for StubEncoder {
    async fn encode(&self, audio: MonoAudio, stem: &str) -> Result<EncodedAudio, DomainError> {
        let filename = format!("{stem}.wav");
        let path = self.dir.join(&filename);
        let payload = audio
            .samples
            .iter()
            .flat_map(|sample| sample.to_le_bytes())
            .collect::<Vec<u8>>();
        tokio::fs::write(&path, payload).await?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(EncodedAudio {
            path,
            filename,
            format: AudioFormat::Wav,
            bytes,
        })
    }
}

struct FailingEncoder;

#[async_trait]
impl AudioEncoderPort for FailingEncoder {
    async fn encode(&self, _audio: MonoAudio, _stem: &str) -> Result<EncodedAudio, DomainError> {
        Err(DomainError::io_error("disk full"))
    }
}

struct StubStorage {
    fail: bool,
    keys: Mutex<Vec<String>>,
}

impl StubStorage {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            keys: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ObjectStoragePort for StubStorage {
    async fn upload(
        &self,
        file: &Path,
        key: &str,
        _content_type: &str,
    ) -> Result<StoredObject, DomainError> {
        self.keys.lock().expect("lock").push(key.to_string());
        if self.fail {
            return Err(DomainError::external_service_error("s3", "access denied"));
        }
        assert!(file.exists(), "upload must see the encoded file");
        Ok(StoredObject {
            bucket: "test-bucket".to_string(),
            key: key.to_string(),
            uri: format!("s3://test-bucket/{key}"),
        })
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .and_then(|date| date.and_hms_opt(3, 4, 5))
            .expect("valid timestamp")
    }
}

struct Harness {
    dir: TempDir,
    registry: Arc<StubRegistry>,
    storage: Arc<StubStorage>,
    usecase: GenerateAudioUseCaseImpl,
}

fn harness_with(
    registry: StubRegistry,
    storage: StubStorage,
    reference_fails: bool,
    settings: GenerationSettings,
) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = Arc::new(registry);
    let storage = Arc::new(storage);
    let usecase = GenerateAudioUseCaseImpl::new(
        registry.clone(),
        Arc::new(StubReferenceAudio {
            fail: reference_fails,
        }),
        Arc::new(StubEncoder {
            dir: dir.path().to_path_buf(),
        }),
        storage.clone(),
        Arc::new(FixedClock),
        settings,
    );
    Harness {
        dir,
        registry,
        storage,
        usecase,
    }
}

fn harness(registry: StubRegistry, storage: StubStorage) -> Harness {
    harness_with(registry, storage, false, GenerationSettings::default())
}

fn expect_failure(outcome: &GenerationOutcome, kind: ErrorKind) -> String {
    let failure = outcome.error().expect("failure outcome");
    assert_eq!(failure.error_kind, kind, "unexpected kind: {}", failure.error);
    failure.error.clone()
}

#[tokio::test]
async fn default_music_request_succeeds_end_to_end() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("test tone").with_duration(5),
        )
        .await;

    let success = outcome.success().expect("success outcome");
    assert_eq!(success.duration, 5);
    assert_eq!(success.format, AudioFormat::Wav);
    assert_eq!(success.prompt_used, "test tone");
    assert_eq!(success.model_size, ModelVariant::Large);
    assert_eq!(success.sampling_rate, 8_000);
    assert_eq!(success.filename, "generated_music_20250102_030405.wav");
    assert_eq!(success.file_size_bytes, success.audio.len());
    // 5 s at 8 kHz, stereo averaged to silence, 4 bytes per sample
    assert_eq!(success.audio.len(), 5 * 8_000 * 4);
    assert!(success.audio.iter().all(|byte| *byte == 0));

    let storage = success.storage.as_ref().expect("storage fields");
    assert_eq!(storage.s3_bucket, "test-bucket");
    assert_eq!(storage.s3_key, "audio/generated_music_20250102_030405.wav");
    assert_eq!(
        storage.s3_uri,
        "s3://test-bucket/audio/generated_music_20250102_030405.wav"
    );

    let value = serde_json::to_value(&outcome).expect("serializes");
    assert_eq!(value["success"], true);
    assert_eq!(value["duration"], 5);
    assert_eq!(value["format"], "wav");
    assert_eq!(value["prompt_used"], "test tone");
}

#[tokio::test]
async fn model_receives_prompt_and_duration() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    h.usecase
        .generate(
            ModelFamily::SoundEffect,
            GenerateAudioRequest::new("door creak").with_duration(3),
        )
        .await;

    let seen = h.registry.seen.lock().expect("lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].prompt, "door creak");
    assert_eq!(seen[0].duration_secs, 3);
    assert!(seen[0].melody.is_none());
    assert_eq!(
        h.registry.requested.lock().expect("lock").as_slice(),
        &[(ModelFamily::SoundEffect, ModelVariant::Medium)]
    );
}

#[tokio::test]
async fn invalid_variant_never_loads_a_model() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("jazz").with_model_size("gigantic"),
        )
        .await;

    let message = expect_failure(&outcome, ErrorKind::Validation);
    assert!(message.starts_with("Invalid model size"));
    assert_eq!(h.registry.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn validation_failures_never_load_a_model() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    for request in [
        GenerateAudioRequest::new("jazz").with_duration(0),
        GenerateAudioRequest::new("jazz").with_duration(301),
        GenerateAudioRequest::new("   ").with_duration(10),
    ] {
        let outcome = h.usecase.generate(ModelFamily::Music, request).await;
        expect_failure(&outcome, ErrorKind::Validation);
    }
    assert_eq!(h.registry.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_credentials_are_a_configuration_failure() {
    let h = harness_with(
        StubRegistry::new(ModelBehaviour::Tone),
        StubStorage::new(false),
        false,
        GenerationSettings {
            missing_credentials: vec!["AWS_SECRET_ACCESS_KEY".to_string()],
            ..GenerationSettings::default()
        },
    );

    let outcome = h
        .usecase
        .generate(ModelFamily::Music, GenerateAudioRequest::new("jazz"))
        .await;

    let message = expect_failure(&outcome, ErrorKind::Configuration);
    assert!(message.contains("AWS_SECRET_ACCESS_KEY"));
    assert_eq!(h.registry.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn storage_failure_still_returns_inline_audio() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(true));

    let outcome = h
        .usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("ambient pads").with_duration(2),
        )
        .await;

    assert!(outcome.is_success());
    let success = outcome.success().expect("success outcome");
    assert!(!success.audio.is_empty());
    assert!(success.storage.is_none());
    assert!(success
        .storage_error
        .as_deref()
        .is_some_and(|error| error.contains("access denied")));

    let value = serde_json::to_value(&outcome).expect("serializes");
    assert!(value.get("s3_uri").is_none());
    assert!(value.get("s3_bucket").is_none());
    assert!(value.get("s3_key").is_none());
    assert!(value["audio_base64"].as_str().is_some_and(|b64| !b64.is_empty()));
}

#[tokio::test]
async fn deduplication_id_namespaces_the_key() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("lofi")
                .with_duration(1)
                .with_deduplication_id("abc123"),
        )
        .await;

    let success = outcome.success().expect("success outcome");
    assert_eq!(success.message_deduplication_id.as_deref(), Some("abc123"));
    let keys = h.storage.keys.lock().expect("lock");
    assert_eq!(keys.len(), 1);
    assert!(keys[0].split('/').any(|segment| segment == "abc123"));
    assert_eq!(keys[0], "musicgen/abc123/musicgen_abc123_20250102_030405.wav");
}

#[tokio::test]
async fn missing_deduplication_id_uses_default_prefix() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    h.usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("lofi").with_duration(1),
        )
        .await;

    let keys = h.storage.keys.lock().expect("lock");
    assert_eq!(keys.as_slice(), &["audio/generated_music_20250102_030405.wav"]);
}

#[tokio::test]
async fn melody_generation_passes_reference_audio() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(
            ModelFamily::MelodyMusic,
            GenerateAudioRequest::new("bach on synths")
                .with_duration(2)
                .with_melody_path("/refs/bach.wav"),
        )
        .await;

    let success = outcome.success().expect("success outcome");
    assert_eq!(success.model_size, ModelVariant::Melody);
    assert_eq!(success.melody_path.as_deref(), Some("/refs/bach.wav"));
    let seen = h.registry.seen.lock().expect("lock");
    assert!(seen[0]
        .melody
        .as_ref()
        .is_some_and(|melody| melody.frame_count() == 800));
}

#[tokio::test]
async fn model_load_failure_is_a_dependency_error() {
    let h = harness(StubRegistry::failing_load(), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(ModelFamily::Music, GenerateAudioRequest::new("jazz"))
        .await;

    let message = expect_failure(&outcome, ErrorKind::Dependency);
    assert!(message.starts_with("Model loading failed"));
    assert!(h.storage.keys.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn blank_melody_path_is_rejected_before_loading() {
    let h = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(
            ModelFamily::MelodyMusic,
            GenerateAudioRequest::new("jazz").with_melody_path("   "),
        )
        .await;

    assert_eq!(
        expect_failure(&outcome, ErrorKind::Validation),
        "Melody path is required"
    );
    assert_eq!(h.registry.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reference_audio_failure_is_a_dependency_error() {
    let h = harness_with(
        StubRegistry::new(ModelBehaviour::Tone),
        StubStorage::new(false),
        true,
        GenerationSettings::default(),
    );

    let outcome = h
        .usecase
        .generate(
            ModelFamily::MelodyMusic,
            GenerateAudioRequest::new("folk").with_melody_path("/missing.wav"),
        )
        .await;

    let message = expect_failure(&outcome, ErrorKind::Dependency);
    assert!(message.starts_with("Melody loading failed"));
    assert!(h.registry.seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn generation_failure_is_tagged() {
    let h = harness(StubRegistry::new(ModelBehaviour::Fail), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(ModelFamily::SoundEffect, GenerateAudioRequest::new("thunder"))
        .await;

    let message = expect_failure(&outcome, ErrorKind::Generation);
    assert!(message.starts_with("Audio generation failed"));
    assert!(message.contains("out of memory"));
}

#[tokio::test]
async fn model_output_without_channels_is_a_generation_failure() {
    let h = harness(
        StubRegistry::new(ModelBehaviour::NoChannels),
        StubStorage::new(false),
    );

    let outcome = h
        .usecase
        .generate(ModelFamily::Music, GenerateAudioRequest::new("silence"))
        .await;

    let message = expect_failure(&outcome, ErrorKind::Generation);
    assert!(message.starts_with("Music generation failed"));
    assert!(h.storage.keys.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn model_output_with_zero_sample_rate_is_a_generation_failure() {
    let h = harness(
        StubRegistry::new(ModelBehaviour::ZeroSampleRate),
        StubStorage::new(false),
    );

    let outcome = h
        .usecase
        .generate(ModelFamily::SoundEffect, GenerateAudioRequest::new("wind").with_duration(1))
        .await;

    let message = expect_failure(&outcome, ErrorKind::Generation);
    assert!(message.starts_with("Audio generation failed"));
}

#[tokio::test]
async fn encoding_failure_is_unknown_and_skips_upload() {
    let storage = Arc::new(StubStorage::new(false));
    let usecase = GenerateAudioUseCaseImpl::new(
        Arc::new(StubRegistry::new(ModelBehaviour::Tone)),
        Arc::new(StubReferenceAudio { fail: false }),
        Arc::new(FailingEncoder),
        storage.clone(),
        Arc::new(FixedClock),
        GenerationSettings::default(),
    );

    let outcome = usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("lofi").with_duration(1),
        )
        .await;

    let message = expect_failure(&outcome, ErrorKind::Unknown);
    assert_eq!(message, "Audio encoding failed: i/o error: disk full");
    assert!(storage.keys.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn slow_generation_hits_the_time_budget() {
    let h = harness_with(
        StubRegistry::new(ModelBehaviour::Hang),
        StubStorage::new(false),
        false,
        GenerationSettings {
            generation_timeout: Duration::from_millis(20),
            ..GenerationSettings::default()
        },
    );

    let outcome = h
        .usecase
        .generate(ModelFamily::Music, GenerateAudioRequest::new("drone"))
        .await;

    let message = expect_failure(&outcome, ErrorKind::Generation);
    assert!(message.starts_with("Music generation failed"));
}

#[tokio::test]
async fn panics_are_contained() {
    let h = harness(StubRegistry::new(ModelBehaviour::Panic), StubStorage::new(false));

    let outcome = h
        .usecase
        .generate(ModelFamily::Music, GenerateAudioRequest::new("glitch"))
        .await;

    let message = expect_failure(&outcome, ErrorKind::Unknown);
    assert!(message.contains("tensor shape mismatch"));
}

#[tokio::test]
async fn local_file_is_removed_unless_retained() {
    let removed = harness(StubRegistry::new(ModelBehaviour::Tone), StubStorage::new(false));
    removed
        .usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("lofi").with_duration(1),
        )
        .await;
    assert!(!removed
        .dir
        .path()
        .join("generated_music_20250102_030405.wav")
        .exists());

    let retained = harness_with(
        StubRegistry::new(ModelBehaviour::Tone),
        StubStorage::new(false),
        false,
        GenerationSettings {
            retain_local_files: true,
            ..GenerationSettings::default()
        },
    );
    retained
        .usecase
        .generate(
            ModelFamily::Music,
            GenerateAudioRequest::new("lofi").with_duration(1),
        )
        .await;
    assert!(retained
        .dir
        .path()
        .join("generated_music_20250102_030405.wav")
        .exists());
}
