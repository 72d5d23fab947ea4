use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod logging;

pub use logging::{setup_logging, LogFormat, LoggingConfig};

pub type AppConfig = AudiogenConfig;

pub const CONFIG_PREFIX: &str = "AUDIOGEN_SERVICE";

/// Well-known variables read by the hosting platform, mapped onto config keys.
const WELL_KNOWN_VARS: &[(&str, &str)] = &[
    ("AWS_ACCESS_KEY_ID", "storage.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "storage.secret_access_key"),
    ("S3_BUCKET_NAME", "storage.bucket"),
    ("AWS_REGION", "storage.region"),
    ("S3_ENDPOINT_URL", "storage.endpoint_url"),
    ("HUGGING_FACE_TOKEN", "model.provider_token"),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudiogenConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub provider_token: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default = "default_model_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_model_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retain_local_files: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_loudness_headroom_db")]
    pub loudness_headroom_db: f32,
    #[serde(default = "default_true")]
    pub loudness_compressor: bool,
    #[serde(default = "default_energy_floor")]
    pub energy_floor: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            endpoint_url: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_model_endpoint(),
            provider_token: None,
            cache_dir: None,
            request_timeout_secs: default_model_request_timeout_secs(),
            connect_timeout_secs: default_model_connect_timeout_secs(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            timeout_secs: default_generation_timeout_secs(),
            retain_local_files: false,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            loudness_headroom_db: default_loudness_headroom_db(),
            loudness_compressor: true,
            energy_floor: default_energy_floor(),
        }
    }
}

impl AudiogenConfig {
    /// Names of the well-known variables whose required value is absent.
    pub fn missing_credentials(&self) -> Vec<String> {
        [
            ("AWS_ACCESS_KEY_ID", &self.storage.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &self.storage.secret_access_key),
            ("S3_BUCKET_NAME", &self.storage.bucket),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// Where configuration comes from. `from_process` reads the real environment;
/// tests build one by hand.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    pub config_dir: PathBuf,
    pub run_env: Option<String>,
    pub vars: config::Map<String, String>,
}

impl ConfigSources {
    pub fn from_process() -> Self {
        let vars: config::Map<String, String> = std::env::vars().collect();
        Self {
            config_dir: vars
                .get("AUDIOGEN_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config")),
            run_env: vars.get("RUN_ENV").cloned(),
            vars,
        }
    }
}

pub fn load_config() -> Result<AudiogenConfig, ConfigError> {
    load_config_from(&ConfigSources::from_process())
}

/// Layers `default.toml`, `{run_env}.toml`, prefixed variables and then the
/// well-known variables, later sources winning.
pub fn load_config_from(sources: &ConfigSources) -> Result<AudiogenConfig, ConfigError> {
    let mut builder = config::Config::builder().add_source(
        config::File::from(sources.config_dir.join("default.toml")).required(false),
    );
    if let Some(run_env) = sources.run_env.as_deref().filter(|env| !env.is_empty()) {
        builder = builder.add_source(
            config::File::from(sources.config_dir.join(format!("{run_env}.toml")))
                .required(false),
        );
    }
    builder = builder.add_source(
        config::Environment::with_prefix(CONFIG_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(Some(sources.vars.clone())),
    );

    for (var, key) in WELL_KNOWN_VARS {
        let value = sources
            .vars
            .get(*var)
            .filter(|value| !value.is_empty())
            .cloned();
        builder = builder.set_override_option(*key, value)?;
    }

    Ok(builder.build()?.try_deserialize::<AudiogenConfig>()?)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_model_endpoint() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_model_request_timeout_secs() -> u64 {
    900
}

fn default_model_connect_timeout_secs() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("audiogen")
}

fn default_generation_timeout_secs() -> u64 {
    600
}

fn default_loudness_headroom_db() -> f32 {
    14.0
}

fn default_energy_floor() -> f32 {
    2e-3
}

fn default_true() -> bool {
    true
}
