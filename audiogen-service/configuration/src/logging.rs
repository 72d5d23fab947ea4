use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
/// Calling it twice keeps the first subscriber.
pub fn setup_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new(default_level()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Full => builder.try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(
            level = %config.logging.level,
            format = ?config.logging.format,
            "logging initialized"
        );
    }
}

fn default_level() -> String {
    "info".to_string()
}
