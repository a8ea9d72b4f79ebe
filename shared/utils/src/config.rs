use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

use crate::bom::LevelFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterConfig {
    pub api: ApiConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub url: String,
    /// Bearer token obtained out of band (client-credentials flow)
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub level_format: LevelFormat,
    /// Prepend a level-0 row named after the file when the export has none
    pub synthesize_root: bool,
    /// Look up every referenced part number in one batched query before the walk
    pub prefetch_existing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl ImporterConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Config::builder()
            .set_default("api.url", defaults.api.url)?
            .set_default("api.timeout_seconds", defaults.api.timeout_seconds)?
            .set_default("import.level_format", "outline")?
            .set_default("import.synthesize_root", defaults.import.synthesize_root)?
            .set_default("import.prefetch_existing", defaults.import.prefetch_existing)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Local overrides (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // ION__API__ACCESS_TOKEN, ION__IMPORT__LEVEL_FORMAT, ...
            .add_source(Environment::with_prefix("ION").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                url: "http://localhost:5000/".to_string(),
                access_token: None,
                timeout_seconds: 30,
            },
            import: ImportConfig {
                level_format: LevelFormat::Outline,
                synthesize_root: true,
                prefetch_existing: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
                file_path: None,
            },
        }
    }
}
