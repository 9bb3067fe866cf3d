use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

/// Read when no config file is named; optional.
pub const DEFAULT_CONFIG_PATH: &str = "config/datalake.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub input: LocationConfig,
    pub output: LocationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationConfig {
    pub url: String,
}

/// Object-store credentials. Missing keys fall back to the standard AWS
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_s3_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: default_s3_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            allow_http: false,
        }
    }
}

fn default_s3_region() -> String {
    "us-west-2".to_string()
}

/// Values passed on the command line; they win over file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub input_url: Option<String>,
    pub output_url: Option<String>,
}

impl Settings {
    pub fn load(path: Option<&str>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => {
                builder.add_source(config::File::with_name(DEFAULT_CONFIG_PATH).required(false))
            }
        };

        builder = builder.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

        if let Some(url) = &overrides.input_url {
            builder = builder.set_override("input.url", url.as_str())?;
        }
        if let Some(url) = &overrides.output_url {
            builder = builder.set_override("output.url", url.as_str())?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;

        debug!(
            input = %settings.input.url,
            output = %settings.output.url,
            region = %settings.storage.region,
            "Loaded pipeline settings"
        );

        Ok(settings)
    }

    pub fn from_urls(input_url: &str, output_url: &str) -> Self {
        Self {
            input: LocationConfig {
                url: input_url.to_string(),
            },
            output: LocationConfig {
                url: output_url.to_string(),
            },
            storage: StorageConfig::default(),
        }
    }
}
