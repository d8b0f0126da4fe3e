//! Server configuration.
//!
//! Loaded from an optional TOML file, then overridden by command-line flags
//! and environment variables.
//!
//! ```toml
//! listen = "127.0.0.1:8080"
//!
//! [nonce]
//! secret = "change-me"
//! lifetime_secs = 86400
//!
//! [translations]
//! "Trying to cheat?!" = "Tricher ?!"
//! ```

use anspress_ajax_core::{Catalog, HmacNonces, NonceError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind.
    pub listen: String,
    pub nonce: NonceConfig,
    /// Source message to translated message.
    pub translations: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NonceConfig {
    pub secret: String,
    pub lifetime_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            nonce: NonceConfig::default(),
            translations: HashMap::new(),
        }
    }
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            lifetime_secs: HmacNonces::DEFAULT_LIFETIME.as_secs(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn nonces(&self) -> Result<HmacNonces, ConfigError> {
        let nonces = HmacNonces::new(&self.nonce.secret)?
            .with_lifetime(Duration::from_secs(self.nonce.lifetime_secs))?;
        Ok(nonces)
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::from(self.translations.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid nonce settings: {0}")]
    Nonce(#[from] NonceError),
}
