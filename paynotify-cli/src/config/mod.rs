//! Configuration module for paynotify.
//!
//! Handles loading configuration from the TOML file, CLI arguments,
//! and environment variables, and turns it into validated key material.

pub mod file;

use crate::config::file::{FileConfig, KeysConfig};
use paynotify_sdk::{NotificationError, Scheme, VerificationKeys};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `keys.secret`.
pub const SECRET_ENV: &str = "PAYNOTIFY_SECRET";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid key material: {0}")]
    KeyError(#[from] NotificationError),
}

/// Loaded configuration ready for verification.
#[derive(Debug)]
pub struct LoadedConfig {
    pub scheme: Scheme,
    pub check_structure: bool,
    pub keys: VerificationKeys,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    scheme_override: Option<Scheme>,
    secret_override: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, scheme_override: Option<Scheme>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            scheme_override,
            secret_override: None,
        }
    }

    /// Use `secret` instead of `keys.secret` from the file.
    pub fn with_secret_override(mut self, secret: Option<String>) -> Self {
        self.secret_override = secret;
        self
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Parse the key material
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, config_content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(scheme) = self.scheme_override {
            file_config.verification.scheme = scheme;
        }
        if let Some(secret) = &self.secret_override {
            file_config.keys.secret = Some(secret.clone());
        }

        self.validate(&file_config)?;
        self.build_loaded_config(file_config)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let keys = &config.keys;
        if keys.public_key.is_some() && keys.public_key_file.is_some() {
            return Err(ConfigError::ValidationError(
                "keys.public_key and keys.public_key_file are mutually exclusive".to_owned(),
            ));
        }

        let has_material = match config.verification.scheme {
            Scheme::Hmac => keys.secret.is_some(),
            Scheme::Rsa => keys.public_key.is_some() || keys.public_key_file.is_some(),
        };
        if !has_material {
            return Err(ConfigError::ValidationError(format!(
                "scheme {} is selected but no key material is configured for it",
                config.verification.scheme
            )));
        }
        Ok(())
    }

    fn read_public_key(&self, keys: &KeysConfig) -> Result<Option<String>, ConfigError> {
        if let Some(pem) = &keys.public_key {
            return Ok(Some(pem.clone()));
        }
        let Some(path) = &keys.public_key_file else {
            return Ok(None);
        };
        let path = match self.config_path.parent() {
            Some(dir) => dir.join(path),
            None => path.clone(),
        };
        tracing::debug!("Reading public key from {:?}", path);
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let public_key_pem = self.read_public_key(&file_config.keys)?;
        let keys = VerificationKeys::from_raw(
            file_config.keys.secret.as_deref(),
            public_key_pem.as_deref(),
        )?;

        Ok(LoadedConfig {
            scheme: file_config.verification.scheme,
            check_structure: file_config.verification.check_structure,
            keys,
        })
    }
}

/// Get the shared secret override from the environment.
pub fn get_secret_override() -> Option<String> {
    std::env::var(SECRET_ENV).ok().filter(|secret| !secret.is_empty())
}
