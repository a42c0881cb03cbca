//! TOML file configuration structures.
//!
//! These structs directly map to the `paynotify.toml` file format.

use paynotify_sdk::Scheme;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub keys: KeysConfig,
}

/// Verification policy section.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Checksum scheme the merchant account is set up with.
    #[serde(default = "default_scheme")]
    pub scheme: Scheme,
    /// Reject payloads missing required fields.
    #[serde(default = "default_check_structure")]
    pub check_structure: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            check_structure: default_check_structure(),
        }
    }
}

fn default_scheme() -> Scheme {
    Scheme::Hmac
}

fn default_check_structure() -> bool {
    true
}

/// Key material section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysConfig {
    /// Shared secret for the HMAC scheme.
    pub secret: Option<String>,
    /// Inline PEM public key for the RSA scheme.
    pub public_key: Option<String>,
    /// Path to a PEM public key, relative to the config file.
    pub public_key_file: Option<PathBuf>,
}
