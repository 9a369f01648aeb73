//! JWT key material
//!
//! Key strings are tagged with an encoding prefix: `base64:` for standard
//! base64, `file:` for a path whose contents are the key, or no prefix for raw
//! key bytes. They are decoded once, when a generator is resolved.

use crate::error::ConfigurationError;
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
};
use std::fmt;
use std::path::PathBuf;
use zeroize::{Zeroize, ZeroizeOnDrop};

const BASE64_PREFIX: &str = "base64:";
const FILE_PREFIX: &str = "file:";

/// Secret key bytes, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    /// Wrap raw key bytes
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the key bytes
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Number of key bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

/// Where a key's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Standard base64 text
    Base64(String),
    /// Path to a file holding the key
    File(PathBuf),
    /// The string itself is the key
    Raw(String),
}

impl KeySource {
    /// Classify a configured key string by its prefix
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if let Some(encoded) = value.strip_prefix(BASE64_PREFIX) {
            KeySource::Base64(encoded.to_string())
        } else if let Some(path) = value.strip_prefix(FILE_PREFIX) {
            KeySource::File(PathBuf::from(path))
        } else {
            KeySource::Raw(value.to_string())
        }
    }

    /// Decode or read the key bytes.
    ///
    /// # Errors
    /// Returns `InvalidKey` for bad base64 or an empty key, and `KeyFile` when
    /// a referenced file cannot be read.
    pub async fn load(&self, generator: &str) -> Result<SecretBytes, ConfigurationError> {
        let bytes = match self {
            KeySource::Base64(encoded) => STANDARD
                .decode(encoded.trim())
                .or_else(|_| STANDARD_NO_PAD.decode(encoded.trim()))
                .map_err(|e| ConfigurationError::InvalidKey {
                    generator: generator.to_string(),
                    reason: format!("base64 key cannot be decoded: {e}"),
                })?,
            KeySource::File(path) => {
                tracing::debug!(generator, path = %path.display(), "reading JWT key file");
                tokio::fs::read(path)
                    .await
                    .map_err(|source| ConfigurationError::KeyFile {
                        generator: generator.to_string(),
                        path: path.clone(),
                        source,
                    })?
            }
            KeySource::Raw(raw) => raw.as_bytes().to_vec(),
        };

        if bytes.is_empty() {
            return Err(ConfigurationError::InvalidKey {
                generator: generator.to_string(),
                reason: "key cannot be empty".to_string(),
            });
        }

        Ok(SecretBytes(bytes))
    }
}

/// Decoded key material owned by one generator
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    /// One shared secret for signing and verification
    Symmetric(SecretBytes),
    /// Private signing key and public verification key
    Asymmetric {
        /// Private key (PEM or DER)
        signing: SecretBytes,
        /// Public key (PEM or DER)
        verification: Vec<u8>,
    },
}

impl KeyMaterial {
    /// Shared-secret material
    #[must_use]
    pub fn symmetric(secret: impl Into<Vec<u8>>) -> Self {
        KeyMaterial::Symmetric(SecretBytes::new(secret))
    }

    /// Signing/verification pair
    #[must_use]
    pub fn asymmetric(signing: impl Into<Vec<u8>>, verification: impl Into<Vec<u8>>) -> Self {
        KeyMaterial::Asymmetric {
            signing: SecretBytes::new(signing),
            verification: verification.into(),
        }
    }

    /// Whether this is a single shared secret
    #[inline]
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        matches!(self, KeyMaterial::Symmetric(_))
    }

    /// Load a single shared secret from a tagged key string.
    ///
    /// # Errors
    /// See [`KeySource::load`].
    pub async fn load_symmetric(key: &str, generator: &str) -> Result<Self, ConfigurationError> {
        Ok(KeyMaterial::Symmetric(
            KeySource::parse(key).load(generator).await?,
        ))
    }

    /// Load a signing/verification pair from tagged key strings.
    ///
    /// # Errors
    /// See [`KeySource::load`].
    pub async fn load_pair(
        signing: &str,
        verification: &str,
        generator: &str,
    ) -> Result<Self, ConfigurationError> {
        let signing = KeySource::parse(signing).load(generator).await?;
        let verification = KeySource::parse(verification).load(generator).await?;
        Ok(KeyMaterial::Asymmetric {
            signing,
            verification: verification.expose().to_vec(),
        })
    }
}
