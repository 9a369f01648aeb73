//! Generator configuration
//!
//! `JwtConfig` is the raw, deserialized form: strings as the operator wrote
//! them. [`GeneratorConfig`] is the resolved form a generator is built from.

use crate::algorithms::Algorithm;
use crate::claims::ClaimSpec;
use crate::error::ConfigurationError;
use crate::keys::KeyMaterial;
use chrono::Duration;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Expiry applied when a generator does not configure one
pub const DEFAULT_EXPIRY_SECONDS: i64 = 3600;

/// Process-wide application identity and secret
#[derive(Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Application name, used by the `app_name_*` contributors
    #[serde(default)]
    pub name: Option<String>,
    /// Application URL, used by `app_url_as_issuer`
    #[serde(default)]
    pub url: Option<String>,
    /// Application secret, the key of generators with no algorithm configured
    #[serde(default)]
    pub key: Option<String>,
}

impl AppConfig {
    /// Set the application name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the application URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the application secret
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Key as written in configuration
///
/// Shapes are checked against the algorithm during resolution, so anything
/// that is not a string or a pair is kept as `Other` rather than failing to
/// deserialize.
#[derive(Clone, Deserialize)]
#[serde(untagged)]
pub enum KeyConfig {
    /// One key string, for symmetric algorithms
    Single(String),
    /// A signing/verification pair, for asymmetric algorithms
    Pair {
        /// Private key source
        #[serde(default)]
        signing: Option<String>,
        /// Public key source
        #[serde(default)]
        verification: Option<String>,
    },
    /// Any other JSON shape
    Other(Value),
}

impl KeyConfig {
    /// A signing/verification pair
    #[must_use]
    pub fn pair(signing: impl Into<String>, verification: impl Into<String>) -> Self {
        KeyConfig::Pair {
            signing: Some(signing.into()),
            verification: Some(verification.into()),
        }
    }
}

impl From<&str> for KeyConfig {
    fn from(key: &str) -> Self {
        KeyConfig::Single(key.to_string())
    }
}

impl From<String> for KeyConfig {
    fn from(key: String) -> Self {
        KeyConfig::Single(key)
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyConfig::Single(_) => f.write_str("Single(<redacted>)"),
            KeyConfig::Pair { .. } => f.write_str("Pair { <redacted> }"),
            KeyConfig::Other(_) => f.write_str("Other(<redacted>)"),
        }
    }
}

/// Expiry as written in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExpiryConfig {
    /// Whole seconds
    Seconds(i64),
    /// A duration expression such as `"PT1H"` or `"1 hour"`
    Expression(String),
    /// Any other JSON shape
    Other(Value),
}

impl ExpiryConfig {
    /// Resolve to a positive duration; `None` for anything else
    #[must_use]
    pub fn to_duration(&self) -> Option<Duration> {
        let duration = match self {
            ExpiryConfig::Seconds(seconds) => Duration::try_seconds(*seconds)?,
            ExpiryConfig::Expression(expression) => crate::interval::parse(expression).ok()?,
            ExpiryConfig::Other(_) => return None,
        };
        (duration > Duration::zero()).then_some(duration)
    }
}

impl fmt::Display for ExpiryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryConfig::Seconds(seconds) => write!(f, "{seconds}"),
            ExpiryConfig::Expression(expression) => f.write_str(expression),
            ExpiryConfig::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for ExpiryConfig {
    fn from(seconds: i64) -> Self {
        ExpiryConfig::Seconds(seconds)
    }
}

impl From<&str> for ExpiryConfig {
    fn from(expression: &str) -> Self {
        ExpiryConfig::Expression(expression.to_string())
    }
}

/// One generator entry as written in configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGeneratorConfig {
    /// Algorithm identifier; HS256 with the application key when absent
    #[serde(default, alias = "algo")]
    pub algorithm: Option<String>,
    /// Key source(s)
    #[serde(default)]
    pub key: Option<KeyConfig>,
    /// Token lifetime; one hour when absent
    #[serde(default)]
    pub expiry: Option<ExpiryConfig>,
    /// Construction strategy; `None` or `"default"` for the built-in generator
    #[serde(default)]
    pub driver: Option<String>,
    /// Ordered claim contributors
    #[serde(default)]
    pub claims: Vec<ClaimSpec>,
}

impl RawGeneratorConfig {
    /// Empty entry, resolved entirely from defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the algorithm identifier
    #[must_use]
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Set the key
    #[must_use]
    pub fn key(mut self, key: impl Into<KeyConfig>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the expiry
    #[must_use]
    pub fn expiry(mut self, expiry: impl Into<ExpiryConfig>) -> Self {
        self.expiry = Some(expiry.into());
        self
    }

    /// Set the driver name
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    /// Append a claim contributor
    #[must_use]
    pub fn claim(mut self, spec: impl Into<ClaimSpec>) -> Self {
        self.claims.push(spec.into());
        self
    }
}

/// Application identity plus every named generator
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtConfig {
    /// Application identity and secret
    #[serde(default)]
    pub app: AppConfig,
    /// Generators by name
    #[serde(default)]
    pub generators: HashMap<String, RawGeneratorConfig>,
}

impl JwtConfig {
    /// Configuration with only an application identity
    #[must_use]
    pub fn new(app: AppConfig) -> Self {
        Self {
            app,
            generators: HashMap::new(),
        }
    }

    /// Parse JSON configuration text.
    ///
    /// # Errors
    /// `ConfigurationError::Parse` when the text is not valid configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Add or replace a generator entry
    #[must_use]
    pub fn with_generator(mut self, name: impl Into<String>, raw: RawGeneratorConfig) -> Self {
        self.generators.insert(name.into(), raw);
        self
    }

    /// Raw entry for `name`
    #[must_use]
    pub fn generator(&self, name: &str) -> Option<&RawGeneratorConfig> {
        self.generators.get(name)
    }
}

/// A fully resolved generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Generator name
    pub name: String,
    /// Signing algorithm
    pub algorithm: Algorithm,
    /// Decoded key material
    pub keys: KeyMaterial,
    /// Token lifetime; no `exp` claim when `None`
    pub expiry: Option<Duration>,
    /// Ordered claim contributors
    pub claims: Vec<ClaimSpec>,
}
