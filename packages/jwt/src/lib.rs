//! Named JSON Web Token generators
//!
//! This crate provides:
//! - Multiple independently configured generators, one per name
//! - HMAC, keyed BLAKE2b, ECDSA, RSA and Ed25519 signing
//! - Pluggable claim contributors composed in configuration order
//! - Validation of expiry, not-before, issuer and audience on parse
//! - Issuance events for synchronous listeners and async subscribers
//!
//! ```no_run
//! use cryypt_jwt_manager::{GeneratorExt, JwtConfig, JwtManager};
//!
//! # async fn run() -> cryypt_jwt_manager::JwtResult<()> {
//! let config = JwtConfig::from_json(r#"{
//!     "app": { "name": "acme" },
//!     "generators": {
//!         "users": {
//!             "algo": "HS256",
//!             "key": "base64:c2VjcmV0LXNlY3JldC1zZWNyZXQtc2VjcmV0LXNlY3JldA==",
//!             "claims": ["app_name_as_issuer", ["not_within", "1 minute"]]
//!         }
//!     }
//! }"#)?;
//!
//! let manager = JwtManager::new(config);
//! let users = manager.get("users").await?;
//! let token = users.generate_for(42)?;
//! let parsed = users.parse(token.as_str(), false)?;
//! assert_eq!(parsed.subject(), Some("42"));
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod claims;
pub mod clock;
pub mod config;
mod error;
pub mod events;
pub mod generator;
pub mod interval;
pub mod keys;
pub mod manager;
pub mod token;
mod traits;
pub mod validation;

pub use algorithms::{Algorithm, UnknownAlgorithm};
pub use claims::{
    Claim, ClaimContext, ClaimName, ClaimParams, ClaimRegistry, ClaimSpec, ClaimValue,
    GeneratorNameAware, IssuedAtAware,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ExpiryConfig, GeneratorConfig, JwtConfig, KeyConfig, RawGeneratorConfig};
pub use error::*;
pub use events::{EventDispatcher, ListenerError, TokenEvent, TokenListener};
pub use generator::{DefaultGenerator, Generator, GeneratorContext, GeneratorExt, Subject};
pub use keys::{KeyMaterial, KeySource, SecretBytes};
pub use manager::{GeneratorDriver, JwtManager, JwtManagerBuilder};
pub use token::{JwtHeader, Token, TokenClaims};
pub use traits::Signer;
