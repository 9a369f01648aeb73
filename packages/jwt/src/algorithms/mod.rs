//! JWT Algorithms Module
//!
//! The closed set of signing algorithms a generator may be configured with,
//! and the lookup from an algorithm to its signer backend.

mod blake2b;
mod ecdsa;
mod eddsa;
mod hmac;
mod rsa;
pub(crate) mod utils;

use crate::error::SignerError;
use crate::keys::KeyMaterial;
use crate::traits::Signer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supported JWT signing algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// HMAC with SHA-256
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
    /// Keyed BLAKE2b-256
    BLAKE2B,
    /// ECDSA over P-256 with SHA-256
    ES256,
    /// ECDSA over P-384 with SHA-384
    ES384,
    /// ECDSA over P-521 with SHA-512
    ES512,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    RS512,
    /// Ed25519
    EdDSA,
}

impl Algorithm {
    /// Every supported algorithm
    pub const ALL: [Algorithm; 11] = [
        Algorithm::HS256,
        Algorithm::HS384,
        Algorithm::HS512,
        Algorithm::BLAKE2B,
        Algorithm::ES256,
        Algorithm::ES384,
        Algorithm::ES512,
        Algorithm::RS256,
        Algorithm::RS384,
        Algorithm::RS512,
        Algorithm::EdDSA,
    ];

    /// Header `alg` identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::BLAKE2B => "BLAKE2B",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            Algorithm::ES512 => "ES512",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
            Algorithm::EdDSA => "EdDSA",
        }
    }

    /// True only for the shared-secret algorithms (HS*, BLAKE2B)
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(
            self,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 | Algorithm::BLAKE2B
        )
    }

    /// Build the signer for this algorithm, decoding the key material once.
    ///
    /// # Errors
    /// Returns `SignerError::InvalidKey` when the material has the wrong shape
    /// for the algorithm, cannot be decoded, or is too weak.
    pub fn signer(self, keys: &KeyMaterial) -> Result<Arc<dyn Signer>, SignerError> {
        match (self, keys) {
            (
                Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512,
                KeyMaterial::Symmetric(secret),
            ) => Ok(Arc::new(hmac::HmacSigner::new(self, secret)?)),
            (Algorithm::BLAKE2B, KeyMaterial::Symmetric(secret)) => {
                Ok(Arc::new(blake2b::Blake2bSigner::new(secret)?))
            }
            (
                Algorithm::ES256 | Algorithm::ES384 | Algorithm::ES512,
                KeyMaterial::Asymmetric {
                    signing,
                    verification,
                },
            ) => Ok(Arc::new(ecdsa::EcdsaSigner::new(
                self,
                signing.expose(),
                verification,
            )?)),
            (
                Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512,
                KeyMaterial::Asymmetric {
                    signing,
                    verification,
                },
            ) => Ok(Arc::new(rsa::RsaSigner::new(
                self,
                signing.expose(),
                verification,
            )?)),
            (
                Algorithm::EdDSA,
                KeyMaterial::Asymmetric {
                    signing,
                    verification,
                },
            ) => Ok(Arc::new(eddsa::EdDsaSigner::new(
                signing.expose(),
                verification,
            )?)),
            (algorithm, _) if algorithm.is_symmetric() => Err(SignerError::invalid_key(
                algorithm.as_str(),
                "a single shared secret is required",
            )),
            (algorithm, _) => Err(SignerError::invalid_key(
                algorithm.as_str(),
                "a signing/verification key pair is required",
            )),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier that does not name a supported algorithm
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown JWT algorithm \"{0}\"")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == s)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}
