//! HMAC-based JWT Algorithm Implementations
//!
//! HMAC-SHA algorithms (HS256, HS384, HS512) for JWT signing and verification.

use super::Algorithm;
use crate::error::SignerError;
use crate::keys::SecretBytes;
use crate::traits::Signer;
use hmac::{Hmac, Mac, digest::KeyInit};
use sha2::{Sha256, Sha384, Sha512};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Validate HMAC secret key length for security
pub(crate) fn validate_hmac_key(secret: &[u8], algorithm: Algorithm) -> Result<(), SignerError> {
    let min_length = match algorithm {
        Algorithm::HS256 => 32, // 256 bits minimum
        Algorithm::HS384 => 48, // 384 bits minimum
        Algorithm::HS512 => 64, // 512 bits minimum
        other => {
            return Err(SignerError::invalid_key(
                other.as_str(),
                "not an HMAC algorithm",
            ));
        }
    };

    if secret.len() < min_length {
        return Err(SignerError::invalid_key(
            algorithm.as_str(),
            format!(
                "HMAC key must be at least {} bytes, got {}",
                min_length,
                secret.len()
            ),
        ));
    }

    Ok(())
}

/// HMAC signer over a shared secret
pub(crate) struct HmacSigner {
    algorithm: Algorithm,
    secret: SecretBytes,
}

impl HmacSigner {
    pub(crate) fn new(algorithm: Algorithm, secret: &SecretBytes) -> Result<Self, SignerError> {
        validate_hmac_key(secret.expose(), algorithm)?;
        Ok(Self {
            algorithm,
            secret: secret.clone(),
        })
    }
}

/// Keyed MAC over the signing input
fn keyed<M: Mac + KeyInit>(
    secret: &[u8],
    message: &[u8],
    algorithm: Algorithm,
) -> Result<M, SignerError> {
    let mut mac = <M as Mac>::new_from_slice(secret)
        .map_err(|_| SignerError::invalid_key(algorithm.as_str(), "invalid HMAC key"))?;
    mac.update(message);
    Ok(mac)
}

impl Signer for HmacSigner {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let secret = self.secret.expose();
        let tag = match self.algorithm {
            Algorithm::HS256 => keyed::<HmacSha256>(secret, message, self.algorithm)?
                .finalize()
                .into_bytes()
                .to_vec(),
            Algorithm::HS384 => keyed::<HmacSha384>(secret, message, self.algorithm)?
                .finalize()
                .into_bytes()
                .to_vec(),
            _ => keyed::<HmacSha512>(secret, message, self.algorithm)?
                .finalize()
                .into_bytes()
                .to_vec(),
        };
        Ok(tag)
    }

    // `verify_slice` compares in constant time
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, SignerError> {
        let secret = self.secret.expose();
        let valid = match self.algorithm {
            Algorithm::HS256 => keyed::<HmacSha256>(secret, message, self.algorithm)?
                .verify_slice(signature)
                .is_ok(),
            Algorithm::HS384 => keyed::<HmacSha384>(secret, message, self.algorithm)?
                .verify_slice(signature)
                .is_ok(),
            _ => keyed::<HmacSha512>(secret, message, self.algorithm)?
                .verify_slice(signature)
                .is_ok(),
        };
        Ok(valid)
    }
}
