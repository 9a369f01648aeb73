//! ECDSA-based JWT Algorithm Implementations
//!
//! ES256 (P-256), ES384 (P-384) and ES512 (P-521). Signatures are the
//! fixed-width `r || s` encoding JWS requires, not DER.

use super::Algorithm;
use super::utils::{KeyEncoding, key_encoding};
use crate::error::SignerError;
use crate::traits::Signer;
use p256::ecdsa::signature::{Signer as _, Verifier as _};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey};
use p521::elliptic_curve::sec1::ToEncodedPoint;

/// Decoded curve keys
enum CurveKeys {
    P256 {
        signing: p256::ecdsa::SigningKey,
        verifying: p256::ecdsa::VerifyingKey,
    },
    P384 {
        signing: p384::ecdsa::SigningKey,
        verifying: p384::ecdsa::VerifyingKey,
    },
    P521 {
        signing: p521::ecdsa::SigningKey,
        verifying: p521::ecdsa::VerifyingKey,
    },
}

pub(crate) struct EcdsaSigner {
    algorithm: Algorithm,
    keys: CurveKeys,
}

fn invalid(algorithm: Algorithm, what: &str, e: impl std::fmt::Display) -> SignerError {
    SignerError::invalid_key(algorithm.as_str(), format!("invalid EC {what} key: {e}"))
}

/// Parse a PKCS#8 private key (PEM or DER) for any curve with pkcs8 support
fn private_key<K: DecodePrivateKey>(key: &[u8], algorithm: Algorithm) -> Result<K, SignerError> {
    match key_encoding(key, algorithm.as_str())? {
        KeyEncoding::Pem(pem) => K::from_pkcs8_pem(pem).map_err(|e| invalid(algorithm, "private", e)),
        KeyEncoding::Der(der) => K::from_pkcs8_der(der).map_err(|e| invalid(algorithm, "private", e)),
    }
}

/// Parse an SPKI public key (PEM or DER)
fn public_key<K: DecodePublicKey>(key: &[u8], algorithm: Algorithm) -> Result<K, SignerError> {
    match key_encoding(key, algorithm.as_str())? {
        KeyEncoding::Pem(pem) => {
            K::from_public_key_pem(pem).map_err(|e| invalid(algorithm, "public", e))
        }
        KeyEncoding::Der(der) => {
            K::from_public_key_der(der).map_err(|e| invalid(algorithm, "public", e))
        }
    }
}

impl EcdsaSigner {
    pub(crate) fn new(
        algorithm: Algorithm,
        signing: &[u8],
        verification: &[u8],
    ) -> Result<Self, SignerError> {
        let keys = match algorithm {
            Algorithm::ES256 => CurveKeys::P256 {
                signing: private_key(signing, algorithm)?,
                verifying: public_key(verification, algorithm)?,
            },
            Algorithm::ES384 => CurveKeys::P384 {
                signing: private_key(signing, algorithm)?,
                verifying: public_key(verification, algorithm)?,
            },
            Algorithm::ES512 => {
                // p521's ECDSA key wrappers decode through the generic curve types
                let secret: p521::SecretKey = private_key(signing, algorithm)?;
                let public: p521::PublicKey = public_key(verification, algorithm)?;
                let signing = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
                    .map_err(|e| invalid(algorithm, "private", e))?;
                let point = public.to_encoded_point(false);
                let verifying = p521::ecdsa::VerifyingKey::from_sec1_bytes(point.as_bytes())
                    .map_err(|e| invalid(algorithm, "public", e))?;
                CurveKeys::P521 { signing, verifying }
            }
            other => {
                return Err(SignerError::invalid_key(
                    other.as_str(),
                    "not an ECDSA algorithm",
                ));
            }
        };

        Ok(Self { algorithm, keys })
    }
}

impl Signer for EcdsaSigner {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let signature = match &self.keys {
            CurveKeys::P256 { signing, .. } => {
                let signature: p256::ecdsa::Signature = signing.sign(message);
                signature.to_bytes().to_vec()
            }
            CurveKeys::P384 { signing, .. } => {
                let signature: p384::ecdsa::Signature = signing.sign(message);
                signature.to_bytes().to_vec()
            }
            CurveKeys::P521 { signing, .. } => {
                let signature: p521::ecdsa::Signature = signing.sign(message);
                signature.to_bytes().to_vec()
            }
        };
        Ok(signature)
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, SignerError> {
        // A signature of the wrong width is simply not a match
        let valid = match &self.keys {
            CurveKeys::P256 { verifying, .. } => p256::ecdsa::Signature::from_slice(signature)
                .is_ok_and(|s| verifying.verify(message, &s).is_ok()),
            CurveKeys::P384 { verifying, .. } => p384::ecdsa::Signature::from_slice(signature)
                .is_ok_and(|s| verifying.verify(message, &s).is_ok()),
            CurveKeys::P521 { verifying, .. } => p521::ecdsa::Signature::from_slice(signature)
                .is_ok_and(|s| verifying.verify(message, &s).is_ok()),
        };
        Ok(valid)
    }
}
