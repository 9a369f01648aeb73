//! RSA-based JWT Algorithm Implementations
//!
//! RSASSA-PKCS1-v1_5 with SHA-256/384/512 (RS256, RS384, RS512).

use super::Algorithm;
use super::utils::{KeyEncoding, key_encoding};
use crate::error::SignerError;
use crate::traits::Signer;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::sha2::{Sha256, Sha384, Sha512};
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use rsa::traits::PublicKeyParts;
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey},
};

/// Keys shorter than this are refused
const MIN_MODULUS_BITS: usize = 2048;

enum DigestKeys {
    Sha256(SigningKey<Sha256>, VerifyingKey<Sha256>),
    Sha384(SigningKey<Sha384>, VerifyingKey<Sha384>),
    Sha512(SigningKey<Sha512>, VerifyingKey<Sha512>),
}

pub(crate) struct RsaSigner {
    algorithm: Algorithm,
    keys: DigestKeys,
}

/// Parse an RSA private key as PKCS#8, then PKCS#1, in PEM or DER
fn parse_private_key(key: &[u8], alg: &'static str) -> Result<RsaPrivateKey, SignerError> {
    let parsed = match key_encoding(key, alg)? {
        KeyEncoding::Pem(pem) => RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())),
        KeyEncoding::Der(der) => RsaPrivateKey::from_pkcs8_der(der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(der).map_err(|e| e.to_string())),
    };
    parsed.map_err(|e| SignerError::invalid_key(alg, format!("invalid RSA private key: {e}")))
}

/// Parse an RSA public key as SPKI, then PKCS#1, in PEM or DER
fn parse_public_key(key: &[u8], alg: &'static str) -> Result<RsaPublicKey, SignerError> {
    let parsed = match key_encoding(key, alg)? {
        KeyEncoding::Pem(pem) => RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())),
        KeyEncoding::Der(der) => RsaPublicKey::from_public_key_der(der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(der).map_err(|e| e.to_string())),
    };
    parsed.map_err(|e| SignerError::invalid_key(alg, format!("invalid RSA public key: {e}")))
}

impl RsaSigner {
    pub(crate) fn new(
        algorithm: Algorithm,
        signing: &[u8],
        verification: &[u8],
    ) -> Result<Self, SignerError> {
        let alg = algorithm.as_str();
        let private_key = parse_private_key(signing, alg)?;
        let public_key = parse_public_key(verification, alg)?;

        let bits = public_key.size() * 8;
        if bits < MIN_MODULUS_BITS {
            return Err(SignerError::invalid_key(
                alg,
                format!("RSA key must be at least {MIN_MODULUS_BITS} bits, got {bits}"),
            ));
        }

        let keys = match algorithm {
            Algorithm::RS256 => {
                DigestKeys::Sha256(SigningKey::new(private_key), VerifyingKey::new(public_key))
            }
            Algorithm::RS384 => {
                DigestKeys::Sha384(SigningKey::new(private_key), VerifyingKey::new(public_key))
            }
            Algorithm::RS512 => {
                DigestKeys::Sha512(SigningKey::new(private_key), VerifyingKey::new(public_key))
            }
            other => {
                return Err(SignerError::invalid_key(
                    other.as_str(),
                    "not an RSA algorithm",
                ));
            }
        };

        Ok(Self { algorithm, keys })
    }
}

impl Signer for RsaSigner {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let alg = self.algorithm.as_str();
        let signature = match &self.keys {
            DigestKeys::Sha256(signing, _) => signing.try_sign(message),
            DigestKeys::Sha384(signing, _) => signing.try_sign(message),
            DigestKeys::Sha512(signing, _) => signing.try_sign(message),
        }
        .map_err(|e| SignerError::Signing {
            algorithm: alg,
            reason: e.to_string(),
        })?;
        Ok(signature.to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, SignerError> {
        let Ok(signature) = Signature::try_from(signature) else {
            return Ok(false);
        };

        let valid = match &self.keys {
            DigestKeys::Sha256(_, verifying) => verifying.verify(message, &signature).is_ok(),
            DigestKeys::Sha384(_, verifying) => verifying.verify(message, &signature).is_ok(),
            DigestKeys::Sha512(_, verifying) => verifying.verify(message, &signature).is_ok(),
        };
        Ok(valid)
    }
}
