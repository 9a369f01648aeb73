//! Ed25519 (EdDSA) JWT signing

use super::Algorithm;
use super::utils::{KeyEncoding, key_encoding};
use crate::error::SignerError;
use crate::traits::Signer;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{
    PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, Signature, Signer as _, SigningKey, Verifier as _,
    VerifyingKey,
};

const ALG: &str = "EdDSA";

pub(crate) struct EdDsaSigner {
    signing: SigningKey,
    verifying: VerifyingKey,
}

fn invalid(what: &str, e: impl std::fmt::Display) -> SignerError {
    SignerError::invalid_key(ALG, format!("invalid Ed25519 {what} key: {e}"))
}

/// PKCS#8 (PEM or DER), or a raw 32-byte seed
fn parse_signing_key(key: &[u8]) -> Result<SigningKey, SignerError> {
    match key_encoding(key, ALG)? {
        KeyEncoding::Pem(pem) => SigningKey::from_pkcs8_pem(pem).map_err(|e| invalid("private", e)),
        KeyEncoding::Der(raw) if raw.len() == SECRET_KEY_LENGTH => {
            let seed: &[u8; SECRET_KEY_LENGTH] = raw
                .try_into()
                .map_err(|e| invalid("private", e))?;
            Ok(SigningKey::from_bytes(seed))
        }
        KeyEncoding::Der(der) => SigningKey::from_pkcs8_der(der).map_err(|e| invalid("private", e)),
    }
}

/// SPKI (PEM or DER), or a raw 32-byte point
fn parse_verifying_key(key: &[u8]) -> Result<VerifyingKey, SignerError> {
    match key_encoding(key, ALG)? {
        KeyEncoding::Pem(pem) => {
            VerifyingKey::from_public_key_pem(pem).map_err(|e| invalid("public", e))
        }
        KeyEncoding::Der(raw) if raw.len() == PUBLIC_KEY_LENGTH => {
            let point: &[u8; PUBLIC_KEY_LENGTH] =
                raw.try_into().map_err(|e| invalid("public", e))?;
            VerifyingKey::from_bytes(point).map_err(|e| invalid("public", e))
        }
        KeyEncoding::Der(der) => {
            VerifyingKey::from_public_key_der(der).map_err(|e| invalid("public", e))
        }
    }
}

impl EdDsaSigner {
    pub(crate) fn new(signing: &[u8], verification: &[u8]) -> Result<Self, SignerError> {
        Ok(Self {
            signing: parse_signing_key(signing)?,
            verifying: parse_verifying_key(verification)?,
        })
    }
}

impl Signer for EdDsaSigner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDSA
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let signature: Signature = self.signing.sign(message);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, SignerError> {
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(self.verifying.verify(message, &signature).is_ok())
    }
}
