//! Keyed BLAKE2b-256 MAC (BLAKE2B)

use super::Algorithm;
use crate::error::SignerError;
use crate::keys::SecretBytes;
use crate::traits::Signer;
use subtle::ConstantTimeEq;

const OUTPUT_LENGTH: usize = 32;
const MIN_KEY_LENGTH: usize = 32;
const MAX_KEY_LENGTH: usize = blake2b_simd::KEYBYTES;

pub(crate) struct Blake2bSigner {
    secret: SecretBytes,
}

impl Blake2bSigner {
    pub(crate) fn new(secret: &SecretBytes) -> Result<Self, SignerError> {
        if !(MIN_KEY_LENGTH..=MAX_KEY_LENGTH).contains(&secret.len()) {
            return Err(SignerError::invalid_key(
                Algorithm::BLAKE2B.as_str(),
                format!(
                    "BLAKE2b key must be between {MIN_KEY_LENGTH} and {MAX_KEY_LENGTH} bytes, got {}",
                    secret.len()
                ),
            ));
        }

        Ok(Self {
            secret: secret.clone(),
        })
    }

    fn mac(&self, message: &[u8]) -> blake2b_simd::Hash {
        blake2b_simd::Params::new()
            .hash_length(OUTPUT_LENGTH)
            .key(self.secret.expose())
            .hash(message)
    }
}

impl Signer for Blake2bSigner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::BLAKE2B
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.mac(message).as_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, SignerError> {
        let expected = self.mac(message);
        Ok(expected.as_bytes().ct_eq(signature).into())
    }
}
