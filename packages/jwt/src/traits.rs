//! Core signing trait.

use crate::algorithms::Algorithm;
use crate::error::SignerError;

/// Signing algorithm interface.
///
/// A signer owns already-decoded key material for exactly one algorithm.
/// Implementations must be thread-safe (Send + Sync) since one signer is
/// shared by every call on its generator.
pub trait Signer: Send + Sync + 'static {
    /// Algorithm this signer produces, written to the header `alg`.
    fn algorithm(&self) -> Algorithm;

    /// Sign the `header.payload` signing input.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;

    /// Check a signature over the signing input.
    ///
    /// Returns `Ok(false)` for a well-formed but wrong signature.
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, SignerError>;
}

/// Implementation of Signer for Arc<T> to allow shared ownership.
impl<T: Signer> Signer for std::sync::Arc<T> {
    fn algorithm(&self) -> Algorithm {
        (**self).algorithm()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        (**self).sign(message)
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, SignerError> {
        (**self).verify(message, signature)
    }
}
