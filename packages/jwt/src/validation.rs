//! Token validation
//!
//! Checks run in a fixed order and stop at the first failure: header
//! algorithm, signature, expiry, issued-at/not-before, issuer, audience.

use crate::claims::{Claim, ClaimName, ClaimValue};
use crate::error::{ClaimError, JwtResult, TokenValidationError};
use crate::token::Token;
use crate::traits::Signer;
use chrono::{DateTime, Utc};

/// Issuer and audiences a token must carry, recovered from a generator's
/// claim contributors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedClaims {
    /// Required issuer; `None` skips the issuer check
    pub issuer: Option<String>,
    /// Acceptable audiences; empty skips the audience check
    pub audiences: Vec<String>,
}

impl ExpectedClaims {
    /// Read issuer and audience contributors in order.
    ///
    /// The last issuer contributor wins, and one that yields no value clears
    /// the requirement. Audiences accumulate; absent entries add nothing.
    ///
    /// # Errors
    /// `ClaimError` when a contributor cannot produce its value or yields a
    /// value of the wrong shape.
    pub fn collect(generator: &str, claims: &[Box<dyn Claim>]) -> Result<Self, ClaimError> {
        let mut expected = Self::default();

        for claim in claims {
            match claim.name() {
                ClaimName::Issuer => {
                    expected.issuer = match claim.value()? {
                        ClaimValue::String(s) | ClaimValue::OptionalString(Some(s)) => {
                            Some(s).filter(|s| !s.is_empty())
                        }
                        ClaimValue::OptionalString(None) => None,
                        ClaimValue::List(_) | ClaimValue::Timestamp(_) => {
                            return Err(ClaimError::InvalidClaim {
                                claim: ClaimName::Issuer.to_string(),
                            });
                        }
                    };
                }
                ClaimName::Audience => {
                    let entries = match claim.value()? {
                        ClaimValue::String(s) => vec![Some(s)],
                        ClaimValue::OptionalString(s) => vec![s],
                        ClaimValue::List(entries) => entries,
                        ClaimValue::Timestamp(_) => {
                            return Err(ClaimError::InvalidAudience {
                                generator: generator.to_string(),
                            });
                        }
                    };
                    for audience in entries.into_iter().flatten() {
                        if !audience.is_empty() && !expected.audiences.contains(&audience) {
                            expected.audiences.push(audience);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(expected)
    }

    /// Check the token's issuer and audiences against these expectations.
    ///
    /// # Errors
    /// `InvalidIssuer` or `InvalidAudience`.
    pub fn check(&self, token: &Token) -> Result<(), TokenValidationError> {
        if let Some(issuer) = &self.issuer {
            if !token.has_been_issued_by(issuer) {
                return Err(TokenValidationError::InvalidIssuer {
                    expected: issuer.clone(),
                    found: token.issuer().map(str::to_string),
                });
            }
        }

        if !self.audiences.is_empty()
            && !self
                .audiences
                .iter()
                .any(|audience| token.is_permitted_for(audience))
        {
            return Err(TokenValidationError::InvalidAudience {
                expected: self.audiences.clone(),
            });
        }

        Ok(())
    }
}

/// Check the header algorithm and the signature.
///
/// # Errors
/// `AlgorithmMismatch` or `InvalidSignature`; `SignerError` if the verifier
/// itself fails.
pub fn verify_signature(token: &Token, signer: &dyn Signer) -> JwtResult<()> {
    let expected = signer.algorithm();
    if token.header().alg != expected.as_str() {
        return Err(TokenValidationError::AlgorithmMismatch {
            expected: expected.as_str().to_string(),
            found: token.header().alg.clone(),
        }
        .into());
    }

    if !signer.verify(token.signing_input().as_bytes(), token.signature())? {
        return Err(TokenValidationError::InvalidSignature.into());
    }

    Ok(())
}

/// Check expiry, then issued-at and not-before, against `now`.
///
/// # Errors
/// `Expired` or `NotYetValid`.
pub fn check_time(token: &Token, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if token.is_expired(now) {
        return Err(TokenValidationError::Expired {
            expired_at: token.expires_at().unwrap_or(now),
        });
    }

    if !token.has_been_issued_before(now) || !token.is_minimum_time_before(now) {
        return Err(TokenValidationError::NotYetValid);
    }

    Ok(())
}
