//! Claim contract and contributors
//!
//! A contributor is a small object that names one claim and produces its
//! value. Contributors that need the generator's name or the issuance time
//! expose that through capability hooks; the generator injects the state
//! before asking for the value.

mod contributors;
mod registry;

pub use contributors::{
    AppNameAsIssuer, AppNameInAudience, AppUrlAsIssuer, AsAudience, AsIssuer, CustomClaim,
    GeneratorNameAsIssuer, GeneratorNameInAudience, InAudience, NotWithin, UniqueId,
};
pub use registry::{ClaimConstructor, ClaimContext, ClaimParams, ClaimRegistry, ClaimSpec};

use crate::error::ClaimError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

/// Claim name: one of the registered JWT claims or a custom name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimName {
    /// `sub`
    Subject,
    /// `iss`
    Issuer,
    /// `aud`
    Audience,
    /// `exp`
    ExpiresAt,
    /// `nbf`
    NotBefore,
    /// `iat`
    IssuedAt,
    /// `jti`
    Id,
    /// Any non-registered name
    Custom(String),
}

impl ClaimName {
    /// All registered claims, in wire order
    pub const REGISTERED: [ClaimName; 7] = [
        ClaimName::Subject,
        ClaimName::Issuer,
        ClaimName::Audience,
        ClaimName::ExpiresAt,
        ClaimName::NotBefore,
        ClaimName::IssuedAt,
        ClaimName::Id,
    ];

    /// Wire name of the claim
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ClaimName::Subject => "sub",
            ClaimName::Issuer => "iss",
            ClaimName::Audience => "aud",
            ClaimName::ExpiresAt => "exp",
            ClaimName::NotBefore => "nbf",
            ClaimName::IssuedAt => "iat",
            ClaimName::Id => "jti",
            ClaimName::Custom(name) => name,
        }
    }

    /// Map a wire name to a claim name, registered names first
    #[must_use]
    pub fn from_wire(name: &str) -> Self {
        Self::REGISTERED
            .into_iter()
            .find(|registered| registered.as_str() == name)
            .unwrap_or_else(|| ClaimName::Custom(name.to_string()))
    }

    /// Build a custom claim name.
    ///
    /// # Errors
    /// `ReservedClaimName` if `name` is a registered claim, `InvalidClaim`
    /// if it is empty.
    pub fn custom(name: impl Into<String>) -> Result<Self, ClaimError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClaimError::InvalidClaim { claim: name });
        }
        match Self::from_wire(&name) {
            ClaimName::Custom(_) => Ok(ClaimName::Custom(name)),
            _ => Err(ClaimError::ReservedClaimName { name }),
        }
    }

    /// Whether this is one of the seven registered claims
    #[must_use]
    pub fn is_registered(&self) -> bool {
        !matches!(self, ClaimName::Custom(_))
    }
}

impl fmt::Display for ClaimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value produced by a contributor
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    /// A plain string
    String(String),
    /// A string that may be absent
    OptionalString(Option<String>),
    /// A list whose entries may be absent
    List(Vec<Option<String>>),
    /// A point in time
    Timestamp(DateTime<Utc>),
}

impl ClaimValue {
    /// The value as a non-empty string, if it is one
    #[must_use]
    pub fn as_non_empty_str(&self) -> Option<&str> {
        match self {
            ClaimValue::String(s) | ClaimValue::OptionalString(Some(s)) if !s.is_empty() => {
                Some(s.as_str())
            }
            _ => None,
        }
    }

    /// JSON form used for custom claims; timestamps become NumericDate seconds
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            ClaimValue::String(s) => Value::String(s),
            ClaimValue::OptionalString(s) => s.map_or(Value::Null, Value::String),
            ClaimValue::List(entries) => Value::Array(
                entries
                    .into_iter()
                    .map(|entry| entry.map_or(Value::Null, Value::String))
                    .collect(),
            ),
            ClaimValue::Timestamp(t) => Value::from(t.timestamp()),
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::String(value)
    }
}

impl From<Option<String>> for ClaimValue {
    fn from(value: Option<String>) -> Self {
        ClaimValue::OptionalString(value)
    }
}

impl From<Vec<String>> for ClaimValue {
    fn from(value: Vec<String>) -> Self {
        ClaimValue::List(value.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<String>>> for ClaimValue {
    fn from(value: Vec<Option<String>>) -> Self {
        ClaimValue::List(value)
    }
}

impl From<DateTime<Utc>> for ClaimValue {
    fn from(value: DateTime<Utc>) -> Self {
        ClaimValue::Timestamp(value)
    }
}

/// A claim contributor
///
/// Implementations are instantiated fresh for every issuance and every
/// validation, so they may hold per-call state.
pub trait Claim: Send {
    /// Which claim this contributor sets
    fn name(&self) -> ClaimName;

    /// The claim value.
    ///
    /// # Errors
    /// `UninitializedClaim` when injected state the value depends on was
    /// never supplied.
    fn value(&self) -> Result<ClaimValue, ClaimError>;

    /// Capability hook for contributors that need the generator name
    fn as_generator_name_aware(&mut self) -> Option<&mut dyn GeneratorNameAware> {
        None
    }

    /// Capability hook for contributors that need the issuance time
    fn as_issued_at_aware(&mut self) -> Option<&mut dyn IssuedAtAware> {
        None
    }
}

/// Receives the name of the generator composing the token
pub trait GeneratorNameAware {
    /// Supply the generator name
    fn set_generator_name(&mut self, name: &str);
}

/// Receives the issued-at instant of the token being composed
pub trait IssuedAtAware {
    /// Supply the issuance time
    fn set_issued_at(&mut self, issued_at: DateTime<Utc>);
}

impl fmt::Debug for dyn Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claim").field("name", &self.name()).finish()
    }
}
