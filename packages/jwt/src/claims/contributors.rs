//! Built-in claim contributors

use super::{Claim, ClaimName, ClaimValue, GeneratorNameAware, IssuedAtAware};
use crate::error::ClaimError;
use chrono::{DateTime, Duration, Utc};

/// Sets `iss` to a fixed value; `None` means "no issuer restriction" when
/// validating and is rejected when issuing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsIssuer {
    issuer: Option<String>,
}

impl AsIssuer {
    /// Create the contributor
    #[must_use]
    pub fn new(issuer: Option<String>) -> Self {
        Self { issuer }
    }
}

impl Claim for AsIssuer {
    fn name(&self) -> ClaimName {
        ClaimName::Issuer
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::OptionalString(self.issuer.clone()))
    }
}

/// Sets `iss` to the application name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppNameAsIssuer {
    app_name: String,
}

impl AppNameAsIssuer {
    /// Create the contributor
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Claim for AppNameAsIssuer {
    fn name(&self) -> ClaimName {
        ClaimName::Issuer
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::String(self.app_name.clone()))
    }
}

/// Sets `iss` to the application URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUrlAsIssuer {
    app_url: String,
}

impl AppUrlAsIssuer {
    /// Create the contributor
    #[must_use]
    pub fn new(app_url: impl Into<String>) -> Self {
        Self {
            app_url: app_url.into(),
        }
    }
}

impl Claim for AppUrlAsIssuer {
    fn name(&self) -> ClaimName {
        ClaimName::Issuer
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::String(self.app_url.clone()))
    }
}

/// Sets `iss` to the name of the generator issuing the token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorNameAsIssuer {
    generator_name: Option<String>,
}

impl GeneratorNameAsIssuer {
    /// Create the contributor; the name is injected later
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Claim for GeneratorNameAsIssuer {
    fn name(&self) -> ClaimName {
        ClaimName::Issuer
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        self.generator_name
            .clone()
            .map(ClaimValue::String)
            .ok_or_else(|| ClaimError::UninitializedClaim {
                claim: ClaimName::Issuer.to_string(),
                missing: "generator name",
            })
    }

    fn as_generator_name_aware(&mut self) -> Option<&mut dyn GeneratorNameAware> {
        Some(self)
    }
}

impl GeneratorNameAware for GeneratorNameAsIssuer {
    fn set_generator_name(&mut self, name: &str) {
        self.generator_name = Some(name.to_string());
    }
}

/// Adds one audience; `None` adds no restriction when validating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InAudience {
    audience: Option<String>,
}

impl InAudience {
    /// Create the contributor
    #[must_use]
    pub fn new(audience: Option<String>) -> Self {
        Self { audience }
    }
}

impl Claim for InAudience {
    fn name(&self) -> ClaimName {
        ClaimName::Audience
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::OptionalString(self.audience.clone()))
    }
}

/// Adds a list of audiences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsAudience {
    audiences: Vec<Option<String>>,
}

impl AsAudience {
    /// Create the contributor
    #[must_use]
    pub fn new(audiences: Vec<Option<String>>) -> Self {
        Self { audiences }
    }
}

impl Claim for AsAudience {
    fn name(&self) -> ClaimName {
        ClaimName::Audience
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::List(self.audiences.clone()))
    }
}

/// Adds the application name as an audience
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppNameInAudience {
    app_name: String,
}

impl AppNameInAudience {
    /// Create the contributor
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Claim for AppNameInAudience {
    fn name(&self) -> ClaimName {
        ClaimName::Audience
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::String(self.app_name.clone()))
    }
}

/// Adds the issuing generator's name as an audience
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorNameInAudience {
    generator_name: Option<String>,
}

impl GeneratorNameInAudience {
    /// Create the contributor; the name is injected later
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Claim for GeneratorNameInAudience {
    fn name(&self) -> ClaimName {
        ClaimName::Audience
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        self.generator_name
            .clone()
            .map(ClaimValue::String)
            .ok_or_else(|| ClaimError::UninitializedClaim {
                claim: ClaimName::Audience.to_string(),
                missing: "generator name",
            })
    }

    fn as_generator_name_aware(&mut self) -> Option<&mut dyn GeneratorNameAware> {
        Some(self)
    }
}

impl GeneratorNameAware for GeneratorNameInAudience {
    fn set_generator_name(&mut self, name: &str) {
        self.generator_name = Some(name.to_string());
    }
}

/// Sets `nbf` to the issuance time plus a fixed offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotWithin {
    offset: Duration,
    issued_at: Option<DateTime<Utc>>,
}

impl NotWithin {
    /// Create the contributor from an already parsed offset
    #[must_use]
    pub fn new(offset: Duration) -> Self {
        Self {
            offset,
            issued_at: None,
        }
    }

    /// Create the contributor from a duration expression such as `"1 hour"`.
    ///
    /// # Errors
    /// `InvalidInterval` if the expression cannot be parsed.
    pub fn parse(expression: &str) -> Result<Self, ClaimError> {
        crate::interval::parse(expression).map(Self::new)
    }

    /// The configured offset
    #[must_use]
    pub fn offset(&self) -> Duration {
        self.offset
    }
}

impl Claim for NotWithin {
    fn name(&self) -> ClaimName {
        ClaimName::NotBefore
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        let issued_at = self.issued_at.ok_or_else(|| ClaimError::UninitializedClaim {
            claim: ClaimName::NotBefore.to_string(),
            missing: "issued-at time",
        })?;
        issued_at
            .checked_add_signed(self.offset)
            .map(ClaimValue::Timestamp)
            .ok_or_else(|| ClaimError::InvalidClaim {
                claim: ClaimName::NotBefore.to_string(),
            })
    }

    fn as_issued_at_aware(&mut self) -> Option<&mut dyn IssuedAtAware> {
        Some(self)
    }
}

impl IssuedAtAware for NotWithin {
    fn set_issued_at(&mut self, issued_at: DateTime<Utc>) {
        self.issued_at = Some(issued_at);
    }
}

/// Sets `jti` to a random UUID; each instance carries its own id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueId {
    id: uuid::Uuid,
}

impl UniqueId {
    /// Create the contributor with a fresh v4 UUID
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
        }
    }
}

impl Default for UniqueId {
    fn default() -> Self {
        Self::new()
    }
}

impl Claim for UniqueId {
    fn name(&self) -> ClaimName {
        ClaimName::Id
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::String(self.id.to_string()))
    }
}

/// A fixed custom claim
#[derive(Debug, Clone, PartialEq)]
pub struct CustomClaim {
    name: ClaimName,
    value: ClaimValue,
}

impl CustomClaim {
    /// Create the contributor.
    ///
    /// # Errors
    /// `ReservedClaimName` when `name` is a registered claim.
    pub fn new(name: impl Into<String>, value: impl Into<ClaimValue>) -> Result<Self, ClaimError> {
        Ok(Self {
            name: ClaimName::custom(name)?,
            value: value.into(),
        })
    }
}

impl Claim for CustomClaim {
    fn name(&self) -> ClaimName {
        self.name.clone()
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(self.value.clone())
    }
}
