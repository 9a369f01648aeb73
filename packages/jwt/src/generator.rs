//! Token generators
//!
//! A generator is bound to one algorithm, one set of keys, an optional expiry
//! and an ordered list of claim contributors. It issues tokens for a subject
//! and parses (optionally validating) tokens it or a peer issued.

use crate::algorithms::Algorithm;
use crate::claims::{Claim, ClaimContext, ClaimName, ClaimRegistry, ClaimValue};
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, GeneratorConfig};
use crate::error::{ClaimError, ConfigurationError, JwtResult, SignerError};
use crate::events::{EventDispatcher, TokenEvent};
use crate::token::{JwtHeader, Token, TokenClaims};
use crate::traits::Signer;
use crate::validation::{self, ExpectedClaims};
use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Issues and parses tokens for one configured name
pub trait Generator: Send + Sync {
    /// Configured generator name
    fn name(&self) -> &str;

    /// Signing algorithm
    fn algorithm(&self) -> Algorithm;

    /// Issue a token for `subject`.
    ///
    /// # Errors
    /// `ClaimError` when the subject or a contributed claim is unusable,
    /// `SignerError` when signing fails.
    fn generate(&self, subject: Subject) -> JwtResult<Token>;

    /// Decode `token`, validating it when `validate` is true.
    ///
    /// # Errors
    /// `TokenFormatError` when the string cannot be decoded,
    /// `TokenValidationError` when a check fails.
    fn parse(&self, token: &str, validate: bool) -> JwtResult<Token>;
}

impl fmt::Debug for dyn Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.name())
            .field("algorithm", &self.algorithm())
            .finish()
    }
}

/// Token subject: anything with a textual form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject(String);

impl Subject {
    /// Use the `Display` form of `value`
    pub fn display(value: impl fmt::Display) -> Self {
        Self(value.to_string())
    }

    /// Subject text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the subject text
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Subject {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for Subject {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

macro_rules! subject_from_integer {
    ($($int:ty),*) => {
        $(
            impl From<$int> for Subject {
                fn from(value: $int) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

subject_from_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<uuid::Uuid> for Subject {
    fn from(value: uuid::Uuid) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convenience calls over [`Generator`]
pub trait GeneratorExt: Generator {
    /// Issue a token for anything convertible to a [`Subject`].
    ///
    /// # Errors
    /// See [`Generator::generate`].
    fn generate_for(&self, subject: impl Into<Subject>) -> JwtResult<Token> {
        self.generate(subject.into())
    }

    /// Decode and validate `token`.
    ///
    /// # Errors
    /// See [`Generator::parse`].
    fn parse_valid(&self, token: &str) -> JwtResult<Token> {
        self.parse(token, true)
    }
}

impl<G: Generator + ?Sized> GeneratorExt for G {}

/// Shared collaborators every generator built by one manager receives
#[derive(Clone)]
pub struct GeneratorContext {
    /// Application identity
    pub app: Arc<AppConfig>,
    /// Contributor constructors
    pub registry: Arc<ClaimRegistry>,
    /// Event sink
    pub events: Arc<EventDispatcher>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl GeneratorContext {
    /// Context with built-in contributors, a fresh dispatcher and the wall clock
    #[must_use]
    pub fn new(app: AppConfig) -> Self {
        Self {
            app: Arc::new(app),
            registry: Arc::new(ClaimRegistry::new()),
            events: Arc::new(EventDispatcher::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Contributor construction context
    #[must_use]
    pub fn claim_context(&self) -> ClaimContext {
        ClaimContext::new(Arc::clone(&self.app))
    }
}

impl Default for GeneratorContext {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl fmt::Debug for GeneratorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorContext")
            .field("app", &self.app)
            .field("registry", &self.registry)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// The built-in generator
pub struct DefaultGenerator {
    config: GeneratorConfig,
    signer: Arc<dyn Signer>,
    context: GeneratorContext,
}

impl DefaultGenerator {
    /// Build the signer for `config` and bind it to `context`.
    ///
    /// # Errors
    /// `ConfigurationError::InvalidKey` when the key material does not fit
    /// the algorithm.
    pub fn new(config: GeneratorConfig, context: GeneratorContext) -> JwtResult<Self> {
        let signer = config
            .algorithm
            .signer(&config.keys)
            .map_err(|e| match e {
                SignerError::InvalidKey { reason, .. } => ConfigurationError::InvalidKey {
                    generator: config.name.clone(),
                    reason,
                },
                other => ConfigurationError::InvalidKey {
                    generator: config.name.clone(),
                    reason: other.to_string(),
                },
            })?;

        Ok(Self {
            config,
            signer,
            context,
        })
    }

    /// Resolved configuration
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Collaborators this generator was built with
    #[must_use]
    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    /// Instantiate every contributor and inject the state each asks for
    fn claims(&self, issued_at: Option<DateTime<Utc>>) -> Result<Vec<Box<dyn Claim>>, ClaimError> {
        let mut claims = self
            .context
            .registry
            .instantiate_all(&self.config.claims, &self.context.claim_context())?;

        for claim in &mut claims {
            if let Some(aware) = claim.as_generator_name_aware() {
                aware.set_generator_name(&self.config.name);
            }
            if let Some(issued_at) = issued_at {
                if let Some(aware) = claim.as_issued_at_aware() {
                    aware.set_issued_at(issued_at);
                }
            }
        }

        Ok(claims)
    }

    fn apply(&self, claims: &mut TokenClaims, claim: &dyn Claim) -> Result<(), ClaimError> {
        let name = claim.name();
        match name {
            ClaimName::Audience => self.merge_audience(&mut claims.aud, claim.value()?),
            ClaimName::Issuer => {
                claims.iss = Some(required_string(&name, claim.value()?)?);
                Ok(())
            }
            ClaimName::Id => {
                claims.jti = Some(required_string(&name, claim.value()?)?);
                Ok(())
            }
            ClaimName::NotBefore => {
                claims.nbf = Some(timestamp(&name, claim.value()?)?);
                Ok(())
            }
            ClaimName::Subject | ClaimName::IssuedAt | ClaimName::ExpiresAt => {
                Err(ClaimError::RestrictedClaim {
                    claim: name.to_string(),
                })
            }
            ClaimName::Custom(custom) => {
                // A contributor may build `Custom("iss")` directly
                ClaimName::custom(custom.as_str())?;
                claims.custom.insert(custom, claim.value()?.into_json());
                Ok(())
            }
        }
    }

    /// Audiences accumulate; any empty or absent entry rejects the claim
    fn merge_audience(&self, audiences: &mut Vec<String>, value: ClaimValue) -> Result<(), ClaimError> {
        let invalid = || ClaimError::InvalidAudience {
            generator: self.config.name.clone(),
        };

        let entries = match value {
            ClaimValue::String(s) => vec![Some(s)],
            ClaimValue::OptionalString(s) => vec![s],
            ClaimValue::List(entries) => entries,
            ClaimValue::Timestamp(_) => return Err(invalid()),
        };

        for entry in entries {
            let audience = entry.filter(|a| !a.is_empty()).ok_or_else(invalid)?;
            if !audiences.contains(&audience) {
                audiences.push(audience);
            }
        }

        Ok(())
    }

    fn validate(&self, token: &Token) -> JwtResult<()> {
        validation::verify_signature(token, self.signer.as_ref())?;
        validation::check_time(token, self.context.clock.now())?;

        // No issuance time to inject. The generator name is still injected so
        // generator-name issuer and audience contributors are comparable here.
        let claims = self.claims(None)?;
        let expected = ExpectedClaims::collect(&self.config.name, &claims)?;
        expected.check(token)?;

        Ok(())
    }
}

impl Generator for DefaultGenerator {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    fn generate(&self, subject: Subject) -> JwtResult<Token> {
        let subject = subject.into_string();
        if subject.is_empty() {
            return Err(ClaimError::InvalidSubject.into());
        }

        self.context.events.dispatch(TokenEvent::Generating {
            generator: self.config.name.clone(),
            subject: subject.clone(),
        });

        let issued_at = self.context.clock.now().trunc_subsecs(0);
        let expires_at = match self.config.expiry {
            Some(expiry) => Some(issued_at.checked_add_signed(expiry).ok_or_else(|| {
                ClaimError::InvalidClaim {
                    claim: ClaimName::ExpiresAt.to_string(),
                }
            })?),
            None => None,
        };

        let mut claims = TokenClaims {
            sub: Some(subject),
            iat: Some(issued_at),
            exp: expires_at,
            ..TokenClaims::default()
        };

        for claim in self.claims(Some(issued_at))? {
            self.apply(&mut claims, claim.as_ref())?;
        }

        let token = Token::sign(
            JwtHeader::new(self.config.algorithm.as_str()),
            claims,
            self.signer.as_ref(),
        )?;

        debug!(
            generator = %self.config.name,
            algorithm = %self.config.algorithm,
            "Generated JWT token"
        );

        self.context.events.dispatch(TokenEvent::Generated {
            generator: self.config.name.clone(),
            token: token.clone(),
        });

        Ok(token)
    }

    fn parse(&self, token: &str, validate: bool) -> JwtResult<Token> {
        let parsed = Token::decode(token)?;

        if validate {
            self.validate(&parsed)?;
        }

        Ok(parsed)
    }
}

impl fmt::Debug for DefaultGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultGenerator")
            .field("name", &self.config.name)
            .field("algorithm", &self.config.algorithm)
            .field("expiry", &self.config.expiry)
            .field("claims", &self.config.claims)
            .finish_non_exhaustive()
    }
}

fn required_string(name: &ClaimName, value: ClaimValue) -> Result<String, ClaimError> {
    value
        .as_non_empty_str()
        .map(str::to_string)
        .ok_or_else(|| ClaimError::InvalidClaim {
            claim: name.to_string(),
        })
}

/// Timestamps pass through; strings are read as RFC 3339
fn timestamp(name: &ClaimName, value: ClaimValue) -> Result<DateTime<Utc>, ClaimError> {
    let invalid = || ClaimError::InvalidClaim {
        claim: name.to_string(),
    };
    match value {
        ClaimValue::Timestamp(t) => Ok(t),
        other => {
            let text = other.as_non_empty_str().ok_or_else(invalid)?;
            DateTime::parse_from_rfc3339(text)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| invalid())
        }
    }
}
