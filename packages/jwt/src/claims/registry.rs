//! Typed contributor registry
//!
//! Configuration names contributors by identifier and passes them positional
//! parameters. The registry maps each identifier to a constructor that reads
//! those parameters through [`ClaimParams`] and builds a fresh contributor.

use super::contributors::{
    AppNameAsIssuer, AppNameInAudience, AppUrlAsIssuer, AsAudience, AsIssuer, CustomClaim,
    GeneratorNameAsIssuer, GeneratorNameInAudience, InAudience, NotWithin, UniqueId,
};
use super::{Claim, ClaimValue};
use crate::config::AppConfig;
use crate::error::ClaimError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructor stored in the registry
pub type ClaimConstructor =
    Arc<dyn Fn(&ClaimContext, &ClaimParams<'_>) -> Result<Box<dyn Claim>, ClaimError> + Send + Sync>;

/// One configured contributor: identifier plus positional parameters
///
/// Deserializes from `"identifier"`, `["identifier", param, ...]` or
/// `{ "claim": "identifier", "params": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimSpec {
    /// Registry identifier
    pub claim: String,
    /// Positional constructor parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
}

impl ClaimSpec {
    /// A contributor with no parameters
    #[must_use]
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            params: Vec::new(),
        }
    }

    /// A contributor with parameters
    #[must_use]
    pub fn with_params(claim: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        Self {
            claim: claim.into(),
            params: params.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for ClaimSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(String),
            Positional(Vec<Value>),
            Object {
                claim: String,
                #[serde(default)]
                params: Vec<Value>,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bare(claim) => Ok(ClaimSpec::new(claim)),
            Repr::Object { claim, params } => Ok(ClaimSpec { claim, params }),
            Repr::Positional(mut values) => {
                if values.is_empty() {
                    return Err(D::Error::custom("claim list must start with an identifier"));
                }
                match values.remove(0) {
                    Value::String(claim) => Ok(ClaimSpec {
                        claim,
                        params: values,
                    }),
                    other => Err(D::Error::custom(format!(
                        "claim identifier must be a string, found {other}"
                    ))),
                }
            }
        }
    }
}

impl From<&str> for ClaimSpec {
    fn from(claim: &str) -> Self {
        ClaimSpec::new(claim)
    }
}

/// Ambient state available to contributor constructors
#[derive(Debug, Clone, Default)]
pub struct ClaimContext {
    /// Application identity
    pub app: Arc<AppConfig>,
}

impl ClaimContext {
    /// Wrap an application config
    #[must_use]
    pub fn new(app: Arc<AppConfig>) -> Self {
        Self { app }
    }
}

/// Positional parameters handed to a constructor, with typed accessors
#[derive(Debug, Clone, Copy)]
pub struct ClaimParams<'a> {
    identifier: &'a str,
    values: &'a [Value],
}

impl<'a> ClaimParams<'a> {
    /// View over a spec's parameters
    #[must_use]
    pub fn new(identifier: &'a str, values: &'a [Value]) -> Self {
        Self { identifier, values }
    }

    /// Identifier of the contributor being built
    #[must_use]
    pub fn identifier(&self) -> &'a str {
        self.identifier
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail unless the parameter count is within `min..=max`.
    ///
    /// # Errors
    /// `InvalidClaimParameters` naming the expected count.
    pub fn expect_len(&self, min: usize, max: usize) -> Result<(), ClaimError> {
        let n = self.values.len();
        if (min..=max).contains(&n) {
            return Ok(());
        }
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        Err(self.invalid(format!("expected {expected} parameter(s), got {n}")))
    }

    /// Raw parameter at `index`.
    ///
    /// # Errors
    /// `InvalidClaimParameters` if it is missing.
    pub fn value(&self, index: usize) -> Result<&'a Value, ClaimError> {
        self.values
            .get(index)
            .ok_or_else(|| self.invalid(format!("missing parameter {index}")))
    }

    /// Required string parameter; numbers are accepted in their decimal form.
    ///
    /// # Errors
    /// `InvalidClaimParameters` if missing, null or not string-like.
    pub fn string(&self, index: usize) -> Result<String, ClaimError> {
        self.optional_string(index)?
            .ok_or_else(|| self.invalid(format!("parameter {index} must not be null")))
    }

    /// Nullable string parameter; a missing trailing parameter reads as `None`.
    ///
    /// # Errors
    /// `InvalidClaimParameters` if the value is not string-like.
    pub fn optional_string(&self, index: usize) -> Result<Option<String>, ClaimError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.string_like(index, value).map(Some),
        }
    }

    /// List of nullable strings; a single string is treated as a one-entry list.
    ///
    /// # Errors
    /// `InvalidClaimParameters` if missing or an entry is not string-like.
    pub fn string_list(&self, index: usize) -> Result<Vec<Option<String>>, ClaimError> {
        match self.value(index)? {
            Value::Array(entries) => entries
                .iter()
                .map(|entry| match entry {
                    Value::Null => Ok(None),
                    other => self.string_like(index, other).map(Some),
                })
                .collect(),
            Value::Null => Ok(vec![None]),
            other => self.string_like(index, other).map(|s| vec![Some(s)]),
        }
    }

    /// Parameter converted to a claim value: strings, lists of strings or null.
    ///
    /// # Errors
    /// `InvalidClaimParameters` for objects, booleans or nested lists.
    pub fn claim_value(&self, index: usize) -> Result<ClaimValue, ClaimError> {
        match self.value(index)? {
            Value::Null => Ok(ClaimValue::OptionalString(None)),
            Value::Array(_) => self.string_list(index).map(ClaimValue::List),
            other => self.string_like(index, other).map(ClaimValue::String),
        }
    }

    fn string_like(&self, index: usize, value: &Value) -> Result<String, ClaimError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(self.invalid(format!(
                "parameter {index} must be a string, found {other}"
            ))),
        }
    }

    fn invalid(&self, reason: String) -> ClaimError {
        ClaimError::invalid_parameters(self.identifier, reason)
    }
}

/// Identifier to constructor mapping
#[derive(Clone)]
pub struct ClaimRegistry {
    constructors: HashMap<String, ClaimConstructor>,
}

impl ClaimRegistry {
    /// A registry with no contributors at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry with every built-in contributor registered
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register("as_issuer", |_, params| {
                params.expect_len(0, 1)?;
                Ok(Box::new(AsIssuer::new(params.optional_string(0)?)))
            })
            .register("app_name_as_issuer", |ctx, params| {
                params.expect_len(0, 0)?;
                Ok(Box::new(AppNameAsIssuer::new(app_name(ctx, params)?)))
            })
            .register("app_url_as_issuer", |ctx, params| {
                params.expect_len(0, 0)?;
                let url = ctx.app.url.clone().ok_or_else(|| {
                    ClaimError::invalid_parameters(params.identifier(), "app.url is not configured")
                })?;
                Ok(Box::new(AppUrlAsIssuer::new(url)))
            })
            .register("generator_name_as_issuer", |_, params| {
                params.expect_len(0, 0)?;
                Ok(Box::new(GeneratorNameAsIssuer::new()))
            })
            .register("in_audience", |_, params| {
                params.expect_len(0, 1)?;
                Ok(Box::new(InAudience::new(params.optional_string(0)?)))
            })
            .register("as_audience", |_, params| {
                params.expect_len(1, 1)?;
                Ok(Box::new(AsAudience::new(params.string_list(0)?)))
            })
            .register("app_name_in_audience", |ctx, params| {
                params.expect_len(0, 0)?;
                Ok(Box::new(AppNameInAudience::new(app_name(ctx, params)?)))
            })
            .register("generator_name_in_audience", |_, params| {
                params.expect_len(0, 0)?;
                Ok(Box::new(GeneratorNameInAudience::new()))
            })
            .register("not_within", |_, params| {
                params.expect_len(1, 1)?;
                Ok(Box::new(NotWithin::parse(&params.string(0)?)?))
            })
            .register("unique_id", |_, params| {
                params.expect_len(0, 0)?;
                Ok(Box::new(UniqueId::new()))
            })
            .register("custom", |_, params| {
                params.expect_len(2, 2)?;
                Ok(Box::new(CustomClaim::new(
                    params.string(0)?,
                    params.claim_value(1)?,
                )?))
            });
        registry
    }

    /// Register or replace a constructor
    pub fn register<F>(&mut self, identifier: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&ClaimContext, &ClaimParams<'_>) -> Result<Box<dyn Claim>, ClaimError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(identifier.into(), Arc::new(constructor));
        self
    }

    /// Whether `identifier` has a constructor
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }

    /// Registered identifiers, sorted
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Build one contributor.
    ///
    /// # Errors
    /// `UnresolvableClaim` for unknown identifiers, otherwise whatever the
    /// constructor reports.
    pub fn instantiate(
        &self,
        spec: &ClaimSpec,
        ctx: &ClaimContext,
    ) -> Result<Box<dyn Claim>, ClaimError> {
        let constructor =
            self.constructors
                .get(&spec.claim)
                .ok_or_else(|| ClaimError::UnresolvableClaim {
                    identifier: spec.claim.clone(),
                })?;
        constructor(ctx, &ClaimParams::new(&spec.claim, &spec.params))
    }

    /// Build every contributor in order, stopping at the first failure.
    ///
    /// # Errors
    /// See [`ClaimRegistry::instantiate`].
    pub fn instantiate_all(
        &self,
        specs: &[ClaimSpec],
        ctx: &ClaimContext,
    ) -> Result<Vec<Box<dyn Claim>>, ClaimError> {
        specs.iter().map(|spec| self.instantiate(spec, ctx)).collect()
    }
}

impl Default for ClaimRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClaimRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}

fn app_name(ctx: &ClaimContext, params: &ClaimParams<'_>) -> Result<String, ClaimError> {
    ctx.app.name.clone().ok_or_else(|| {
        ClaimError::invalid_parameters(params.identifier(), "app.name is not configured")
    })
}
