//! Named generator resolution and caching
//!
//! The manager turns raw configuration entries into generators. `get` is the
//! memoizing accessor; `resolve` always rebuilds and replaces the cached
//! entry. Concurrent rebuilds of one name are last-writer-wins, which is
//! harmless because a fixed configuration always resolves the same way.

use crate::algorithms::Algorithm;
use crate::claims::ClaimRegistry;
use crate::clock::Clock;
use crate::config::{
    DEFAULT_EXPIRY_SECONDS, ExpiryConfig, GeneratorConfig, JwtConfig, KeyConfig,
    RawGeneratorConfig,
};
use crate::error::{ConfigurationError, JwtResult};
use crate::events::EventDispatcher;
use crate::generator::{DefaultGenerator, Generator, GeneratorContext};
use crate::keys::KeyMaterial;
use chrono::Duration;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the built-in construction strategy
pub const DEFAULT_DRIVER: &str = "default";

/// Alternate construction strategy selected by a generator's `driver` entry
pub trait GeneratorDriver: Send + Sync + 'static {
    /// Build a generator from resolved configuration.
    ///
    /// # Errors
    /// Any error; it is returned unchanged from `resolve`.
    fn create(
        &self,
        config: GeneratorConfig,
        context: GeneratorContext,
    ) -> JwtResult<Arc<dyn Generator>>;
}

impl<F> GeneratorDriver for F
where
    F: Fn(GeneratorConfig, GeneratorContext) -> JwtResult<Arc<dyn Generator>>
        + Send
        + Sync
        + 'static,
{
    fn create(
        &self,
        config: GeneratorConfig,
        context: GeneratorContext,
    ) -> JwtResult<Arc<dyn Generator>> {
        self(config, context)
    }
}

/// Builder for [`JwtManager`]
pub struct JwtManagerBuilder {
    config: JwtConfig,
    registry: Option<ClaimRegistry>,
    events: Option<Arc<EventDispatcher>>,
    clock: Option<Arc<dyn Clock>>,
    drivers: HashMap<String, Arc<dyn GeneratorDriver>>,
}

impl JwtManagerBuilder {
    /// Replace the built-in contributor registry
    #[must_use]
    pub fn registry(mut self, registry: ClaimRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Share an event dispatcher
    #[must_use]
    pub fn events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Use a custom time source
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Register a driver under `name`
    #[must_use]
    pub fn driver(mut self, name: impl Into<String>, driver: impl GeneratorDriver) -> Self {
        self.drivers.insert(name.into(), Arc::new(driver));
        self
    }

    /// Finish the manager
    #[must_use]
    pub fn build(self) -> JwtManager {
        let mut context = GeneratorContext::new(self.config.app.clone());
        if let Some(registry) = self.registry {
            context.registry = Arc::new(registry);
        }
        if let Some(events) = self.events {
            context.events = events;
        }
        if let Some(clock) = self.clock {
            context.clock = clock;
        }

        JwtManager {
            config: self.config,
            context,
            drivers: self.drivers,
            generators: DashMap::new(),
        }
    }
}

/// Resolves and caches named generators
pub struct JwtManager {
    config: JwtConfig,
    context: GeneratorContext,
    drivers: HashMap<String, Arc<dyn GeneratorDriver>>,
    generators: DashMap<String, Arc<dyn Generator>>,
}

impl JwtManager {
    /// Manager with built-in contributors and the wall clock
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start configuring a manager
    #[must_use]
    pub fn builder(config: JwtConfig) -> JwtManagerBuilder {
        JwtManagerBuilder {
            config,
            registry: None,
            events: None,
            clock: None,
            drivers: HashMap::new(),
        }
    }

    /// The cached generator for `name`, resolving it on first use.
    ///
    /// # Errors
    /// See [`JwtManager::resolve`].
    pub async fn get(&self, name: &str) -> JwtResult<Arc<dyn Generator>> {
        let cached = self
            .generators
            .get(name)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(generator) = cached {
            debug!(generator = name, "Using cached JWT generator");
            return Ok(generator);
        }
        self.resolve(name).await
    }

    /// Build the generator for `name` from configuration and cache it.
    ///
    /// # Errors
    /// `ConfigurationError` when the entry is missing or invalid; whatever a
    /// custom driver reports.
    pub async fn resolve(&self, name: &str) -> JwtResult<Arc<dyn Generator>> {
        debug!(generator = name, "Resolving JWT generator");

        let raw = self
            .config
            .generator(name)
            .ok_or_else(|| ConfigurationError::UnknownGenerator {
                name: name.to_string(),
            })?;

        let config = self.resolve_config(name, raw).await?;
        let algorithm = config.algorithm;

        let generator: Arc<dyn Generator> = match raw.driver.as_deref() {
            None | Some(DEFAULT_DRIVER) => {
                Arc::new(DefaultGenerator::new(config, self.context.clone())?)
            }
            Some(driver) => {
                let factory = self.drivers.get(driver).ok_or_else(|| {
                    ConfigurationError::UnsupportedDriver {
                        generator: name.to_string(),
                        driver: driver.to_string(),
                    }
                })?;
                let generator = factory.create(config, self.context.clone())?;
                if generator.name() != name {
                    return Err(ConfigurationError::InvalidDriverResult {
                        generator: name.to_string(),
                        driver: driver.to_string(),
                        reason: format!(
                            "generator reports the name \"{}\"",
                            generator.name()
                        ),
                    }
                    .into());
                }
                generator
            }
        };

        self.generators
            .insert(name.to_string(), Arc::clone(&generator));
        info!(generator = name, %algorithm, "JWT generator resolved");

        Ok(generator)
    }

    /// Drop the cached generator for `name`; returns whether one was cached
    pub fn forget(&self, name: &str) -> bool {
        self.generators.remove(name).is_some()
    }

    /// Names of cached generators, sorted
    #[must_use]
    pub fn resolved(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .generators
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Dispatcher shared by every generator this manager builds
    #[must_use]
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.context.events
    }

    /// Configuration the manager resolves from
    #[must_use]
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Apply defaults, validate, load keys and dry-run the claim list
    async fn resolve_config(
        &self,
        name: &str,
        raw: &RawGeneratorConfig,
    ) -> Result<GeneratorConfig, ConfigurationError> {
        // No algorithm means HS256 keyed with the application secret
        let (algorithm, key) = match raw.algorithm.as_deref() {
            None => {
                let key = self.config.app.key.clone().map(KeyConfig::Single);
                (Algorithm::HS256, key)
            }
            Some(id) => {
                let algorithm =
                    id.parse::<Algorithm>()
                        .map_err(|_| ConfigurationError::UnknownAlgorithm {
                            generator: name.to_string(),
                            algorithm: id.to_string(),
                        })?;
                (algorithm, raw.key.clone())
            }
        };

        let expiry = resolve_expiry(name, raw.expiry.as_ref())?;
        let keys = load_keys(name, algorithm, key.as_ref()).await?;

        self.context
            .registry
            .instantiate_all(&raw.claims, &self.context.claim_context())
            .map_err(|source| ConfigurationError::InvalidClaims {
                generator: name.to_string(),
                source,
            })?;

        Ok(GeneratorConfig {
            name: name.to_string(),
            algorithm,
            keys,
            expiry: Some(expiry),
            claims: raw.claims.clone(),
        })
    }
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("generators", &self.config.generators.keys().collect::<Vec<_>>())
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .field("resolved", &self.resolved())
            .finish_non_exhaustive()
    }
}

fn resolve_expiry(name: &str, expiry: Option<&ExpiryConfig>) -> Result<Duration, ConfigurationError> {
    let Some(expiry) = expiry else {
        return Duration::try_seconds(DEFAULT_EXPIRY_SECONDS).ok_or_else(|| {
            ConfigurationError::InvalidExpiry {
                generator: name.to_string(),
                value: DEFAULT_EXPIRY_SECONDS.to_string(),
            }
        });
    };

    expiry
        .to_duration()
        .ok_or_else(|| ConfigurationError::InvalidExpiry {
            generator: name.to_string(),
            value: expiry.to_string(),
        })
}

/// Check the key shape against the algorithm, then decode it
async fn load_keys(
    name: &str,
    algorithm: Algorithm,
    key: Option<&KeyConfig>,
) -> Result<KeyMaterial, ConfigurationError> {
    if algorithm.is_symmetric() {
        return match key {
            Some(KeyConfig::Single(key)) if !key.is_empty() => {
                KeyMaterial::load_symmetric(key, name).await
            }
            _ => Err(ConfigurationError::InvalidKey {
                generator: name.to_string(),
                reason: format!("{algorithm} requires a single non-empty key string"),
            }),
        };
    }

    match key {
        Some(KeyConfig::Pair {
            signing: Some(signing),
            verification: Some(verification),
        }) if !signing.is_empty() && !verification.is_empty() => {
            KeyMaterial::load_pair(signing, verification, name).await
        }
        _ => Err(ConfigurationError::InvalidKeyPair {
            generator: name.to_string(),
        }),
    }
}
