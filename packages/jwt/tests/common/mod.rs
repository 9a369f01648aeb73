//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use cryypt_jwt_manager::{
    Algorithm, AppConfig, ClaimSpec, DefaultGenerator, FixedClock, GeneratorConfig,
    GeneratorContext, KeyMaterial,
};
use std::sync::Arc;

/// 32 bytes, the HS256 minimum
pub const HS256_KEY: &str = "0123456789abcdef0123456789abcdef";
/// 48 bytes
pub const HS384_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef";
/// 64 bytes
pub const HS512_KEY: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// 2030-01-01T00:00:00Z
pub const START: i64 = 1_893_456_000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// `file:` key string for a fixture
pub fn file_key(name: &str) -> String {
    format!("file:{}", fixture(name))
}

pub fn read_fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture(name)).unwrap()
}

/// Signing/verification fixtures for an asymmetric algorithm
pub fn key_pair_files(algorithm: Algorithm) -> (&'static str, &'static str) {
    match algorithm {
        Algorithm::ES256 => ("p256_private.pem", "p256_public.pem"),
        Algorithm::ES384 => ("p384_private.pem", "p384_public.pem"),
        Algorithm::ES512 => ("p521_private.pem", "p521_public.pem"),
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
            ("rsa_private.pem", "rsa_public.pem")
        }
        Algorithm::EdDSA => ("ed25519_private.pem", "ed25519_public.pem"),
        other => panic!("{other} is symmetric"),
    }
}

/// Key material that satisfies `algorithm`
pub fn key_material(algorithm: Algorithm) -> KeyMaterial {
    match algorithm {
        Algorithm::HS256 | Algorithm::BLAKE2B => KeyMaterial::symmetric(HS256_KEY),
        Algorithm::HS384 => KeyMaterial::symmetric(HS384_KEY),
        Algorithm::HS512 => KeyMaterial::symmetric(HS512_KEY),
        asymmetric => {
            let (signing, verification) = key_pair_files(asymmetric);
            KeyMaterial::asymmetric(read_fixture(signing), read_fixture(verification))
        }
    }
}

pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(START, 0).unwrap()
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(start()))
}

pub fn app() -> AppConfig {
    AppConfig::default()
        .with_name("acme")
        .with_url("https://acme.test")
        .with_key(HS256_KEY)
}

pub fn context(clock: Arc<FixedClock>) -> GeneratorContext {
    let mut context = GeneratorContext::new(app());
    context.clock = clock;
    context
}

pub fn generator_config(name: &str, algorithm: Algorithm, claims: Vec<ClaimSpec>) -> GeneratorConfig {
    GeneratorConfig {
        name: name.to_string(),
        algorithm,
        keys: key_material(algorithm),
        expiry: Some(chrono::Duration::hours(1)),
        claims,
    }
}

/// HS256 generator on a fixed clock
pub fn hs256(name: &str, claims: Vec<ClaimSpec>, clock: Arc<FixedClock>) -> DefaultGenerator {
    DefaultGenerator::new(generator_config(name, Algorithm::HS256, claims), context(clock)).unwrap()
}

pub fn spec(claim: &str, params: Vec<serde_json::Value>) -> ClaimSpec {
    ClaimSpec::with_params(claim, params)
}
