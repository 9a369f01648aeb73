//! Issuance and parsing through `DefaultGenerator`

mod common;

use chrono::Duration;
use common::*;
use cryypt_jwt_manager::{
    Algorithm, Claim, ClaimError, ClaimName, ClaimRegistry, ClaimValue, DefaultGenerator,
    Generator, GeneratorExt, JwtError, ListenerError, Subject, TokenEvent, TokenFormatError,
    TokenValidationError,
};
use proptest::prelude::*;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Blank;

impl fmt::Display for Blank {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

#[test]
fn test_subject_round_trip() {
    let generator = hs256("users", vec![], fixed_clock());

    for subject in [Subject::from("alice"), Subject::from(42u64), Subject::from(-7i32)] {
        let expected = subject.to_string();
        let token = generator.generate(subject).unwrap();
        let parsed = generator.parse(token.as_str(), true).unwrap();
        assert_eq!(parsed.subject(), Some(expected.as_str()));
        assert!(parsed.is_related_to(&expected));
    }
}

proptest! {
    #[test]
    fn prop_any_non_empty_subject_round_trips(subject in "\\PC{1,48}") {
        let generator = hs256("users", vec![], fixed_clock());
        let token = generator.generate_for(subject.as_str()).unwrap();
        let parsed = generator.parse_valid(token.as_str()).unwrap();
        prop_assert_eq!(parsed.subject(), Some(subject.as_str()));
    }
}

#[test]
fn test_empty_subject_fails_without_events() {
    let generator = hs256("users", vec![], fixed_clock());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    generator.context().events.listen(move |_: &TokenEvent| -> Result<(), ListenerError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    for subject in [Subject::from(""), Subject::display(Blank)] {
        let err = generator.generate(subject).unwrap_err();
        assert!(matches!(err, JwtError::Claim(ClaimError::InvalidSubject)));
    }
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

#[test]
fn test_events_fire_before_and_after_signing() {
    let clock = fixed_clock();
    let context = context(clock);
    let events = Arc::clone(&context.events);
    let generator = DefaultGenerator::new(
        generator_config("users", Algorithm::HS256, vec![]),
        context,
    )
    .unwrap();

    let mut receiver = events.subscribe();
    let token = generator.generate_for("bob").unwrap();

    match receiver.try_recv().unwrap() {
        TokenEvent::Generating { generator, subject } => {
            assert_eq!(generator, "users");
            assert_eq!(subject, "bob");
        }
        other => panic!("unexpected event {other:?}"),
    }
    match receiver.try_recv().unwrap() {
        TokenEvent::Generated { generator, token: sent } => {
            assert_eq!(generator, "users");
            assert_eq!(sent, token);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_failing_listener_does_not_fail_issuance() {
    let generator = hs256("users", vec![], fixed_clock());
    generator.context().events.listen(|_: &TokenEvent| -> Result<(), ListenerError> {
        Err(ListenerError::new("listener is down"))
    });

    assert!(generator.generate_for("carol").is_ok());
}

#[test]
fn test_panicking_listener_does_not_fail_issuance() {
    let generator = hs256("users", vec![], fixed_clock());
    let delivered = Arc::new(AtomicUsize::new(0));
    generator.context().events.listen(|_: &TokenEvent| -> Result<(), ListenerError> {
        panic!("listener exploded")
    });
    let counter = Arc::clone(&delivered);
    generator.context().events.listen(move |_: &TokenEvent| -> Result<(), ListenerError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let token = generator.generate_for("carol").unwrap();
    assert_eq!(token.subject(), Some("carol"));
    // Later listeners still see both events
    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

#[test]
fn test_registered_timestamps() {
    let generator = hs256("users", vec![], fixed_clock());
    let token = generator.generate_for("dave").unwrap();

    assert_eq!(token.issued_at(), Some(start()));
    assert_eq!(token.expires_at(), Some(start() + Duration::hours(1)));
    assert_eq!(token.not_before(), None);
    assert_eq!(token.claim("iat"), Some(json!(START)));
}

#[test]
fn test_issued_at_is_truncated_to_whole_seconds() {
    let clock = fixed_clock();
    clock.set(start() + Duration::milliseconds(750));
    let generator = hs256("users", vec![], clock);

    let token = generator.generate_for("erin").unwrap();
    assert_eq!(token.issued_at(), Some(start()));
}

#[test]
fn test_no_expiry_means_no_exp_claim() {
    let mut config = generator_config("forever", Algorithm::HS256, vec![]);
    config.expiry = None;
    let generator = DefaultGenerator::new(config, context(fixed_clock())).unwrap();

    let token = generator.generate_for("frank").unwrap();
    assert_eq!(token.expires_at(), None);
    assert!(generator.parse(token.as_str(), true).is_ok());
}

#[test]
fn test_audience_contributions_accumulate() {
    let claims = vec![
        spec("in_audience", vec![json!("mobile")]),
        spec("as_audience", vec![json!(["web", "mobile", "cli"])]),
        spec("app_name_in_audience", vec![]),
        spec("generator_name_in_audience", vec![]),
    ];
    let generator = hs256("users", claims, fixed_clock());

    let token = generator.generate_for("gina").unwrap();
    assert_eq!(token.audiences(), ["mobile", "web", "cli", "acme", "users"]);
    assert!(generator.parse(token.as_str(), true).is_ok());
}

#[test]
fn test_single_audience_is_encoded_as_string() {
    let generator = hs256("users", vec![spec("in_audience", vec![json!("web")])], fixed_clock());
    let token = generator.generate_for("hank").unwrap();

    let payload = token.as_str().split('.').nth(1).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(
        &base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, payload)
            .unwrap(),
    )
    .unwrap();
    assert_eq!(payload["aud"], json!("web"));
}

#[test]
fn test_absent_or_empty_audience_is_rejected_on_issue() {
    for params in [json!(null), json!("")] {
        let generator = hs256("users", vec![spec("in_audience", vec![params])], fixed_clock());
        let err = generator.generate_for("ivy").unwrap_err();
        assert!(matches!(
            err,
            JwtError::Claim(ClaimError::InvalidAudience { ref generator }) if generator == "users"
        ));
    }

    let generator = hs256(
        "users",
        vec![spec("as_audience", vec![json!(["web", null])])],
        fixed_clock(),
    );
    assert!(matches!(
        generator.generate_for("ivy").unwrap_err(),
        JwtError::Claim(ClaimError::InvalidAudience { .. })
    ));
}

#[test]
fn test_audience_mismatch_is_rejected() {
    let clock = fixed_clock();
    let issuer = hs256("web", vec![spec("in_audience", vec![json!("web")])], Arc::clone(&clock));
    let verifier = hs256(
        "admin",
        vec![spec("as_audience", vec![json!(["admin", "ops"])])],
        clock,
    );

    let token = issuer.generate_for("jack").unwrap();
    let err = verifier.parse(token.as_str(), true).unwrap_err();
    match err {
        JwtError::Validation(TokenValidationError::InvalidAudience { expected }) => {
            assert_eq!(expected, ["admin", "ops"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_null_audience_entries_do_not_restrict_validation() {
    let clock = fixed_clock();
    let issuer = hs256("web", vec![spec("in_audience", vec![json!("web")])], Arc::clone(&clock));
    let mut registry = ClaimRegistry::new();
    registry.register("open_audience", |_, _| {
        Ok(Box::new(cryypt_jwt_manager::claims::InAudience::new(None)))
    });
    let mut context = context(clock);
    context.registry = Arc::new(registry);
    let verifier = DefaultGenerator::new(
        generator_config(
            "web",
            Algorithm::HS256,
            vec![spec("open_audience", vec![])],
        ),
        context,
    )
    .unwrap();

    let token = issuer.generate_for("kate").unwrap();
    assert!(verifier.parse(token.as_str(), true).is_ok());
}

#[test]
fn test_tampered_issuer_is_rejected() {
    let clock = fixed_clock();
    let acme = hs256("users", vec![spec("as_issuer", vec![json!("acme")])], Arc::clone(&clock));
    let forged = hs256("users", vec![spec("as_issuer", vec![json!("acme2")])], clock);

    let token = forged.generate_for("leo").unwrap();
    match acme.parse(token.as_str(), true).unwrap_err() {
        JwtError::Validation(TokenValidationError::InvalidIssuer { expected, found }) => {
            assert_eq!(expected, "acme");
            assert_eq!(found.as_deref(), Some("acme2"));
        }
        other => panic!("unexpected error {other:?}"),
    }

    // Editing the payload in place breaks the signature first
    let genuine = acme.generate_for("leo").unwrap();
    let forged_payload = {
        let mut claims = genuine.claims().clone();
        claims.iss = Some("acme2".to_string());
        base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            serde_json::to_vec(&claims).unwrap(),
        )
    };
    let mut parts: Vec<&str> = genuine.as_str().split('.').collect();
    parts[1] = &forged_payload;
    let err = acme.parse(&parts.join("."), true).unwrap_err();
    assert!(matches!(
        err,
        JwtError::Validation(TokenValidationError::InvalidSignature)
    ));
}

#[test]
fn test_last_issuer_contributor_wins() {
    let claims = vec![
        spec("app_url_as_issuer", vec![]),
        spec("generator_name_as_issuer", vec![]),
    ];
    let generator = hs256("users", claims, fixed_clock());

    let token = generator.generate_for("mia").unwrap();
    assert_eq!(token.issuer(), Some("users"));
    assert!(generator.parse(token.as_str(), true).is_ok());
}

#[test]
fn test_null_issuer_is_rejected_on_issue() {
    let generator = hs256("users", vec![spec("as_issuer", vec![json!(null)])], fixed_clock());
    assert!(matches!(
        generator.generate_for("ned").unwrap_err(),
        JwtError::Claim(ClaimError::InvalidClaim { ref claim }) if claim == "iss"
    ));
}

#[test]
fn test_not_within_makes_fresh_tokens_not_yet_valid() {
    let clock = fixed_clock();
    let generator = hs256(
        "users",
        vec![spec("not_within", vec![json!("1 hour")])],
        Arc::clone(&clock),
    );

    let token = generator.generate_for("olga").unwrap();
    assert_eq!(token.not_before(), Some(start() + Duration::hours(1)));

    let err = generator.parse(token.as_str(), true).unwrap_err();
    assert!(matches!(
        err,
        JwtError::Validation(TokenValidationError::NotYetValid)
    ));

    // Not-before equal to the expiry leaves no valid window at all
    clock.advance(Duration::hours(1));
    assert!(matches!(
        generator.parse(token.as_str(), true).unwrap_err(),
        JwtError::Validation(TokenValidationError::Expired { .. })
    ));
}

#[test]
fn test_not_within_window_opens() {
    let clock = fixed_clock();
    let generator = hs256(
        "users",
        vec![spec("not_within", vec![json!("PT10M")])],
        Arc::clone(&clock),
    );

    let token = generator.generate_for("pam").unwrap();
    clock.advance(Duration::minutes(10));
    assert!(generator.parse(token.as_str(), true).is_ok());
}

#[test]
fn test_expired_tokens_are_rejected_unless_unchecked() {
    let clock = fixed_clock();
    let generator = hs256("users", vec![], Arc::clone(&clock));
    let token = generator.generate_for("quinn").unwrap();

    clock.advance(Duration::hours(1));
    match generator.parse(token.as_str(), true).unwrap_err() {
        JwtError::Validation(TokenValidationError::Expired { expired_at }) => {
            assert_eq!(expired_at, start() + Duration::hours(1));
        }
        other => panic!("unexpected error {other:?}"),
    }

    let unchecked = generator.parse(token.as_str(), false).unwrap();
    assert_eq!(unchecked.subject(), Some("quinn"));
}

#[test]
fn test_tokens_issued_in_the_future_are_not_yet_valid() {
    let clock = fixed_clock();
    let generator = hs256("users", vec![], Arc::clone(&clock));
    let token = generator.generate_for("rob").unwrap();

    clock.advance(Duration::seconds(-1));
    assert!(matches!(
        generator.parse(token.as_str(), true).unwrap_err(),
        JwtError::Validation(TokenValidationError::NotYetValid)
    ));
}

#[test]
fn test_algorithm_mismatch_is_reported() {
    let clock = fixed_clock();
    let hs384 = DefaultGenerator::new(
        generator_config("users", Algorithm::HS384, vec![]),
        context(Arc::clone(&clock)),
    )
    .unwrap();
    let hs256 = hs256("users", vec![], clock);

    let token = hs384.generate_for("sam").unwrap();
    match hs256.parse(token.as_str(), true).unwrap_err() {
        JwtError::Validation(TokenValidationError::AlgorithmMismatch { expected, found }) => {
            assert_eq!(expected, "HS256");
            assert_eq!(found, "HS384");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_malformed_input_is_a_format_error() {
    let generator = hs256("users", vec![], fixed_clock());

    assert!(matches!(
        generator.parse("", true).unwrap_err(),
        JwtError::Format(TokenFormatError::Empty)
    ));
    assert!(matches!(
        generator.parse("abc.def", false).unwrap_err(),
        JwtError::Format(TokenFormatError::Malformed { .. })
    ));
    assert!(matches!(
        generator.parse("a.b.c.d", false).unwrap_err(),
        JwtError::Format(TokenFormatError::Malformed { .. })
    ));
    assert!(matches!(
        generator.parse("!!!.e30.c2ln", false).unwrap_err(),
        JwtError::Format(TokenFormatError::Encoding { part: "header", .. })
    ));
    // `bm90IGpzb24` is "not json"
    assert!(matches!(
        generator.parse("bm90IGpzb24.e30.c2ln", false).unwrap_err(),
        JwtError::Format(TokenFormatError::Json { part: "header", .. })
    ));
}

#[test]
fn test_custom_claims_are_attached() {
    let claims = vec![
        spec("custom", vec![json!("role"), json!("admin")]),
        spec("custom", vec![json!("scopes"), json!(["read", "write"])]),
        spec("unique_id", vec![]),
    ];
    let generator = hs256("users", claims, fixed_clock());

    let first = generator.generate_for("tom").unwrap();
    let second = generator.generate_for("tom").unwrap();
    assert_eq!(first.claim("role"), Some(json!("admin")));
    assert_eq!(first.claim("scopes"), Some(json!(["read", "write"])));
    assert!(first.id().is_some());
    assert_ne!(first.id(), second.id());

    let parsed = generator.parse(first.as_str(), true).unwrap();
    assert_eq!(parsed.claims().custom.get("role"), Some(&json!("admin")));
}

#[test]
fn test_custom_claim_cannot_use_a_registered_name() {
    let generator = hs256("users", vec![spec("custom", vec![json!("exp"), json!(1)])], fixed_clock());
    assert!(matches!(
        generator.generate_for("uma").unwrap_err(),
        JwtError::Claim(ClaimError::ReservedClaimName { ref name }) if name == "exp"
    ));
}

struct Fixed(ClaimName);

impl Claim for Fixed {
    fn name(&self) -> ClaimName {
        self.0.clone()
    }

    fn value(&self) -> Result<ClaimValue, ClaimError> {
        Ok(ClaimValue::String("override".to_string()))
    }
}

fn generator_with(contributor: ClaimName) -> DefaultGenerator {
    let mut registry = ClaimRegistry::new();
    registry.register("fixed", move |_, _| Ok(Box::new(Fixed(contributor.clone()))));
    let mut context = context(fixed_clock());
    context.registry = Arc::new(registry);
    DefaultGenerator::new(
        generator_config("users", Algorithm::HS256, vec![spec("fixed", vec![])]),
        context,
    )
    .unwrap()
}

#[test]
fn test_generator_owned_claims_are_restricted() {
    for name in [ClaimName::Subject, ClaimName::IssuedAt, ClaimName::ExpiresAt] {
        let wire = name.to_string();
        let err = generator_with(name).generate_for("vic").unwrap_err();
        assert!(matches!(
            err,
            JwtError::Claim(ClaimError::RestrictedClaim { ref claim }) if *claim == wire
        ));
    }
}

#[test]
fn test_hand_built_custom_names_colliding_with_registered_claims_fail() {
    let err = generator_with(ClaimName::Custom("iss".to_string()))
        .generate_for("wes")
        .unwrap_err();
    assert!(matches!(
        err,
        JwtError::Claim(ClaimError::ReservedClaimName { .. })
    ));
}

#[test]
fn test_not_before_strings_are_read_as_rfc3339() {
    let generator = generator_with(ClaimName::NotBefore);
    assert!(matches!(
        generator.generate_for("xena").unwrap_err(),
        JwtError::Claim(ClaimError::InvalidClaim { ref claim }) if claim == "nbf"
    ));
}
