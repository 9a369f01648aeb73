//! Signing and verification for every supported algorithm

mod common;

use common::*;
use cryypt_jwt_manager::{
    Algorithm, ConfigurationError, GeneratorExt, JwtConfig, JwtError, JwtHeader, JwtManager,
    KeyConfig, KeyMaterial, RawGeneratorConfig, SignerError, Token, TokenClaims,
    TokenValidationError,
};

fn raw_config(algorithm: Algorithm) -> RawGeneratorConfig {
    let key: KeyConfig = match algorithm {
        Algorithm::HS256 | Algorithm::BLAKE2B => HS256_KEY.into(),
        Algorithm::HS384 => HS384_KEY.into(),
        Algorithm::HS512 => HS512_KEY.into(),
        asymmetric => {
            let (signing, verification) = key_pair_files(asymmetric);
            KeyConfig::pair(file_key(signing), file_key(verification))
        }
    };
    RawGeneratorConfig::new()
        .algorithm(algorithm.as_str())
        .key(key)
        .claim("app_name_as_issuer")
        .claim("generator_name_in_audience")
}

/// Replace one character in the middle of the signature segment
fn tamper_signature(token: &str) -> String {
    let (input, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    let middle = chars.len() / 2;
    chars[middle] = if chars[middle] == 'A' { 'B' } else { 'A' };
    format!("{input}.{}", chars.into_iter().collect::<String>())
}

#[tokio::test]
async fn test_every_algorithm_round_trips_through_a_manager() {
    init_tracing();

    let mut config = JwtConfig::new(app());
    for algorithm in Algorithm::ALL {
        config = config.with_generator(algorithm.as_str(), raw_config(algorithm));
    }
    let manager = JwtManager::new(config);

    for algorithm in Algorithm::ALL {
        let generator = manager.get(algorithm.as_str()).await.unwrap();
        assert_eq!(generator.algorithm(), algorithm);

        let token = generator.generate_for("user-1").unwrap();
        assert_eq!(token.header().alg, algorithm.as_str());

        let parsed = generator.parse_valid(token.as_str()).unwrap();
        assert_eq!(parsed.subject(), Some("user-1"), "{algorithm}");
        assert_eq!(parsed.issuer(), Some("acme"));
        assert!(parsed.is_permitted_for(algorithm.as_str()));
    }
}

#[tokio::test]
async fn test_tampered_signature_is_rejected_for_every_algorithm() {
    let mut config = JwtConfig::new(app());
    for algorithm in Algorithm::ALL {
        config = config.with_generator(algorithm.as_str(), raw_config(algorithm));
    }
    let manager = JwtManager::new(config);

    for algorithm in Algorithm::ALL {
        let generator = manager.get(algorithm.as_str()).await.unwrap();
        let token = generator.generate_for(7).unwrap();

        let err = generator
            .parse(&tamper_signature(token.as_str()), true)
            .unwrap_err();
        assert!(
            matches!(
                err,
                JwtError::Validation(TokenValidationError::InvalidSignature)
            ),
            "{algorithm}: {err:?}"
        );
    }
}

#[test]
fn test_signer_round_trip_and_cross_key_rejection() {
    for algorithm in Algorithm::ALL {
        let signer = algorithm.signer(&key_material(algorithm)).unwrap();
        assert_eq!(signer.algorithm(), algorithm);

        let claims = TokenClaims {
            sub: Some("alice".to_string()),
            ..TokenClaims::default()
        };
        let token = Token::sign(JwtHeader::new(algorithm.as_str()), claims, signer.as_ref()).unwrap();

        let decoded = Token::decode(token.as_str()).unwrap();
        assert_eq!(decoded, token);
        assert!(signer
            .verify(decoded.signing_input().as_bytes(), decoded.signature())
            .unwrap());
        assert!(!signer
            .verify(b"some other message", decoded.signature())
            .unwrap());
    }
}

#[test]
fn test_hmac_secrets_below_the_digest_size_are_refused() {
    for (algorithm, minimum) in [
        (Algorithm::HS256, 32),
        (Algorithm::HS384, 48),
        (Algorithm::HS512, 64),
    ] {
        let short = KeyMaterial::symmetric(vec![7u8; minimum - 1]);
        assert!(matches!(
            algorithm.signer(&short),
            Err(SignerError::InvalidKey { .. })
        ));

        let exact = KeyMaterial::symmetric(vec![7u8; minimum]);
        assert!(algorithm.signer(&exact).is_ok());
    }
}

#[test]
fn test_blake2b_key_length_bounds() {
    for (len, ok) in [(31, false), (32, true), (64, true), (65, false)] {
        let keys = KeyMaterial::symmetric(vec![1u8; len]);
        assert_eq!(Algorithm::BLAKE2B.signer(&keys).is_ok(), ok, "{len} bytes");
    }
}

#[test]
fn test_key_shape_must_match_algorithm() {
    let pair = key_material(Algorithm::ES256);
    assert!(matches!(
        Algorithm::HS256.signer(&pair),
        Err(SignerError::InvalidKey { .. })
    ));

    let secret = KeyMaterial::symmetric(HS256_KEY);
    for algorithm in [Algorithm::ES256, Algorithm::RS256, Algorithm::EdDSA] {
        assert!(matches!(
            algorithm.signer(&secret),
            Err(SignerError::InvalidKey { .. })
        ));
    }
}

#[test]
fn test_mismatched_curve_keys_are_refused() {
    let p384 = key_material(Algorithm::ES384);
    assert!(Algorithm::ES256.signer(&p384).is_err());

    let garbage = KeyMaterial::asymmetric(b"not a key".to_vec(), b"not a key".to_vec());
    for algorithm in [
        Algorithm::ES256,
        Algorithm::ES512,
        Algorithm::RS256,
        Algorithm::EdDSA,
    ] {
        assert!(algorithm.signer(&garbage).is_err(), "{algorithm}");
    }
}

#[test]
fn test_ed25519_accepts_raw_key_bytes() {
    // RFC 8032 test vector 1
    let seed = [
        0x9d, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60, 0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec, 0x2c,
        0xc4, 0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19, 0x70, 0x3b, 0xac, 0x03, 0x1c, 0xae,
        0x7f, 0x60,
    ];
    let public = [
        0xd7, 0x5a, 0x98, 0x01, 0x82, 0xb1, 0x0a, 0xb7, 0xd5, 0x4b, 0xfe, 0xd3, 0xc9, 0x64, 0x07,
        0x3a, 0x0e, 0xe1, 0x72, 0xf3, 0xda, 0xa6, 0x23, 0x25, 0xaf, 0x02, 0x1a, 0x68, 0xf7, 0x07,
        0x51, 0x1a,
    ];
    let signer = Algorithm::EdDSA
        .signer(&KeyMaterial::asymmetric(seed.to_vec(), public.to_vec()))
        .unwrap();

    let signature = signer.sign(b"").unwrap();
    assert_eq!(signature.len(), 64);
    assert!(signer.verify(b"", &signature).unwrap());
}

#[test]
fn test_ecdsa_signatures_are_fixed_width() {
    for (algorithm, width) in [
        (Algorithm::ES256, 64),
        (Algorithm::ES384, 96),
        (Algorithm::ES512, 132),
    ] {
        let signer = algorithm.signer(&key_material(algorithm)).unwrap();
        assert_eq!(signer.sign(b"payload").unwrap().len(), width, "{algorithm}");
    }
}

#[test]
fn test_algorithm_identifiers() {
    for algorithm in Algorithm::ALL {
        assert_eq!(algorithm.as_str().parse::<Algorithm>().unwrap(), algorithm);
        assert_eq!(algorithm.to_string(), algorithm.as_str());
    }
    assert!("hs256".parse::<Algorithm>().is_err());
    assert!("none".parse::<Algorithm>().is_err());

    let symmetric: Vec<_> = Algorithm::ALL
        .into_iter()
        .filter(|a| a.is_symmetric())
        .collect();
    assert_eq!(
        symmetric,
        [
            Algorithm::HS256,
            Algorithm::HS384,
            Algorithm::HS512,
            Algorithm::BLAKE2B
        ]
    );
}

#[tokio::test]
async fn test_weak_configured_key_is_a_configuration_error() {
    let config = JwtConfig::new(app()).with_generator(
        "weak",
        RawGeneratorConfig::new().algorithm("HS512").key(HS256_KEY),
    );
    let err = JwtManager::new(config).get("weak").await.unwrap_err();
    assert!(matches!(
        err,
        JwtError::Configuration(ConfigurationError::InvalidKey { ref generator, .. }) if generator == "weak"
    ));
}
