//! Error taxonomy for generator resolution, claim composition and token parsing
//!
//! Every failure is surfaced as a typed variant carrying the generator, claim
//! and expected/found values needed to act on it. Nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

/// JWT operation result type
pub type JwtResult<T> = Result<T, JwtError>;

/// Top-level error returned by the public API
#[derive(Debug, Error)]
pub enum JwtError {
    /// A generator could not be resolved from configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Claims could not be composed during issuance
    #[error(transparent)]
    Claim(#[from] ClaimError),
    /// A token string could not be decoded
    #[error(transparent)]
    Format(#[from] TokenFormatError),
    /// A decoded token failed validation
    #[error(transparent)]
    Validation(#[from] TokenValidationError),
    /// The signer rejected its key material or failed to sign
    #[error(transparent)]
    Signer(#[from] SignerError),
}

/// Raised while resolving a named generator; fatal to that `resolve` call
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No configuration entry exists for the requested name
    #[error("no JWT generator is configured with the name \"{name}\"")]
    UnknownGenerator {
        /// Requested generator name
        name: String,
    },
    /// The configured algorithm identifier is not supported
    #[error("invalid algorithm \"{algorithm}\" for JWT generator \"{generator}\"")]
    UnknownAlgorithm {
        /// Generator name
        generator: String,
        /// Offending identifier
        algorithm: String,
    },
    /// The symmetric key is missing or unusable
    #[error("invalid key for JWT generator \"{generator}\": {reason}")]
    InvalidKey {
        /// Generator name
        generator: String,
        /// Why the key was rejected
        reason: String,
    },
    /// An asymmetric algorithm was configured without a signing/verification pair
    #[error("invalid signing/verification key pair for JWT generator \"{generator}\"")]
    InvalidKeyPair {
        /// Generator name
        generator: String,
    },
    /// A `file:` key could not be read
    #[error("cannot read key file {path:?} for JWT generator \"{generator}\"")]
    KeyFile {
        /// Generator name
        generator: String,
        /// Referenced key path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// The expiry is neither whole seconds nor a duration expression
    #[error("invalid expiry \"{value}\" for JWT generator \"{generator}\"")]
    InvalidExpiry {
        /// Generator name
        generator: String,
        /// Offending value
        value: String,
    },
    /// A configured claim contributor cannot be constructed
    #[error("invalid claims for JWT generator \"{generator}\"")]
    InvalidClaims {
        /// Generator name
        generator: String,
        /// Contributor failure
        #[source]
        source: ClaimError,
    },
    /// The configured driver has no registered implementation
    #[error("driver \"{driver}\" for JWT generator \"{generator}\" is not supported")]
    UnsupportedDriver {
        /// Generator name
        generator: String,
        /// Driver name
        driver: String,
    },
    /// A driver produced a generator that does not honour the generator contract
    #[error("driver \"{driver}\" returned an invalid generator for \"{generator}\": {reason}")]
    InvalidDriverResult {
        /// Generator name
        generator: String,
        /// Driver name
        driver: String,
        /// Contract violation
        reason: String,
    },
    /// Configuration text could not be deserialized
    #[error("invalid JWT configuration: {0}")]
    Parse(String),
}

/// Raised while composing claims during `generate`; fatal to that issuance
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The subject converted to an empty string
    #[error("the JWT subject must be a non-empty string")]
    InvalidSubject,
    /// An audience entry was empty or not convertible to a string
    #[error(
        "the JWT audience for generator \"{generator}\" must be a non-empty string or a list of non-empty strings"
    )]
    InvalidAudience {
        /// Generator name
        generator: String,
    },
    /// A contributor tried to set a claim the generator owns
    #[error("the JWT claim \"{claim}\" is restricted")]
    RestrictedClaim {
        /// Claim name
        claim: String,
    },
    /// A registered claim value converted to an empty or unusable value
    #[error("the JWT claim \"{claim}\" must be a non-empty string or be convertible to one")]
    InvalidClaim {
        /// Claim name
        claim: String,
    },
    /// A contributor's value was read before its injected state was supplied
    #[error("the JWT claim \"{claim}\" was read before its {missing} was provided")]
    UninitializedClaim {
        /// Claim name
        claim: String,
        /// Name of the missing injected value
        missing: &'static str,
    },
    /// No contributor is registered under this identifier
    #[error("the JWT claim contributor \"{identifier}\" cannot be resolved")]
    UnresolvableClaim {
        /// Contributor identifier
        identifier: String,
    },
    /// The contributor exists but its constructor parameters are wrong
    #[error("invalid parameters for JWT claim contributor \"{identifier}\": {reason}")]
    InvalidClaimParameters {
        /// Contributor identifier
        identifier: String,
        /// What was wrong
        reason: String,
    },
    /// A custom claim reused a registered claim name
    #[error("the custom JWT claim name \"{name}\" collides with a registered claim")]
    ReservedClaimName {
        /// Colliding name
        name: String,
    },
    /// A duration expression could not be parsed
    #[error("invalid interval expression \"{expression}\"")]
    InvalidInterval {
        /// Offending expression
        expression: String,
    },
}

/// Raised when a token string cannot be decoded into its parts
#[derive(Debug, Error)]
pub enum TokenFormatError {
    /// The input was empty
    #[error("the JWT token must be a non-empty string")]
    Empty,
    /// The input does not have the compact three-segment shape
    #[error("the JWT token provided is invalid: {reason}")]
    Malformed {
        /// Structural problem
        reason: String,
    },
    /// A segment is not valid base64url
    #[error("the JWT token {part} is not valid base64url")]
    Encoding {
        /// Segment name
        part: &'static str,
        /// Decoder failure
        #[source]
        source: base64::DecodeError,
    },
    /// A segment is not the expected JSON document
    #[error("the JWT token {part} is not valid JSON")]
    Json {
        /// Segment name
        part: &'static str,
        /// Deserializer failure
        #[source]
        source: serde_json::Error,
    },
}

/// Raised when a decoded token fails validation during `parse`
#[derive(Debug, Error)]
pub enum TokenValidationError {
    /// The signature does not match the configured key
    #[error("the JWT token signature is invalid")]
    InvalidSignature,
    /// The header names a different algorithm than the generator uses
    #[error("the JWT token was signed with {found}, expected {expected}")]
    AlgorithmMismatch {
        /// Generator algorithm
        expected: String,
        /// Header algorithm
        found: String,
    },
    /// The expiry claim is at or before now
    #[error("the JWT token provided has expired")]
    Expired {
        /// Expiry claim value
        expired_at: chrono::DateTime<chrono::Utc>,
    },
    /// Issued in the future, or before its not-before claim
    #[error("the JWT token is not yet valid")]
    NotYetValid,
    /// The issuer does not match configuration
    #[error("the JWT token was not issued by \"{expected}\"")]
    InvalidIssuer {
        /// Configured issuer
        expected: String,
        /// Token issuer, if any
        found: Option<String>,
    },
    /// None of the configured audiences are permitted by the token
    #[error("the JWT token was not intended for the audience(s) \"{}\"", .expected.join("\", \""))]
    InvalidAudience {
        /// Configured audiences
        expected: Vec<String>,
    },
}

/// Raised by signer construction, signing or serialization
#[derive(Debug, Error)]
pub enum SignerError {
    /// Key bytes are malformed or too weak for the algorithm
    #[error("invalid {algorithm} key: {reason}")]
    InvalidKey {
        /// Algorithm identifier
        algorithm: &'static str,
        /// Why the key was rejected
        reason: String,
    },
    /// Header or payload could not be serialized
    #[error("cannot serialize JWT token: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The primitive failed to produce a signature
    #[error("{algorithm} signing failed: {reason}")]
    Signing {
        /// Algorithm identifier
        algorithm: &'static str,
        /// Primitive failure
        reason: String,
    },
}

impl SignerError {
    /// Create an invalid key error
    #[inline]
    #[must_use]
    pub fn invalid_key(algorithm: &'static str, reason: impl Into<String>) -> Self {
        SignerError::InvalidKey {
            algorithm,
            reason: reason.into(),
        }
    }
}

impl ClaimError {
    /// Create an invalid parameters error for a contributor
    #[inline]
    #[must_use]
    pub fn invalid_parameters(identifier: &str, reason: impl Into<String>) -> Self {
        ClaimError::InvalidClaimParameters {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }
}

impl TokenFormatError {
    /// Create a malformed token error
    #[inline]
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        TokenFormatError::Malformed {
            reason: reason.into(),
        }
    }
}
