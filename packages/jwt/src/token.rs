//! Signed token model and compact serialization
//!
//! A token is `base64url(header).base64url(payload).base64url(signature)`.
//! The payload keeps registered claims as typed fields and everything else in
//! a flattened custom map.

use crate::algorithms::utils::{base64_url_decode, base64_url_encode};
use crate::error::{SignerError, TokenFormatError};
use crate::traits::Signer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JWT header structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    /// Signing algorithm identifier
    pub alg: String,
    /// Token type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Key ID hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl JwtHeader {
    /// Header for a freshly signed token
    #[must_use]
    pub fn new(alg: &str) -> Self {
        Self {
            alg: alg.to_string(),
            typ: Some("JWT".to_string()),
            kid: None,
        }
    }
}

/// Registered and custom claims carried by a token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Permitted audiences; a single audience is written as a bare string
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "audience")]
    pub aud: Vec<String>,
    /// Expiry
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub exp: Option<DateTime<Utc>>,
    /// Not before
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub nbf: Option<DateTime<Utc>>,
    /// Issued at
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub iat: Option<DateTime<Utc>>,
    /// Token identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Non-registered claims
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

/// A signed token: decoded parts plus the exact compact string
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    header: JwtHeader,
    claims: TokenClaims,
    signature: Vec<u8>,
    encoded: String,
}

impl Token {
    /// Serialize and sign a header/claims pair.
    ///
    /// # Errors
    /// Returns `SignerError` if serialization or the signing primitive fails.
    pub fn sign(
        header: JwtHeader,
        claims: TokenClaims,
        signer: &dyn Signer,
    ) -> Result<Self, SignerError> {
        let header_b64 = base64_url_encode(&serde_json::to_vec(&header)?);
        let payload_b64 = base64_url_encode(&serde_json::to_vec(&claims)?);

        let mut encoded = String::with_capacity(header_b64.len() + payload_b64.len() + 88);
        encoded.push_str(&header_b64);
        encoded.push('.');
        encoded.push_str(&payload_b64);

        let signature = signer.sign(encoded.as_bytes())?;
        encoded.push('.');
        encoded.push_str(&base64_url_encode(&signature));

        Ok(Self {
            header,
            claims,
            signature,
            encoded,
        })
    }

    /// Decode a compact token string without checking its signature.
    ///
    /// # Errors
    /// Returns `TokenFormatError` when the string is empty, does not have
    /// three segments, or a segment is not valid base64url/JSON.
    pub fn decode(token: &str) -> Result<Self, TokenFormatError> {
        if token.is_empty() {
            return Err(TokenFormatError::Empty);
        }

        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenFormatError::malformed(
                "the token must have exactly three dot-separated segments",
            ));
        };

        if header_b64.is_empty() || payload_b64.is_empty() {
            return Err(TokenFormatError::malformed(
                "the header and payload segments cannot be empty",
            ));
        }

        let header_bytes = base64_url_decode(header_b64)
            .map_err(|source| TokenFormatError::Encoding { part: "header", source })?;
        let header: JwtHeader = serde_json::from_slice(&header_bytes)
            .map_err(|source| TokenFormatError::Json { part: "header", source })?;

        let payload_bytes = base64_url_decode(payload_b64)
            .map_err(|source| TokenFormatError::Encoding { part: "payload", source })?;
        let claims: TokenClaims = serde_json::from_slice(&payload_bytes)
            .map_err(|source| TokenFormatError::Json { part: "payload", source })?;

        let signature = base64_url_decode(signature_b64).map_err(|source| {
            TokenFormatError::Encoding {
                part: "signature",
                source,
            }
        })?;

        Ok(Self {
            header,
            claims,
            signature,
            encoded: token.to_string(),
        })
    }

    /// The compact token string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// The `header.payload` portion the signature covers
    #[must_use]
    pub fn signing_input(&self) -> &str {
        self.encoded
            .rsplit_once('.')
            .map_or(self.encoded.as_str(), |(input, _)| input)
    }

    /// Decoded header
    #[inline]
    #[must_use]
    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    /// Decoded claims
    #[inline]
    #[must_use]
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// Raw signature bytes
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Subject claim
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.sub.as_deref()
    }

    /// Issuer claim
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.claims.iss.as_deref()
    }

    /// Permitted audiences
    #[must_use]
    pub fn audiences(&self) -> &[String] {
        &self.claims.aud
    }

    /// Issued-at claim
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.claims.iat
    }

    /// Expiry claim
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.exp
    }

    /// Not-before claim
    #[must_use]
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.claims.nbf
    }

    /// Token identifier claim
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.claims.jti.as_deref()
    }

    /// Look up any claim by its wire name as a JSON value
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<Value> {
        let c = &self.claims;
        match name {
            "sub" => c.sub.clone().map(Value::String),
            "iss" => c.iss.clone().map(Value::String),
            "jti" => c.jti.clone().map(Value::String),
            "aud" if c.aud.is_empty() => None,
            "aud" => Some(Value::Array(
                c.aud.iter().cloned().map(Value::String).collect(),
            )),
            "exp" => c.exp.map(|t| Value::from(t.timestamp())),
            "nbf" => c.nbf.map(|t| Value::from(t.timestamp())),
            "iat" => c.iat.map(|t| Value::from(t.timestamp())),
            other => c.custom.get(other).cloned(),
        }
    }

    /// Expired when `now` is at or past the expiry claim
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.claims.exp.is_some_and(|exp| now >= exp)
    }

    /// True unless the issued-at claim lies after `now`
    #[must_use]
    pub fn has_been_issued_before(&self, now: DateTime<Utc>) -> bool {
        self.claims.iat.is_none_or(|iat| now >= iat)
    }

    /// True unless `now` is before the not-before claim
    #[must_use]
    pub fn is_minimum_time_before(&self, now: DateTime<Utc>) -> bool {
        self.claims.nbf.is_none_or(|nbf| now >= nbf)
    }

    /// Whether `audience` is among the permitted audiences
    #[must_use]
    pub fn is_permitted_for(&self, audience: &str) -> bool {
        self.claims.aud.iter().any(|aud| aud == audience)
    }

    /// Whether the issuer claim equals `issuer`
    #[must_use]
    pub fn has_been_issued_by(&self, issuer: &str) -> bool {
        self.claims.iss.as_deref() == Some(issuer)
    }

    /// Whether the subject claim equals `subject`
    #[must_use]
    pub fn is_related_to(&self, subject: &str) -> bool {
        self.claims.sub.as_deref() == Some(subject)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}

/// NumericDate: integer seconds on output; integers, floats or numeric
/// strings accepted on input
mod numeric_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub(super) fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_i64(date.timestamp()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(raw) = Option::<Raw>::deserialize(deserializer)? else {
            return Ok(None);
        };

        let seconds = match raw {
            Raw::Int(seconds) => return from_seconds(seconds, 0).map(Some),
            Raw::Float(seconds) => seconds,
            Raw::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("invalid NumericDate \"{text}\"")))?,
        };

        if !seconds.is_finite() {
            return Err(D::Error::custom("NumericDate must be finite"));
        }

        // Sub-second precision survives decoding but is dropped on re-encode
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1_000_000_000.0) as u32;
        from_seconds(whole as i64, nanos.min(999_999_999)).map(Some)
    }

    fn from_seconds<E: serde::de::Error>(seconds: i64, nanos: u32) -> Result<DateTime<Utc>, E> {
        DateTime::from_timestamp(seconds, nanos)
            .ok_or_else(|| E::custom(format!("NumericDate {seconds} is out of range")))
    }
}

/// `aud` may be a single string or an array of strings
mod audience {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub(super) fn serialize<S: Serializer>(
        value: &[String],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            Some(OneOrMany::One(single)) => vec![single],
            Some(OneOrMany::Many(many)) => many,
            None => Vec::new(),
        })
    }
}
