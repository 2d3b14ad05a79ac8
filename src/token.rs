use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claim names owned by the `Claims` fields; they may not appear in `extra`.
pub const REGISTERED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Claims
///
/// The identity facts embedded in an access token. `sub` is always present;
/// `iat` and `exp` are optional registered claims, and any other named claim is
/// carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the username the token was issued to.
    pub sub: String,
    /// Issued At (iat), unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration Time (exp), unix seconds. Tokens without it never expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Claims {
    /// Bare claims carrying only a subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            sub: subject.into(),
            iat: None,
            exp: None,
            extra: BTreeMap::new(),
        }
    }

    /// for_subject
    ///
    /// Builds the claims issued at sign-in: subject, issued-at set to now, and an
    /// expiry `ttl` from now when a lifetime is configured.
    ///
    /// A lifetime too large for a unix timestamp is clamped to the far future, so
    /// the expiry can never wrap around to a moment before `iat`.
    pub fn for_subject(subject: impl Into<String>, ttl: Option<Duration>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            iat: Some(now),
            exp: ttl.map(|ttl| {
                let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                now.saturating_add(secs)
            }),
            ..Self::new(subject)
        }
    }
}

/// TokenError
///
/// Failure modes of issuing or verifying a token. The messages are safe to log:
/// none of them carry the secret, the token, or signature bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("claims have an empty subject")]
    EmptySubject,
    #[error("claim {0:?} is reserved and cannot be set as an extra claim")]
    ReservedClaim(String),
    #[error("token could not be encoded")]
    Encoding,
}

/// TokenCodec
///
/// Issues and verifies HS256-signed compact tokens with a server-held secret.
/// Stateless; a single instance is shared by sign-in and the auth gate.
///
/// Verification happens in two steps:
/// 1. Signature: `jsonwebtoken` checks the HMAC over header and payload and
///    pins the algorithm to HS256, so a foreign-algorithm token is rejected.
/// 2. Expiry: checked here rather than by `jsonwebtoken`, against an explicit
///    clock. A token is expired once `now >= exp` (RFC 7519 §4.1.4), with no
///    leeway.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is optional and enforced in `verify_at`; audiences are not used,
        // so an `aud` extra claim passes through like any other.
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// issue
    ///
    /// Signs `claims` into a token string. Deterministic for identical claims and
    /// secret.
    ///
    /// # Errors
    /// `EmptySubject` for an empty `sub`, `ReservedClaim` when `extra` shadows a
    /// registered claim (the token would not decode back to the same claims).
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        if claims.sub.is_empty() {
            return Err(TokenError::EmptySubject);
        }
        if let Some(name) = REGISTERED_CLAIMS
            .iter()
            .find(|name| claims.extra.contains_key(**name))
        {
            return Err(TokenError::ReservedClaim(name.to_string()));
        }
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|_| TokenError::Encoding)
    }

    /// verify
    ///
    /// Checks the signature and expiry of `token` against the current time and
    /// returns its claims unchanged.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// verify_at
    ///
    /// Same as [`TokenCodec::verify`], with `now` (unix seconds) supplied by the
    /// caller.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Malformed,
                // Signature mismatch, foreign algorithm, or any other rejection.
                _ => TokenError::InvalidSignature,
            })?;

        match claims.exp {
            Some(exp) if now >= exp => Err(TokenError::Expired),
            _ => Ok(claims),
        }
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

/// Convenience wrapper around [`TokenCodec::issue`] for one-off signing.
pub fn issue(claims: &Claims, secret: &[u8]) -> Result<String, TokenError> {
    TokenCodec::new(secret).issue(claims)
}

/// Convenience wrapper around [`TokenCodec::verify`] for one-off verification.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    TokenCodec::new(secret).verify(token)
}
