use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    error::ApiError,
    token::{Claims, TokenCodec},
};

/// The authentication scheme expected in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

/// TokenCodecState
///
/// The shared token codec, pulled from the application state via FromRef.
pub type TokenCodecState = Arc<TokenCodec>;

/// RequestIdentity
///
/// The verified claims of the caller, attached to the request extensions by the
/// auth gate. It lives only as long as the request that produced it and is never
/// shared across requests.
///
/// Handlers use it to scope reads: `GET /posts` filters by `subject()`, so the
/// listing is driven by what the token proves rather than by anything the
/// client puts in the request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestIdentity(pub Claims);

impl RequestIdentity {
    /// The verified subject (username) of the caller.
    pub fn subject(&self) -> &str {
        &self.0.sub
    }
}

/// bearer_token
///
/// Pulls the token out of an `Authorization: Bearer <token>` header.
/// Returns `None` when the header is absent, unreadable, uses another scheme,
/// or carries no token after the scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, rest) = value.split_once(char::is_whitespace)?;
    // Auth schemes are case-insensitive (RFC 9110 §11.1).
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = rest.trim_start();
    // Anything after a second whitespace run is not part of the token.
    let token = token.split(char::is_whitespace).next().unwrap_or_default();
    (!token.is_empty()).then_some(token)
}

/// authenticate
///
/// Runs the gate's state machine for one request:
///
/// 1. **NoToken**: no usable `Bearer` header. Ends in `AuthenticationRequired` (401).
/// 2. **TokenPresent**: the token is handed to `TokenCodec::verify`.
/// 3. **Verified**: the claims become the request's `RequestIdentity`.
/// 4. **Rejected**: any verification failure (bad signature, malformed, expired)
///    ends in `AuthenticationInvalid` (403). The specific reason is only logged,
///    never returned to the client.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenCodec) -> Result<RequestIdentity, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| {
        tracing::debug!("request rejected: no bearer token");
        ApiError::AuthenticationRequired
    })?;

    match tokens.verify(token) {
        Ok(claims) => {
            tracing::debug!(subject = %claims.sub, "bearer token verified");
            Ok(RequestIdentity(claims))
        }
        Err(reason) => {
            tracing::debug!(%reason, "request rejected: bearer token failed verification");
            Err(ApiError::AuthenticationInvalid)
        }
    }
}

/// RequestIdentity Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making `RequestIdentity` usable as a
/// function argument in any protected handler. This keeps authentication
/// (gate/extractor) separate from business logic (the handler).
///
/// The process involves:
/// 1. Reuse: if the gate middleware already attached an identity, it is returned
///    as-is and the token is not verified a second time.
/// 2. Fallback: otherwise the same `authenticate` logic runs here and the result is
///    attached, so a handler mounted without the middleware is still protected.
///
/// Rejection: `ApiError::AuthenticationRequired` (401) or
/// `ApiError::AuthenticationInvalid` (403).
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
    TokenCodecState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<RequestIdentity>() {
            return Ok(identity.clone());
        }

        let tokens = TokenCodecState::from_ref(state);
        let identity = authenticate(&parts.headers, &tokens)?;
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}

/// auth_gate
///
/// A middleware function that enforces authentication for the authenticated routes.
///
/// *Mechanism*: on success the identity is attached to the request extensions and
/// `next` runs exactly once. On failure the `ApiError` is returned as the single
/// response for the request, and `next` is never called, so the handler cannot
/// run for an unauthenticated caller.
///
/// *Idempotency*: an identity attached by an earlier stage is trusted and not
/// re-verified, so stacking the gate twice never produces a second response.
pub async fn auth_gate(
    State(tokens): State<TokenCodecState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.extensions().get::<RequestIdentity>().is_none() {
        let identity = authenticate(request.headers(), &tokens)?;
        request.extensions_mut().insert(identity);
    }
    Ok(next.run(request).await)
}
