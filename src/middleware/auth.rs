use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::database::store::StoreError;
use crate::error::ApiError;
use crate::models::token::{validate_token_plaintext, TokenScope};
use crate::models::User;
use crate::state::AppState;
use crate::validation::Validator;

/// The identity bound to a request by the authenticate middleware. A missing
/// credential header is a legitimate anonymous request, not an error.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    Authenticated(User),
}

impl Principal {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }
}

/// Authentication middleware. Resolves the bearer token (if any) to a user
/// and binds the resulting principal to the request for downstream gates
/// and handlers. Applied globally, after rate limiting.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let principal = match request.headers().get(header::AUTHORIZATION).cloned() {
        None => Principal::Anonymous,
        Some(value) => match resolve_bearer(&state, &value).await {
            Ok(user) => Principal::Authenticated(user),
            Err(err) => return with_vary(err.into_response()),
        },
    };

    request.extensions_mut().insert(principal);
    with_vary(next.run(request).await)
}

/// Responses differ by Authorization header, so caches must key on it.
fn with_vary(mut response: Response) -> Response {
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("authorization"));
    response
}

async fn resolve_bearer(state: &AppState, value: &HeaderValue) -> Result<User, ApiError> {
    let raw = value
        .to_str()
        .map_err(|_| ApiError::InvalidAuthenticationToken)?;
    let plaintext = parse_bearer(raw).ok_or(ApiError::InvalidAuthenticationToken)?;

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, plaintext);
    if !v.is_valid() {
        return Err(ApiError::InvalidAuthenticationToken);
    }

    match state
        .models
        .users
        .get_for_token(TokenScope::Authentication, plaintext)
        .await
    {
        Ok(user) => Ok(user),
        // Unknown, wrong-scope and expired tokens are deliberately
        // indistinguishable here.
        Err(StoreError::NotFound) => Err(ApiError::InvalidAuthenticationToken),
        Err(err) => Err(err.into()),
    }
}

/// Split a credential header into its token, requiring exactly the
/// `Bearer <token>` shape.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if scheme != "Bearer" || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Typed gate for handlers that require an authenticated caller. Taking
/// this extractor as a handler argument makes the precondition part of the
/// handler's signature instead of a runtime convention.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match principal(parts) {
            Principal::Anonymous => Err(ApiError::AuthenticationRequired),
            Principal::Authenticated(user) => Ok(AuthenticatedUser(user)),
        }
    }
}

/// Typed gate for handlers that require an authenticated AND activated
/// caller. Composed on top of the authenticated gate, so an anonymous
/// request can never reach the activation check.
#[derive(Debug, Clone)]
pub struct ActivatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for ActivatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.activated {
            return Err(ApiError::InactiveAccount);
        }
        Ok(ActivatedUser(user))
    }
}

/// Read the bound principal. Only legal downstream of the authenticate
/// middleware; a missing principal is a routing bug, not a client error,
/// and aborts loudly rather than silently defaulting to anonymous.
fn principal(parts: &Parts) -> Principal {
    parts
        .extensions
        .get::<Principal>()
        .cloned()
        .expect("missing principal: authenticate middleware not applied to this route")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_bearer_header() {
        assert_eq!(parse_bearer("Bearer abc123"), Some("abc123"));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(parse_bearer("abc123"), None);
        assert_eq!(parse_bearer("Basic abc123"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearer a b"), None);
        assert_eq!(parse_bearer("bearer abc123"), None);
    }

    #[test]
    fn anonymous_principal_is_anonymous() {
        assert!(Principal::Anonymous.is_anonymous());
    }
}
