/// Bearer token authentication
///
/// `jwt_auth_layer` validates the `Authorization: Bearer <token>` header and
/// injects an [`AuthContext`] into the request extensions. Handlers extract
/// it with `Extension<AuthContext>` and pass it to the workflow service as
/// the acting identity.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use taskchain_api::middleware::auth::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.username)
/// }
/// ```

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use taskchain_shared::{auth::jwt, workflow::Identity};
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// The authenticated caller, as carried in the access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Username; task ownership is checked against this
    pub username: String,
}

impl AuthContext {
    /// Creates auth context from validated access token claims
    pub fn from_claims(claims: jwt::Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
        }
    }
}

impl Identity for AuthContext {
    fn id(&self) -> Uuid {
        self.user_id
    }

    fn username(&self) -> &str {
        &self.username
    }
}

/// Extracts the bearer token from an `Authorization` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// JWT authentication middleware layer
///
/// # Errors
///
/// - `401 Unauthorized`: header missing, token invalid, expired, or not an
///   access token
/// - `400 Bad Request`: header present but not a bearer credential
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;
    let auth = AuthContext::from_claims(claims);

    tracing::debug!(user_id = %auth.user_id, username = %auth.username, "Authenticated request");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskchain_shared::auth::jwt::{Claims, TokenType};

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc.def"), None);
    }

    #[test]
    fn test_auth_context_is_an_identity() {
        let user_id = Uuid::new_v4();
        let auth = AuthContext::from_claims(Claims::new(user_id, "alice", TokenType::Access));

        assert_eq!(Identity::id(&auth), user_id);
        assert_eq!(Identity::username(&auth), "alice");
    }
}
