use crate::extractors::RejectionType;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::Id;

/// Header carrying the acting user's ID, injected by the authenticating
/// gateway in front of this service.
static X_USER_ID: &str = "x-user-id";

pub(crate) struct AuthenticatedUser(pub Id);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    // Authentication itself is an upstream collaborator's job; by the time a
    // request reaches this service the gateway has verified the session and
    // stamped the user's ID on it. Ownership checks against that ID happen
    // in the domain layer on every operation.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(X_USER_ID)
            .and_then(|value| value.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))?;

        let user_id = Id::parse_str(header_value)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))?;

        Ok(AuthenticatedUser(user_id))
    }
}
