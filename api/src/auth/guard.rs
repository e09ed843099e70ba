use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::{
    error::{AppError, AppResult, AuthError},
    AppState,
};

use super::TokenService;

/// Identity of the caller behind a validated bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = authenticate(&parts.headers, &state.tokens)?;
        Ok(AuthUser { user_id })
    }
}

pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<i64, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingCredential)?;
    let claims = tokens.validate(token)?;
    Ok(claims.user_id)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Only the creator of a resource may change it.
pub fn authorize_ownership(resource_owner_id: i64, caller_id: i64) -> AppResult<()> {
    if resource_owner_id == caller_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to perform requested action".to_string(),
        ))
    }
}
