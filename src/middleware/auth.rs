// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::auth::User};

// Guard for every invoice and customer route: HTTP Basic, admin accounts only.
pub async fn admin_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = request
        .headers()
        .typed_get::<Authorization<Basic>>()
        .ok_or(AppError::MissingCredentials)?;

    let user = app_state
        .auth_service
        .authenticate_admin(credentials.username(), credentials.password())
        .await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extractor for the admin that `admin_guard` authenticated.
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::MissingCredentials)
    }
}
