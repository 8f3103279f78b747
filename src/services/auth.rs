// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::UserStore,
    models::auth::{CreateUserPayload, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(user_store: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { user_store, bcrypt_cost }
    }

    /// Demo-only bootstrap: creates a user with the admin flag set.
    pub async fn create_admin(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        // Hashing is CPU bound, keep it off the async workers.
        let password = payload.password;
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Hashing task failed: {}", e))??;

        let user = self
            .user_store
            .create_user(&payload.username, &password_hash, true)
            .await?;

        tracing::info!("Admin user '{}' created", user.username);
        Ok(user)
    }

    /// Succeeds only for an existing admin whose password verifies.
    /// Unknown users, wrong passwords and non-admins are indistinguishable to the caller.
    pub async fn authenticate_admin(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .user_store
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_owned();
        let password_hash = user.password_hash.clone();

        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))?
            .unwrap_or(false);

        if !is_password_valid || !user.is_admin {
            tracing::warn!("Rejected credentials for user '{}'", username);
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}
