//! Credential verification service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    repository::CredentialsRepository,
};

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialsRepository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(credentials: CredentialsRepository, config: AuthConfig) -> Self {
        Self { credentials, config }
    }

    /// Seed the configured credential when none exist yet
    pub async fn bootstrap(&self) -> AppResult<bool> {
        let (Some(login), Some(password)) = (&self.config.bootstrap_login, &self.config.bootstrap_password) else {
            return Ok(false);
        };
        if self.credentials.count().await? > 0 {
            return Ok(false);
        }

        let hash = hash_password(password)?;
        self.credentials.upsert(login, &hash).await?;
        tracing::info!(login = %login, "Bootstrap credential created");
        Ok(true)
    }

    /// Check a login/password pair
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<()> {
        let hash = self
            .credentials
            .get_hash(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !verify_password(&hash, password)? {
            tracing::debug!(login = %login, "Rejected login");
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        tracing::debug!(login = %login, "Login accepted");
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
