use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::storage::{NewUser, User, UserRepository};

/// Default token lifetime: one hour
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User id
    pub id: i64,
    pub email: String,
    /// Expiration (seconds since the epoch)
    pub exp: usize,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, secret: &str, token_ttl: Duration) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Register a password account
    pub async fn register(&self, email: Option<String>, password: Option<String>) -> AppResult<User> {
        let (email, password) = Self::credentials(email, password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest("Email already in use".to_string()));
        }

        let password_hash = tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash: Some(password_hash),
                google_id: None,
            })
            .await?;
        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a token
    pub async fn login(&self, email: Option<String>, password: Option<String>) -> AppResult<String> {
        let (email, password) = Self::credentials(email, password)?;
        let invalid = || AppError::Unauthenticated("Invalid email or password".to_string());

        let user = self.users.find_by_email(&email).await?.ok_or_else(invalid)?;
        let hash = user.password_hash.clone().ok_or_else(invalid)?;

        let verified = tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?;
        if !verified {
            tracing::debug!(user_id = user.id, "Rejected login");
            return Err(invalid());
        }

        self.issue_token(&user)
    }

    /// Create a signed HS256 token for the user
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let exp = Utc::now().timestamp().max(0) as usize + self.token_ttl.as_secs() as usize;
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token creation failed: {}", e)))
    }

    /// Validate a token and return its claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthenticated("Invalid Token".to_string()))
    }

    /// Hash a password using Argon2
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Hashing error: {}", e)))
    }

    /// Verify password against hash
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    // E-mails are matched case-insensitively.
    fn credentials(email: Option<String>, password: Option<String>) -> AppResult<(String, String)> {
        let email = email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let password = password.filter(|p| !p.is_empty());

        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(AppError::BadRequest(
                "Email and password are required".to_string(),
            )),
        }
    }
}
