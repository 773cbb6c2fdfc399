//! Authentication service - registration, login, logout and token checks.
//!
//! Tokens are JWTs whose `jti` is recorded in the access token store at
//! issue time. A token is only accepted while that record exists, which
//! is what lets logout revoke every outstanding session at once.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{password::DUMMY_HASH, NewUser, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    /// Token identifier, matched against the revocation store
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

/// Token issued after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user and issue a first token
    async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> AppResult<(User, TokenResponse)>;

    /// Login and issue a fresh token (existing tokens stay valid)
    async fn login(&self, email: String, password: String) -> AppResult<(User, TokenResponse)>;

    /// Revoke every token of the given user; returns the revoked count.
    /// Calling with no live tokens succeeds with zero.
    async fn logout(&self, user_id: i32) -> AppResult<u64>;

    /// Verify a bearer token: signature, expiry, and revocation status
    async fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    /// Create new auth service instance with Unit of Work
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }

    /// Mint a JWT for the user and record its `jti` in the token store.
    async fn issue_token(&self, user: &User) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.jwt_expiration_hours);
        let jti = Uuid::new_v4();

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            jti,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret_bytes()),
        )?;

        self.uow.tokens().create(jti, user.id).await?;

        Ok(TokenResponse {
            access_token: token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.config.jwt_expiration_hours * SECONDS_PER_HOUR,
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> AppResult<(User, TokenResponse)> {
        // Format and length are validated by the handler's extractor;
        // uniqueness is checked here and enforced again by the store's
        // unique constraint under races.
        if self.uow.users().email_taken(&email, None).await? {
            return Err(AppError::conflict("Email"));
        }

        let password_hash = Password::new(&password)?.into_string();
        let user = self
            .uow
            .users()
            .create(NewUser {
                name,
                email,
                password_hash,
                image: None,
            })
            .await?;

        let token = self.issue_token(&user).await?;
        Ok((user, token))
    }

    async fn login(&self, email: String, password: String) -> AppResult<(User, TokenResponse)> {
        let user_result = self.uow.users().find_by_email(&email).await?;

        // SECURITY: Perform password verification even if user doesn't
        // exist, so a missing email costs the same as a wrong password
        // and the failure is indistinguishable to the caller.
        let (password_hash, user_exists) = match &user_result {
            Some(user) => (user.password_hash.as_str(), true),
            None => (DUMMY_HASH, false),
        };

        let stored_password = Password::from_hash(password_hash.to_string());
        let password_valid = stored_password.verify(&password);

        if !user_exists || !password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // user_exists was checked above
        let user = user_result.ok_or(AppError::InvalidCredentials)?;
        let token = self.issue_token(&user).await?;
        Ok((user, token))
    }

    async fn logout(&self, user_id: i32) -> AppResult<u64> {
        let revoked = self.uow.tokens().revoke_all_for_user(user_id).await?;
        tracing::debug!("Revoked {} token(s) for user {}", revoked, user_id);
        Ok(revoked)
    }

    async fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;
        let claims = token_data.claims;

        // A signed, unexpired token is still dead once logged out
        if !self.uow.tokens().exists(claims.jti).await? {
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }
}
