/// Token Service
///
/// Issues and verifies HS256 access and refresh tokens and keeps the
/// refresh token store in step with what was issued. Built per application
/// from `JwtSettings`, so tests can run with their own secrets.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::refresh_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::RefreshTokenStore;

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    access_keys: SigningKeys,
    refresh_keys: SigningKeys,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    issuer: String,
    store: Arc<dyn RefreshTokenStore>,
}

impl TokenService {
    pub fn new(config: &JwtSettings, store: Arc<dyn RefreshTokenStore>) -> Self {
        Self {
            access_keys: SigningKeys::from_secret(&config.access_secret),
            refresh_keys: SigningKeys::from_secret(&config.refresh_secret),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
            store,
        }
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<String, AppError> {
        self.sign(user_id, self.access_token_expiry, &self.access_keys)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, AppError> {
        self.sign(user_id, self.refresh_token_expiry, &self.refresh_keys)
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access(user_id)?,
            refresh_token: self.issue_refresh(user_id)?,
        })
    }

    /// Check signature, issuer and expiry of an access token
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, &self.access_keys)
    }

    /// Check signature, issuer and expiry of a refresh token
    ///
    /// This does not consult the store; see [`TokenService::verify_current_refresh`].
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, &self.refresh_keys)
    }

    /// Record `token` as the only valid refresh token of `user_id`
    ///
    /// Any refresh token issued to the user before this call stops verifying
    /// against the store, even though its signature is still good.
    pub async fn persist_refresh(&self, token: &str, user_id: Uuid) -> Result<(), AppError> {
        self.store
            .upsert(&refresh_token::record_for(user_id, token))
            .await
    }

    /// `verify_refresh` plus an exact match against the stored record
    pub async fn verify_current_refresh(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.verify_refresh(token)?;
        let user_id = claims.user_id()?;

        match self.store.find_by_user(user_id).await? {
            Some(record) if refresh_token::matches(&record, token) => Ok(claims),
            Some(_) => {
                tracing::warn!(user_id = %user_id, "Superseded refresh token presented");
                Err(AuthError::RefreshTokenRevoked.into())
            }
            None => {
                tracing::warn!(
                    user_id = %user_id,
                    "Refresh token presented without active session"
                );
                Err(AuthError::RefreshTokenRevoked.into())
            }
        }
    }

    /// Delete the stored record for `token`, if any
    ///
    /// Returns whether a record was removed. Removing nothing is not an error.
    pub async fn revoke_refresh(&self, token: &str) -> Result<bool, AppError> {
        let deleted = self
            .store
            .delete_by_token_hash(&refresh_token::hash_token(token))
            .await?;
        Ok(deleted > 0)
    }

    /// Whether `user_id` still holds a stored refresh record
    ///
    /// Logout deletes the record, which ends every session of the user even
    /// while an access token issued earlier is still unexpired.
    pub async fn has_active_session(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.store.find_by_user(user_id).await?.is_some())
    }

    fn sign(&self, user_id: Uuid, expiry: i64, keys: &SigningKeys) -> Result<String, AppError> {
        let claims = Claims::new(user_id, expiry, self.issuer.clone());

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    fn verify(&self, token: &str, keys: &SigningKeys) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        decode::<Claims>(token, &keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!("JWT validation error: {}", e);
                    AuthError::TokenInvalid
                }
            })
    }
}
