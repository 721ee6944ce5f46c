/// Session Flows
///
/// Register, login, refresh and logout, composed from the password hasher,
/// the token service and the user store. Handlers translate the returned
/// `Session` into cookies and a JSON body; nothing here knows about HTTP.

use std::sync::Arc;

use serde::Deserialize;

use crate::audit::{AuditAction, AuditLog};
use crate::auth::jwt::{TokenPair, TokenService};
use crate::auth::password::{validate_password_strength, PasswordHasher};
use crate::error::{AppError, AuthError, ValidationError};
use crate::store::{User, UserStore, UserView};
use crate::validators::{is_valid_email, is_valid_name, is_valid_username};

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, rename = "confirmPassword", alias = "confirm_password")]
    pub confirm_password: Option<String>,
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Outcome of a successful register, login or refresh
#[derive(Debug, Clone)]
pub struct Session {
    pub tokens: TokenPair,
    pub user: UserView,
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl SessionService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, hasher: PasswordHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Create an account and open its first session
    ///
    /// # Errors
    /// - `Validation`: malformed username, name, email or password
    /// - `Conflict`: username or email already registered
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, AppError> {
        let username = is_valid_username(&request.username)?;
        let name = is_valid_name(&request.name)?;
        let email = is_valid_email(&request.email)?;
        validate_password_strength(&request.password)?;
        if let Some(confirm) = &request.confirm_password {
            if confirm != &request.password {
                return Err(ValidationError::Mismatch("confirmPassword", "password").into());
            }
        }

        if self.users.username_exists(&username).await? {
            AuditLog::failure(AuditAction::Register, "Username already registered").emit();
            return Err(AppError::Conflict(
                "Username is already registered, use another username!".to_string(),
            ));
        }
        if self.users.email_exists(&email).await? {
            AuditLog::failure(AuditAction::Register, "Email already registered").emit();
            return Err(AppError::Conflict(
                "Email is already registered, use another email!".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = User::new(username, email, name, password_hash);
        self.users.insert(&user).await?;

        let session = self.open_session(&user).await?;

        AuditLog::success(AuditAction::Register, "User registered")
            .with_user_id(user.id)
            .emit();

        Ok(session)
    }

    /// Authenticate by username and password, replacing any previous session
    ///
    /// # Errors
    /// - `Validation`: malformed username or password
    /// - `Auth(InvalidUsername)` / `Auth(InvalidPassword)`
    pub async fn login(&self, request: LoginRequest) -> Result<Session, AppError> {
        let username = is_valid_username(&request.username)?;
        validate_password_strength(&request.password)?;

        let user = match self.users.find_by_username(&username).await? {
            Some(user) => user,
            None => {
                AuditLog::failure(AuditAction::Login, "Unknown username").emit();
                return Err(AuthError::InvalidUsername.into());
            }
        };

        if !self.hasher.verify(&request.password, &user.password_hash).await? {
            AuditLog::failure(AuditAction::Login, "Password mismatch")
                .with_user_id(user.id)
                .emit();
            return Err(AuthError::InvalidPassword.into());
        }

        let session = self.open_session(&user).await?;

        AuditLog::success(AuditAction::Login, "User logged in")
            .with_user_id(user.id)
            .emit();

        Ok(session)
    }

    /// Exchange the current refresh token for a new pair
    ///
    /// The presented token must verify cryptographically and be the one on
    /// record for its user; a token replaced by a later login or refresh is
    /// rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError> {
        let claims = match self.tokens.verify_current_refresh(refresh_token).await {
            Ok(claims) => claims,
            Err(e) => {
                AuditLog::failure(AuditAction::Refresh, e.to_string()).emit();
                return Err(e);
            }
        };
        let user_id = claims.user_id()?;

        let user = match self.users.find_by_id(user_id).await? {
            Some(user) => user,
            None => {
                AuditLog::failure(AuditAction::Refresh, "Token subject does not exist")
                    .with_user_id(user_id)
                    .emit();
                return Err(AuthError::UnknownUser.into());
            }
        };

        let session = self.open_session(&user).await?;

        AuditLog::success(AuditAction::Refresh, "Token refreshed")
            .with_user_id(user.id)
            .emit();

        Ok(session)
    }

    /// Drop the session owning `refresh_token`; a no-op if there is none
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let revoked = self.tokens.revoke_refresh(refresh_token).await?;

        let message = if revoked {
            "Session closed"
        } else {
            "No active session for presented token"
        };
        let mut entry = AuditLog::success(AuditAction::Logout, message);
        if let Ok(claims) = self.tokens.verify_refresh(refresh_token) {
            if let Ok(user_id) = claims.user_id() {
                entry = entry.with_user_id(user_id);
            }
        }
        entry.emit();

        Ok(())
    }

    async fn open_session(&self, user: &User) -> Result<Session, AppError> {
        let tokens = self.tokens.issue_pair(user.id)?;
        self.tokens
            .persist_refresh(&tokens.refresh_token, user.id)
            .await?;

        Ok(Session {
            tokens,
            user: user.view(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use crate::store::{InMemoryStore, RefreshTokenStore};

    struct Harness {
        service: SessionService,
        store: Arc<InMemoryStore>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let config = JwtSettings {
            access_secret: "session-test-access-secret-0123456789".to_string(),
            refresh_secret: "session-test-refresh-secret-0123456789".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: 3600,
            issuer: "test".to_string(),
        };
        let tokens = TokenService::new(&config, store.clone());
        let service = SessionService::new(store.clone(), tokens, PasswordHasher::new(4));
        Harness { service, store }
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password: "Password1".to_string(),
            confirm_password: None,
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_opens_session() {
        let h = harness();
        let session = h.service.register(alice()).await.expect("Failed to register");

        assert_eq!(session.user.username, "alice");
        assert_eq!(session.user.email, "a@x.com");
        let user_id = h
            .service
            .tokens
            .verify_access(&session.tokens.access_token)
            .unwrap()
            .user_id()
            .unwrap();
        assert_eq!(user_id.to_string(), session.user.id);
        assert_eq!(h.store.refresh_token_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let h = harness();
        h.service.register(alice()).await.unwrap();

        let user = h.store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "Password1");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts_without_touching_existing_user() {
        let h = harness();
        h.service.register(alice()).await.unwrap();
        let original = h.store.find_by_username("alice").await.unwrap().unwrap();

        let mut duplicate = alice();
        duplicate.email = "other@x.com".to_string();
        duplicate.name = "Impostor".to_string();
        let result = h.service.register(duplicate).await;

        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("Username")),
            other => panic!("Expected conflict, got {:?}", other.map(|s| s.user)),
        }
        let after = h.store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(after.id, original.id);
        assert_eq!(after.name, "Alice");
        assert_eq!(after.password_hash, original.password_hash);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let h = harness();
        h.service.register(alice()).await.unwrap();

        let mut duplicate = alice();
        duplicate.username = "alice2".to_string();
        match h.service.register(duplicate).await {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("Email")),
            other => panic!("Expected conflict, got {:?}", other.map(|s| s.user)),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password_and_mismatched_confirmation() {
        let h = harness();

        let mut weak = alice();
        weak.password = "password".to_string();
        assert!(matches!(h.service.register(weak).await, Err(AppError::Validation(_))));

        let mut mismatch = alice();
        mismatch.confirm_password = Some("Password2".to_string());
        assert!(matches!(
            h.service.register(mismatch).await,
            Err(AppError::Validation(ValidationError::Mismatch(_, _)))
        ));
        assert_eq!(h.store.refresh_token_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_login_failures_are_distinguishable() {
        let h = harness();
        h.service.register(alice()).await.unwrap();

        let unknown = h.service.login(login_request("nobody", "Password1")).await;
        let wrong = h.service.login(login_request("alice", "Password2")).await;

        assert!(matches!(unknown, Err(AppError::Auth(AuthError::InvalidUsername))));
        assert!(matches!(wrong, Err(AppError::Auth(AuthError::InvalidPassword))));
    }

    #[tokio::test]
    async fn test_login_rotates_refresh_token() {
        let h = harness();
        let registered = h.service.register(alice()).await.unwrap();

        let logged_in = h.service.login(login_request("alice", "Password1")).await.unwrap();

        assert_ne!(registered.tokens.refresh_token, logged_in.tokens.refresh_token);
        assert_eq!(h.store.refresh_token_count().unwrap(), 1);
        assert!(h.service.refresh(&logged_in.tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_superseded_token() {
        let h = harness();
        let registered = h.service.register(alice()).await.unwrap();
        h.service.login(login_request("alice", "Password1")).await.unwrap();

        let result = h.service.refresh(&registered.tokens.refresh_token).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::RefreshTokenRevoked))));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair_and_retires_old_one() {
        let h = harness();
        let registered = h.service.register(alice()).await.unwrap();

        let refreshed = h.service.refresh(&registered.tokens.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.username, "alice");
        assert_ne!(refreshed.tokens.refresh_token, registered.tokens.refresh_token);

        // the old token was replaced by the rotation
        assert!(h.service.refresh(&registered.tokens.refresh_token).await.is_err());
        assert!(h.service.refresh(&refreshed.tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let h = harness();
        let session = h.service.register(alice()).await.unwrap();

        let result = h.service.refresh(&session.tokens.access_token).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::TokenInvalid))));
    }

    #[tokio::test]
    async fn test_logout_deletes_record_and_is_idempotent() {
        let h = harness();
        let session = h.service.register(alice()).await.unwrap();
        let user_id = uuid::Uuid::parse_str(&session.user.id).unwrap();

        h.service.logout(&session.tokens.refresh_token).await.unwrap();
        assert!(h.store.find_by_user(user_id).await.unwrap().is_none());

        h.service.logout(&session.tokens.refresh_token).await.unwrap();
        h.service.logout("not-even-a-token").await.unwrap();

        assert!(h.service.refresh(&session.tokens.refresh_token).await.is_err());
    }
}
