/// Authentication module
///
/// Password hashing, token issuance/verification, refresh token
/// persistence and the session flows built on top of them.

mod claims;
mod identity;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::Claims;
pub use identity::SessionIdentity;
pub use jwt::{TokenPair, TokenService};
pub use password::{validate_password_strength, PasswordHasher};
pub use session::{LoginRequest, RegisterRequest, Session, SessionService};

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
