/// Session Routes
///
/// Register, login, refresh and logout over HTTP. Tokens travel as HTTP-only
/// `accessToken` / `refreshToken` cookies; bodies carry the redacted user.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::Serialize;

use crate::auth::{
    LoginRequest, RegisterRequest, Session, SessionIdentity, SessionService, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use crate::configuration::CookieSettings;
use crate::error::{AppError, AuthError};
use crate::logger::RequestId;
use crate::store::UserView;

/// Body of every session response
#[derive(Serialize)]
pub struct AuthResponse {
    pub user: Option<UserView>,
    pub auth: bool,
}

fn session_cookie(
    name: &'static str,
    value: String,
    settings: &CookieSettings,
) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .max_age(CookieDuration::seconds(settings.max_age_seconds))
        .finish()
}

fn removal_cookie(name: &'static str, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .max_age(CookieDuration::ZERO)
        .finish()
}

fn session_response(
    mut builder: HttpResponseBuilder,
    session: Session,
    settings: &CookieSettings,
) -> HttpResponse {
    builder
        .cookie(session_cookie(ACCESS_TOKEN_COOKIE, session.tokens.access_token, settings))
        .cookie(session_cookie(REFRESH_TOKEN_COOKIE, session.tokens.refresh_token, settings))
        .json(AuthResponse {
            user: Some(session.user),
            auth: true,
        })
}

fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// POST /register
///
/// # Errors
/// - 400: malformed username, name, email or password
/// - 409: username or email already registered
pub async fn register(
    req: HttpRequest,
    body: web::Json<RegisterRequest>,
    sessions: web::Data<SessionService>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let session = sessions.register(body.into_inner()).await?;

    tracing::info!(
        request_id = %request_id(&req),
        user_id = %session.user.id,
        "User registered successfully"
    );

    Ok(session_response(HttpResponse::Created(), session, &cookies))
}

/// POST /login
///
/// # Errors
/// - 400: malformed username or password
/// - 401: "Invalid Username" or "Invalid Password"
pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    sessions: web::Data<SessionService>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let session = sessions.login(body.into_inner()).await?;

    tracing::info!(
        request_id = %request_id(&req),
        user_id = %session.user.id,
        "User logged in successfully"
    );

    Ok(session_response(HttpResponse::Ok(), session, &cookies))
}

/// GET /refresh
///
/// Rotates the session: the `refreshToken` cookie must be the user's current
/// refresh token. A token superseded by a later login or refresh gets a 401.
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let session = sessions.refresh(&refresh_token).await?;

    tracing::info!(
        request_id = %request_id(&req),
        user_id = %session.user.id,
        "Token refreshed successfully"
    );

    Ok(session_response(HttpResponse::Ok(), session, &cookies))
}

/// POST /logout
///
/// **Requires a valid session** (enforced by `AuthMiddleware`). Deletes the
/// stored refresh token and clears both cookies.
pub async fn logout(
    req: HttpRequest,
    identity: web::ReqData<SessionIdentity>,
    sessions: web::Data<SessionService>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    if let Some(cookie) = req.cookie(REFRESH_TOKEN_COOKIE) {
        sessions.logout(cookie.value()).await?;
    }

    tracing::info!(
        request_id = %request_id(&req),
        user_id = %identity.user_id,
        "User logged out"
    );

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE, &cookies))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE, &cookies))
        .json(AuthResponse {
            user: None,
            auth: false,
        }))
}

/// GET /me
///
/// **Requires a valid session.** Returns the caller's redacted profile.
pub async fn get_current_user(
    identity: web::ReqData<SessionIdentity>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let user = sessions
        .users()
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    Ok(HttpResponse::Ok().json(user.view()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let settings = CookieSettings::default();
        let cookie = session_cookie(ACCESS_TOKEN_COOKIE, "token".to_string(), &settings);

        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(86400)));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(REFRESH_TOKEN_COOKIE, &CookieSettings::default());

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }
}
