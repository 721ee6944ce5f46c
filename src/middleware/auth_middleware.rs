/// Authentication Middleware
///
/// Gates protected routes on the session cookies. Both the access and the
/// refresh cookie must be present; only the access token is verified here.
/// The user must still exist and hold a stored refresh record, so a logout
/// ends the session for every copy of its cookies. On success the caller's `SessionIdentity` is injected into the request
/// extensions. On failure the request never reaches the handler and the
/// error boundary renders a 401.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{SessionIdentity, TokenService, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::error::{AppError, AuthError};
use crate::store::UserStore;

pub struct AuthMiddleware {
    tokens: TokenService,
    users: Arc<dyn UserStore>,
}

impl AuthMiddleware {
    pub fn new(tokens: TokenService, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            users: self.users.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    tokens: TokenService,
    users: Arc<dyn UserStore>,
}

/// Non-empty value of cookie `name`, if sent
fn cookie_value(req: &ServiceRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

async fn authenticate(
    access_token: Option<String>,
    refresh_present: bool,
    tokens: &TokenService,
    users: &dyn UserStore,
) -> Result<SessionIdentity, AppError> {
    let access_token = match access_token {
        Some(token) if refresh_present => token,
        _ => return Err(AuthError::MissingToken.into()),
    };

    let claims = tokens.verify_access(&access_token)?;
    let user_id = claims.user_id()?;

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    if !tokens.has_active_session(user.id).await? {
        return Err(AuthError::RefreshTokenRevoked.into());
    }

    Ok(SessionIdentity::new(user.id))
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let access_token = cookie_value(&req, ACCESS_TOKEN_COOKIE);
        let refresh_present = cookie_value(&req, REFRESH_TOKEN_COOKIE).is_some();

        let service = self.service.clone();
        let tokens = self.tokens.clone();
        let users = self.users.clone();

        Box::pin(async move {
            match authenticate(access_token, refresh_present, &tokens, users.as_ref()).await {
                Ok(identity) => {
                    tracing::debug!(
                        user_id = %identity.user_id,
                        path = %req.path(),
                        "Session validated"
                    );
                    req.extensions_mut().insert(identity);
                    service.call(req).await
                }
                Err(e) => {
                    tracing::warn!(path = %req.path(), error = %e, "Request authentication failed");
                    Err(e.into())
                }
            }
        })
    }
}
