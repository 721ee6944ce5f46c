use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{PasswordHasher, SessionService, TokenService};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::AuthMiddleware;
use crate::routes::{get_current_user, health_check, login, logout, refresh, register};
use crate::store::{RefreshTokenStore, UserStore};

/// Route JSON body failures through the application error boundary
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
}

pub fn run(
    listener: TcpListener,
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    settings: &Settings,
) -> Result<Server, std::io::Error> {
    let tokens = TokenService::new(&settings.jwt, refresh_tokens);
    let hasher = PasswordHasher::new(settings.password.hash_cost);
    let sessions = web::Data::new(SessionService::new(users.clone(), tokens.clone(), hasher));
    let cookie_settings = web::Data::new(settings.cookie.clone());
    let storage_dir = settings.application.storage_dir.clone();

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(sessions.clone())
            .app_data(cookie_settings.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/refresh", web::get().to(refresh))

            // Protected routes (require a valid session)
            .service(
                web::resource("/logout")
                    .wrap(AuthMiddleware::new(tokens.clone(), users.clone()))
                    .route(web::post().to(logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(AuthMiddleware::new(tokens.clone(), users.clone()))
                    .route(web::get().to(get_current_user)),
            )

            // Uploaded images
            .service(fs::Files::new("/storage", storage_dir.clone()))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
