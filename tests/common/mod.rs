#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use blog_session::configuration::{
    ApplicationSettings, CookieSettings, DatabaseSettings, JwtSettings, PasswordSettings, Settings,
};
use blog_session::startup::run;
use blog_session::store::InMemoryStore;

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryStore>,
}

pub fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "127.0.0.1".to_string(),
            database_name: "blog_session".to_string(),
            max_connections: 1,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            storage_dir: "./storage".to_string(),
        },
        jwt: JwtSettings {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: 3600,
            issuer: "blog_session".to_string(),
        },
        cookie: CookieSettings::default(),
        password: PasswordSettings { hash_cost: 4 },
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryStore::new());
    let server = run(listener, store.clone(), store.clone(), &test_settings())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, store }
}

/// Client that keeps cookies between requests, like a browser would
pub fn session_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}
