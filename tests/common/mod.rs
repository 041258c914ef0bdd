//! Shared harness for the HTTP tests: an in-process server on a random port
//! backed by `MemoryStore`.

#![allow(dead_code)]

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::Response;
use serde_json::{json, Value};
use std::net::TcpListener;

use storefront::auth::PasswordHasher;
use storefront::configuration::{
    ApplicationSettings, AuthSettings, DatabaseSettings, JwtSettings, Settings,
};
use storefront::domain::{NewUser, Role};
use storefront::startup::run;
use storefront::store::{MemoryStore, UserRepository};

pub const PASSWORD: &str = "SecurePass123";
pub const COOKIE_NAME: &str = "rt";

pub struct TestApp {
    pub address: String,
    pub store: MemoryStore,
    pub client: reqwest::Client,
}

/// A logged-in client session
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Value,
}

fn settings(port: u16) -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "unused".to_string(),
            password: "unused".to_string(),
            port: 5432,
            host: "127.0.0.1".to_string(),
            database_name: "unused".to_string(),
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
        },
        jwt: JwtSettings {
            access_secret: "integration-access-secret-32-characters".to_string(),
            refresh_secret: "integration-refresh-secret-32-characters".to_string(),
            access_token_expiry: 900,
            issuer: "storefront-tests".to_string(),
        },
        auth: AuthSettings::default(),
    }
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let store = MemoryStore::new();

    let server = run(listener, store.clone(), settings(port)).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

/// Value of the refresh cookie set by a response, if any
pub fn refresh_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|h| h.starts_with(&format!("{}=", COOKIE_NAME)))
        .map(|h| h.to_string())
}

/// Cookie value part of a `Set-Cookie` header
pub fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, email: &str, name: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "name": name, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login_raw(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> Session {
        let response = self.login_raw(email, password).await;
        assert_eq!(200, response.status().as_u16());

        let set_cookie = refresh_cookie(&response).expect("login sets the refresh cookie");
        let body: Value = response.json().await.expect("Failed to parse response");

        Session {
            access_token: body["accessToken"].as_str().unwrap().to_string(),
            refresh_token: cookie_value(&set_cookie),
            user: body["user"].clone(),
        }
    }

    /// Register a USER and log in
    pub async fn signed_up(&self, email: &str) -> Session {
        let response = self.register(email, "Test User", PASSWORD).await;
        assert_eq!(201, response.status().as_u16());
        self.login(email, PASSWORD).await
    }

    /// Insert an ADMIN straight into the store and log in
    pub async fn admin(&self, email: &str) -> Session {
        let password_hash = PasswordHasher::new(10).hash(PASSWORD).unwrap();
        self.store
            .create_user(NewUser {
                email: email.to_string(),
                name: "Admin".to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await
            .unwrap();
        self.login(email, PASSWORD).await
    }

    pub async fn refresh(&self, refresh_token: Option<&str>) -> Response {
        let mut request = self.client.post(self.url("/auth/refresh"));
        if let Some(token) = refresh_token {
            request = request.header(COOKIE, format!("{}={}", COOKIE_NAME, token));
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn logout(&self, refresh_token: Option<&str>) -> Response {
        let mut request = self.client.post(self.url("/auth/logout"));
        if let Some(token) = refresh_token {
            request = request.header(COOKIE, format!("{}={}", COOKIE_NAME, token));
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get_authed(&self, path: &str, access_token: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
