//! Administrator login and signup.
//!
//! A successful login stores the returned token in the client's [`TokenStore`];
//! every later request carries it as a bearer token until [`ApiClient::logout`].

use crate::api::ApiClient;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use taskboard_core::GatewayError;
use tokio::sync::RwLock;

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn token(&self) -> Option<String>;
    async fn store(&self, token: String);
    async fn clear(&self);
}

/// Keeps the token for the lifetime of the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn store(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    async fn clear(&self) {
        self.token.write().await.take();
    }
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: AdminUser,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Author,
    Superadmin,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiClient {
    /// Logs in and keeps the session token for subsequent requests.
    #[tracing::instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AdminUser, GatewayError> {
        let url = self.endpoint(&["admin", "login"])?;
        let response: LoginResponse = self.send(self.http().post(url).json(credentials)).await?;
        if response.token.is_empty() {
            return Err(GatewayError::Validation(
                "Login response did not contain a token".to_string(),
            ));
        }

        self.tokens().store(response.token).await;
        tracing::info!("Logged in as {}", response.user.username);
        Ok(response.user)
    }

    #[tracing::instrument(skip(self, request), fields(username = %request.credentials.username))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, GatewayError> {
        let url = self.endpoint(&["admin", "signup"])?;
        self.send_or_default(self.http().post(url).json(request)).await
    }

    pub async fn logout(&self) {
        self.tokens().clear().await;
        tracing::info!("Logged out");
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens().token().await.is_some()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
