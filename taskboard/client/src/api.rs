//! HTTP access to the task backend.
//!
//! Every backend call goes through [`ApiClient::send`], which attaches the
//! stored bearer token, decodes the JSON answer and turns failures into
//! [`GatewayError`]s with [`normalize_error`].

use crate::auth::{MemoryTokenStore, TokenStore};
use crate::config::ClientConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use taskboard_core::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_token_store(config, Arc::new(MemoryTokenStore::default()))
    }

    pub fn with_token_store(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&config.api_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        tracing::debug!("API client configured for {}", base_url);
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Builds the address of an endpoint below the base URL. Segments are percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        let not_a_base = || GatewayError::Network(format!("{} is not a base URL", self.base_url));
        url.path_segments_mut()
            .map_err(|_| not_a_base())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and decodes a successful JSON answer into `T`.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let body = self.send_raw(request).await?;
        decode(&body)
    }

    /// Like [`ApiClient::send`], but an empty successful answer yields `T::default()`.
    pub(crate) async fn send_or_default<T: DeserializeOwned + Default>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let body = self.send_raw(request).await?;
        if body.trim().is_empty() {
            return Ok(T::default());
        }
        decode(&body)
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<String, GatewayError> {
        let request = match self.tokens.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(transport_error)?;
        tracing::debug!("Backend answered with status {}", status);

        if !status.is_success() {
            let error = normalize_error(status.as_u16(), content_type.as_deref(), &body);
            tracing::warn!("Backend request failed: {}", error);
            return Err(error);
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("Malformed response body: {}", e);
        GatewayError::Validation(format!("Malformed response from server: {}", e))
    })
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL".to_string()));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        return GatewayError::Network("request timed out".to_string());
    }
    GatewayError::Network(error.to_string())
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Maps a non-success answer to a gateway error.
///
/// A JSON body carrying a non-empty `message` and any non-empty plain-text body
/// are shown to the user as validation errors. Anything else only reports the
/// status code.
pub fn normalize_error(status: u16, content_type: Option<&str>, body: &str) -> GatewayError {
    let is_json = content_type.is_some_and(|value| value.contains("application/json"));
    if is_json {
        if let Ok(ErrorBody {
            message: Some(message),
        }) = serde_json::from_str::<ErrorBody>(body)
        {
            if !message.trim().is_empty() {
                return GatewayError::Validation(message);
            }
        }
    } else if !body.trim().is_empty() {
        return GatewayError::Validation(body.trim().to_string());
    }
    GatewayError::Network(format!("request failed with status {}", status))
}
