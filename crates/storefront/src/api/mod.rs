//! Shop REST API client.
//!
//! Implements the cart engine's backend traits over the shop's REST API
//! with `reqwest`. The bearer token, when configured, rides on every
//! request as a default header.

mod types;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use spindle_core::{Email, RecordId};

use crate::cart::{
    BackendError, CartBackend, CatalogBackend, LineSnapshot, OrderBackend, OrderSnapshot,
    RecordSnapshot,
};
use crate::config::ShopConfig;

use types::{decode_line_snapshot, decode_order_snapshot, error_message};

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ShopApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status}")]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Failed to build the client or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<ShopApiError> for BackendError {
    fn from(error: ShopApiError) -> Self {
        match error {
            ShopApiError::Api { status, message } => Self::Api { status, message },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Client for the shop REST API.
#[derive(Debug, Clone)]
pub struct ShopApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ShopApiClient {
    /// Create a new shop API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the bearer token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &ShopConfig) -> Result<Self, ShopApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let bearer = format!("Bearer {}", token.expose_secret());
            let mut value = HeaderValue::from_str(&bearer)
                .map_err(|e| ShopApiError::Parse(format!("invalid API token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ShopApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ShopApiError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    /// Send a request and decode the body as JSON, mapping failure statuses
    /// to [`ShopApiError::Api`] with the body's message when it has one.
    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, ShopApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ShopApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ShopApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CartBackend for ShopApiClient {
    #[instrument(skip(self), fields(email = %email))]
    async fn load_cart_by_email(&self, email: &Email) -> Result<Value, BackendError> {
        let mut url = self.endpoint("CartDetails/GetCartDetails")?;
        url.query_pairs_mut().append_pair("email", email.as_str());
        Ok(self.send_json(self.client.get(url)).await?)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn increment_line(
        &self,
        email: &Email,
        record_id: RecordId,
        delta: u32,
    ) -> Result<Option<LineSnapshot>, BackendError> {
        let body = self
            .mutate_line("CartDetails/AddToCartDetail", email, record_id, delta)
            .await?;
        Ok(decode_line_snapshot(&body))
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn decrement_line(
        &self,
        email: &Email,
        record_id: RecordId,
        delta: u32,
    ) -> Result<Option<LineSnapshot>, BackendError> {
        let body = self
            .mutate_line("CartDetails/RemoveFromCartDetail", email, record_id, delta)
            .await?;
        Ok(decode_line_snapshot(&body))
    }
}

impl ShopApiClient {
    async fn mutate_line(
        &self,
        path: &str,
        email: &Email,
        record_id: RecordId,
        delta: u32,
    ) -> Result<Value, ShopApiError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("email", email.as_str())
            .append_pair("recordId", &record_id.to_string())
            .append_pair("amount", &delta.to_string());
        self.send_json(self.client.post(url)).await
    }
}

#[async_trait]
impl CatalogBackend for ShopApiClient {
    #[instrument(skip(self))]
    async fn fetch_record(
        &self,
        record_id: RecordId,
    ) -> Result<Option<RecordSnapshot>, BackendError> {
        let url = self.endpoint(&format!("Records/{record_id}"))?;
        match self.send_json(self.client.get(url)).await {
            Ok(Value::Null) => Ok(None),
            Ok(body) => Ok(Some(RecordSnapshot::from_detail(&body))),
            Err(ShopApiError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[async_trait]
impl OrderBackend for ShopApiClient {
    #[instrument(skip(self), fields(email = %email))]
    async fn place_order(
        &self,
        email: &Email,
        payment_method: &str,
    ) -> Result<OrderSnapshot, BackendError> {
        let mut url = self.endpoint("Orders/CreateOrderFromCart")?;
        url.query_pairs_mut()
            .append_pair("email", email.as_str())
            .append_pair("paymentMethod", payment_method);
        let body = self.send_json(self.client.post(url)).await?;
        Ok(decode_order_snapshot(&body))
    }
}
