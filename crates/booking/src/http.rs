//! HTTP implementation of the hotel gateway.
//!
//! POSTs JSON to the hotel's lock endpoints with a per-attempt timeout and
//! jittered exponential backoff. Retries cover transport failures and the
//! 408/429/5xx class only; a 409 from `hold` is a conflict, not a transient
//! error, and surfaces to the saga as a definitive failure.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::NaiveDate;
use common::{CorrelationId, RequestId, RoomId};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayError, HotelGateway, LockSnapshot, RoomSummary};

/// Header carrying the correlation id across services.
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct HotelGatewayConfig {
    /// Base URL of the hotel service.
    pub base_url: String,

    /// Per-attempt timeout.
    pub timeout: Duration,

    /// Retry attempts for retryable failures.
    pub max_retries: usize,

    /// Initial backoff delay.
    pub initial_backoff: Duration,

    /// Backoff cap.
    pub max_backoff: Duration,
}

impl Default for HotelGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout: Duration::from_millis(5000),
            max_retries: 3,
            initial_backoff: Duration::from_millis(300),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl HotelGatewayConfig {
    /// Creates a config pointing at `base_url` with default budgets.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry count.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[derive(Serialize)]
struct HoldBody<'a> {
    request_id: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    request_id: &'a str,
}

/// Error envelope returned by the hotel service on failure.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP hotel gateway.
pub struct HttpHotelGateway {
    client: Client,
    config: HotelGatewayConfig,
}

impl HttpHotelGateway {
    /// Creates a gateway from the given configuration.
    pub fn new(config: HotelGatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.initial_backoff)
            .with_max_delay(self.config.max_backoff)
            .with_max_times(self.config.max_retries)
            .with_jitter()
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
    }

    async fn classify_failure(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        let message = format!("HTTP {status} - {message}");

        if Self::is_retryable_status(status) {
            GatewayError::Unavailable(message)
        } else if status == StatusCode::NOT_FOUND {
            GatewayError::NotFound(message)
        } else if status == StatusCode::CONFLICT {
            GatewayError::Conflict(message)
        } else {
            GatewayError::Rejected(message)
        }
    }

    async fn post_lock_op<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .client
            .post(&url)
            .header(CORRELATION_HEADER, correlation_id.as_str())
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<LockSnapshot>().await?)
        } else {
            Err(Self::classify_failure(response).await)
        }
    }

    async fn post_with_retry<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        (|| async { self.post_lock_op(path, body, correlation_id).await })
            .retry(self.backoff())
            .when(GatewayError::is_retryable)
            .notify(|err, dur| {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    path,
                    error = %err,
                    retry_in_ms = dur.as_millis() as u64,
                    "hotel call failed, retrying"
                );
            })
            .await
    }
}

#[async_trait]
impl HotelGateway for HttpHotelGateway {
    async fn hold(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        let body = HoldBody {
            request_id: request_id.as_str(),
            start_date,
            end_date,
        };
        self.post_with_retry(&format!("/rooms/{room_id}/hold"), &body, correlation_id)
            .await
    }

    async fn confirm(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        let body = RequestBody {
            request_id: request_id.as_str(),
        };
        self.post_with_retry(&format!("/rooms/{room_id}/confirm"), &body, correlation_id)
            .await
    }

    async fn release(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        let body = RequestBody {
            request_id: request_id.as_str(),
        };
        self.post_with_retry(&format!("/rooms/{room_id}/release"), &body, correlation_id)
            .await
    }

    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, GatewayError> {
        let url = format!("{}/rooms", self.config.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(response.json::<Vec<RoomSummary>>().await?)
        } else {
            Err(Self::classify_failure(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_service_budgets() {
        let config = HotelGatewayConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff, Duration::from_millis(300));
        assert_eq!(config.max_backoff, Duration::from_secs(2));
    }

    #[test]
    fn config_builder_overrides() {
        let config = HotelGatewayConfig::new("http://hotel:3001")
            .with_timeout(Duration::from_secs(1))
            .with_max_retries(5);
        assert_eq!(config.base_url, "http://hotel:3001");
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn retryable_status_classification() {
        assert!(HttpHotelGateway::is_retryable_status(
            StatusCode::REQUEST_TIMEOUT
        ));
        assert!(HttpHotelGateway::is_retryable_status(
            StatusCode::TOO_MANY_REQUESTS
        ));
        assert!(HttpHotelGateway::is_retryable_status(
            StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(HttpHotelGateway::is_retryable_status(
            StatusCode::SERVICE_UNAVAILABLE
        ));
        assert!(HttpHotelGateway::is_retryable_status(
            StatusCode::GATEWAY_TIMEOUT
        ));

        assert!(!HttpHotelGateway::is_retryable_status(
            StatusCode::BAD_REQUEST
        ));
        assert!(!HttpHotelGateway::is_retryable_status(StatusCode::CONFLICT));
        assert!(!HttpHotelGateway::is_retryable_status(StatusCode::NOT_FOUND));
    }
}
