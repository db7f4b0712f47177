//! Retrying SBI client.
//!
//! Wraps `reqwest` with the crate's outbound policy: 10-second request
//! deadline, a configurable retry budget with exponential backoff
//! (200 ms doubling per attempt, 20% jitter), correlation-id propagation, and mapping of
//! problem+json error bodies back onto [`Error`].

use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::sbi::problem::ProblemDetails;
use crate::sbi::CORRELATION_HEADER;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
const BACKOFF_BASE: Duration = Duration::from_millis(200);

#[derive(Clone)]
pub struct SbiClient {
    http: reqwest::Client,
    retries: u32,
}

impl SbiClient {
    /// Client with the default 3-attempt retry budget.
    pub fn new() -> Self {
        SbiClient::with_retries(3)
    }

    /// Client retrying `retries` times after the first attempt. Zero means
    /// one attempt only (NRF heartbeats use this; the next tick is the
    /// retry).
    pub fn with_retries(retries: u32) -> Self {
        SbiClient {
            http: reqwest::Client::builder()
                .timeout(CLIENT_TIMEOUT)
                .build()
                .expect("reqwest client construction cannot fail with static options"),
            retries,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .execute(|| self.http.get(url).header(CORRELATION_HEADER, correlation_id()))
            .await?;
        decode(resp).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let resp = self
            .execute(|| {
                self.http
                    .post(url)
                    .header(CORRELATION_HEADER, correlation_id())
                    .json(body)
            })
            .await?;
        decode(resp).await
    }

    /// POST where the caller only cares about success.
    pub async fn post_no_content<B: Serialize>(&self, url: &str, body: &B) -> Result<()> {
        let resp = self
            .execute(|| {
                self.http
                    .post(url)
                    .header(CORRELATION_HEADER, correlation_id())
                    .json(body)
            })
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let resp = self
            .execute(|| {
                self.http
                    .put(url)
                    .header(CORRELATION_HEADER, correlation_id())
                    .json(body)
            })
            .await?;
        decode(resp).await
    }

    pub async fn put_no_content(&self, url: &str) -> Result<()> {
        let resp = self
            .execute(|| self.http.put(url).header(CORRELATION_HEADER, correlation_id()))
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        let resp = self
            .execute(|| {
                self.http
                    .delete(url)
                    .header(CORRELATION_HEADER, correlation_id())
            })
            .await?;
        check(resp).await.map(|_| ())
    }

    /// Runs the request, retrying transport failures and 5xx responses up to
    /// the budget. 4xx responses are final.
    async fn execute<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = build().send().await;
            let retryable = match &outcome {
                Ok(resp) => resp.status().is_server_error(),
                Err(_) => true,
            };
            if !retryable || attempt >= self.retries {
                return outcome.map_err(map_transport_error);
            }
            let backoff = backoff_with_jitter(attempt);
            tracing::debug!(attempt, backoff_ms = backoff.as_millis() as u64, "retrying SBI request");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

impl Default for SbiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// 200 ms doubled per attempt, with 20% jitter either way.
fn backoff_with_jitter(attempt: u32) -> Duration {
    let base = BACKOFF_BASE * 2u32.saturating_pow(attempt);
    let jitter = rand::thread_rng().gen_range(0.8..=1.2);
    base.mul_f64(jitter)
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(CLIENT_TIMEOUT)
    } else {
        Error::Unavailable(err.to_string())
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let detail = resp
        .json::<ProblemDetails>()
        .await
        .ok()
        .and_then(|p| p.detail)
        .unwrap_or_else(|| format!("HTTP {status}"));
    Err(match status {
        StatusCode::BAD_REQUEST => Error::InvalidInput(detail),
        StatusCode::FORBIDDEN => Error::Unauthorized(detail),
        StatusCode::NOT_FOUND => Error::NotFound(detail),
        StatusCode::CONFLICT => Error::Conflict(detail),
        StatusCode::SERVICE_UNAVAILABLE => Error::Unavailable(detail),
        StatusCode::GATEWAY_TIMEOUT => Error::Timeout(CLIENT_TIMEOUT),
        _ => Error::Internal(detail),
    })
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let resp = check(resp).await?;
    resp.json::<T>()
        .await
        .map_err(|e| Error::Protocol(format!("invalid SBI response body: {e}")))
}
