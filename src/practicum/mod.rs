use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

pub mod model;

pub use model::{check_response, ApiResponse, ContractError, HomeworkRecord};

/// Why a single poll produced no data. Never fatal for the loop.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to the homework API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("homework API answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("homework API returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of raw homework-status payloads.
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    /// Fetch everything changed since `from_date` (seconds since the epoch).
    /// The body is decoded but not validated.
    async fn fetch_homeworks(&self, from_date: i64) -> Result<Value, FetchError>;
}

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    pub fn new(token: String, endpoint: Url, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent("homework-watchbot/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn build_request(&self, from_date: i64) -> reqwest::Result<reqwest::Request> {
        self.http
            .get(self.endpoint.clone())
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()
    }

    async fn get_api_answer(&self, from_date: i64) -> Result<Value, FetchError> {
        let request = self.build_request(from_date)?;
        debug!(url = %request.url(), "requesting homework statuses");

        let res = self.http.execute(request).await?;
        let status = res.status();
        debug!(%status, "homework API responded");
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl HomeworkSource for PracticumClient {
    async fn fetch_homeworks(&self, from_date: i64) -> Result<Value, FetchError> {
        let res = self.get_api_answer(from_date).await;
        if let Err(err) = &res {
            error!(%err, from_date, "failed to fetch homework statuses");
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PracticumClient {
        PracticumClient::new(
            "token".into(),
            Url::parse("https://practicum.example/api/user_api/homework_statuses/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn build_request_sets_query_and_auth() {
        let request = client().build_request(1000).unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/user_api/homework_statuses/");
        assert_eq!(request.url().query(), Some("from_date=1000"));
        assert_eq!(
            request
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "OAuth token"
        );
    }

    #[test]
    fn debug_hides_token() {
        let printed = format!("{:?}", client());
        assert!(printed.contains("practicum.example"));
        assert!(!printed.contains("token\""));
    }
}
