use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::StatusPage;

const HOMEWORK_STATUSES_PATH: &str = "/api/user_api/homework_statuses/";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to the review API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("review API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode the review API response: {0}")]
    Decode(String),
}

/// Source of homework status pages. The poll loop only depends on this
/// seam, so tests can drive it with scripted fakes.
#[async_trait]
pub trait StatusSource {
    async fn fetch_statuses(&self, from_date: i64) -> Result<StatusPage, ApiError>;
}

/// Client for the homework review API.
pub struct ReviewApi {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl ReviewApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> ReviewApi {
        let base_url = base_url.into();

        ReviewApi {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn request_statuses(&self, from_date: i64) -> Result<StatusPage, ApiError> {
        let url = format!("{}{}", self.base_url, HOMEWORK_STATUSES_PATH);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_owned());

            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl StatusSource for ReviewApi {
    // A single bad fetch must never take the poll loop down, so request and
    // decode failures collapse into the empty page here.
    async fn fetch_statuses(&self, from_date: i64) -> Result<StatusPage, ApiError> {
        debug!("Requesting homework statuses from {from_date}");

        match self.request_statuses(from_date).await {
            Ok(page) => Ok(page),
            Err(err) => {
                warn!("Review API request failed, treating as no new data: {err}");
                Ok(StatusPage::default())
            }
        }
    }
}
