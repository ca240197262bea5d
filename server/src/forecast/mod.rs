pub mod types;
pub mod visualcrossing;

use async_trait::async_trait;
use thiserror::Error;
use types::ForecastReport;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to get weather data from api")]
    UpstreamUnreachable(#[source] reqwest::Error),
    #[error("Failed to read weather data body")]
    ResponseUnreadable(#[source] reqwest::Error),
    #[error("Failed to parse weather data")]
    ResponseUnparseable(#[source] serde_json::Error),
    #[error("Weather data did not have the expected shape: {0}")]
    ShapeMismatch(#[source] serde_json::Error),
}

impl FetchError {
    /// Stable name of the stage that failed.
    pub fn class(&self) -> &'static str {
        match self {
            FetchError::UpstreamUnreachable(_) => "upstream-unreachable",
            FetchError::ResponseUnreadable(_) => "response-unreadable",
            FetchError::ResponseUnparseable(_) => "response-unparseable",
            FetchError::ShapeMismatch(_) => "response-shape-mismatch",
        }
    }
}

/// Something that can produce a normalized forecast for a location.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<ForecastReport, FetchError>;
}
