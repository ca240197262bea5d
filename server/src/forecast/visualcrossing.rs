use super::types::{ForecastReport, TimelineResponse};
use super::{FetchError, ForecastSource};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub struct VisualCrossingClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VisualCrossingClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("ForecastGateway/1.0")
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.visualcrossing_base_url.trim_end_matches('/').to_string(),
            api_key: config.visualcrossing_api_key.clone(),
        })
    }

    // The location goes into the path as given; callers are not sanitized.
    fn timeline_url(&self, location: &str, api_key: &str) -> String {
        format!(
            "{}/{}?unitGroup=us&include=days&key={}&contentType=json",
            self.base_url, location, api_key
        )
    }

    async fn get_timeline(&self, location: &str) -> Result<TimelineResponse, FetchError> {
        let url = self.timeline_url(location, &self.api_key);
        tracing::debug!("Requesting timeline: {}", self.timeline_url(location, "<redacted>"));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FetchError::UpstreamUnreachable)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Visual Crossing answered HTTP {} for '{}'", status, location);
        }

        let body = response
            .bytes()
            .await
            .map_err(FetchError::ResponseUnreadable)?;
        let json: Value = serde_json::from_slice(&body).map_err(FetchError::ResponseUnparseable)?;

        serde_json::from_value(json).map_err(FetchError::ShapeMismatch)
    }
}

#[async_trait]
impl ForecastSource for VisualCrossingClient {
    async fn fetch(&self, location: &str) -> Result<ForecastReport, FetchError> {
        let timeline = self.get_timeline(location).await?;
        let today = chrono::Local::now().date_naive();
        Ok(ForecastReport::from_timeline(timeline, today))
    }
}
