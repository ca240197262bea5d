use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized forecast returned to callers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub address: String,
    #[serde(rename = "requestdate")]
    pub request_date: String,
    pub days: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub description: String,
    pub temperature: f64,
    #[serde(rename = "temperaturemax")]
    pub temperature_max: f64,
    #[serde(rename = "temperaturemin")]
    pub temperature_min: f64,
    pub datetime: String,
    #[serde(rename = "feelslike")]
    pub feels_like: f64,
}

// Visual Crossing timeline payload. Only the fields we project are declared;
// everything else in the upstream document is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineResponse {
    pub address: String,
    pub days: Vec<TimelineDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineDay {
    pub description: String,
    pub temp: f64,
    pub tempmax: f64,
    pub tempmin: f64,
    pub datetime: String,
    pub feelslike: f64,
}

impl From<TimelineDay> for ForecastDay {
    fn from(day: TimelineDay) -> Self {
        Self {
            description: day.description,
            temperature: day.temp,
            temperature_max: day.tempmax,
            temperature_min: day.tempmin,
            datetime: day.datetime,
            feels_like: day.feelslike,
        }
    }
}

impl ForecastReport {
    /// Projects an upstream timeline into a report stamped with `request_date`.
    /// Day order is kept exactly as upstream sent it.
    pub fn from_timeline(timeline: TimelineResponse, request_date: NaiveDate) -> Self {
        Self {
            address: timeline.address,
            request_date: request_date.format("%Y-%m-%d").to_string(),
            days: timeline.days.into_iter().map(ForecastDay::from).collect(),
        }
    }
}
