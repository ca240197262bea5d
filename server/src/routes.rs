use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::header,
    response::Json,
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::{
    config::Config,
    forecast::types::ForecastReport,
    gateway::{Forecast, ForecastGateway, GatewayError},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<ForecastGateway>,
}

#[derive(Debug, Deserialize)]
pub struct LocationForm {
    pub location: Option<String>,
}

/// The `location` form value of a request.
///
/// Looked up in a urlencoded or multipart body first, then in the query
/// string. Absent or unreadable input yields an empty location, never a
/// rejection.
#[derive(Debug)]
pub struct LocationValue(pub String);

#[async_trait]
impl<S> FromRequest<S> for LocationValue
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let from_query = Query::<LocationForm>::try_from_uri(req.uri())
            .ok()
            .and_then(|Query(form)| form.location);

        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let from_body = if content_type.starts_with("multipart/form-data") {
            location_from_multipart(req, state).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            match Form::<LocationForm>::from_request(req, state).await {
                Ok(Form(form)) => form.location,
                Err(e) => {
                    tracing::debug!("Ignoring unreadable form body: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(LocationValue(from_body.or(from_query).unwrap_or_default()))
    }
}

async fn location_from_multipart<S>(req: Request, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    let mut multipart = match Multipart::from_request(req, state).await {
        Ok(multipart) => multipart,
        Err(e) => {
            tracing::debug!("Ignoring unreadable multipart body: {}", e);
            return None;
        }
    };

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("location") => return field.text().await.ok(),
            Ok(Some(_)) => continue,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!("Ignoring malformed multipart field: {}", e);
                return None;
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_default_forecast(
    State(state): State<AppState>,
) -> Result<Json<ForecastReport>, GatewayError> {
    tracing::debug!("Default forecast requested for '{}'", state.config.default_location);
    let report = state.gateway.fetch_default().await?;
    Ok(Json(report))
}

pub async fn get_location_forecast(
    State(state): State<AppState>,
    LocationValue(location): LocationValue,
) -> Result<Forecast, GatewayError> {
    state.gateway.lookup_or_fetch(&location).await
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_default_forecast))
        .route("/location", post(get_location_forecast))
        .route("/health", get(health))
        .with_state(state)
}
