//! Route optimizer client
//!
//! The optimizer is an external black box: it receives a route's stops and
//! answers with distance, time and efficiency for the best ordering.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use shared::OptimizedRoute;

use crate::config::RouteOptimizerConfig;
use crate::error::{AppError, AppResult};

/// Route optimizer API client
#[derive(Clone)]
pub struct RouteOptimizerClient {
    client: Client,
    base_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct OptimizeRequest<'a> {
    route_id: &'a str,
    picker: &'a str,
    stops: i32,
}

impl RouteOptimizerClient {
    pub fn new(config: &RouteOptimizerConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config
                .endpoint
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Ask the optimizer for new metrics. `None` when no optimizer is
    /// configured.
    pub async fn optimize(&self, route_id: &str, picker: &str, stops: i32) -> AppResult<Option<OptimizedRoute>> {
        let Some(base_url) = &self.base_url else {
            return Ok(None);
        };
        let url = format!("{}/optimize", base_url);

        let response = self
            .client
            .post(&url)
            .json(&OptimizeRequest {
                route_id,
                picker,
                stops,
            })
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Route optimizer request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Route optimizer error: {} - {}",
                status, body
            )));
        }

        let optimized: OptimizedRoute = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse optimizer response: {}", e))
        })?;

        tracing::debug!(route_id, efficiency = optimized.efficiency, "Route optimized");
        Ok(Some(optimized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_optimizer_returns_none() {
        let client = RouteOptimizerClient::new(&RouteOptimizerConfig {
            endpoint: None,
            timeout_secs: 1,
        })
        .unwrap();
        assert!(!client.is_configured());
        assert_eq!(client.optimize("R-1", "Sam", 4).await.unwrap(), None);
    }

    #[test]
    fn test_blank_endpoint_counts_as_unconfigured() {
        let client = RouteOptimizerClient::new(&RouteOptimizerConfig {
            endpoint: Some(String::new()),
            timeout_secs: 1,
        })
        .unwrap();
        assert!(!client.is_configured());
    }
}
