//! Stateless HTTP boundary to the remote classifier.
//!
//! One method per endpoint, uniform error translation, no shared mutable
//! state: the client clones cheaply and every method is safe to call
//! concurrently. Retrying is the caller's decision; `analyze` in particular is
//! never retried here.

use std::time::Duration;

use crate::config::Config;
use crate::errors::AnalysisError;
use crate::schema::{decode_analysis, AnalysisResult, DatasetMetrics, HealthStatus, ModelPerformance};

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AnalysisError::from)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        Self::new(config.resolved_base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit one URL for classification. Non-2xx responses and transport
    /// failures surface as `AnalysisError`; contract violations in a 2xx body
    /// surface as `AnalysisError::Schema` and are logged distinctly.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult, AnalysisError> {
        let endpoint = format!("{}/analyze", self.base_url);
        log::debug!("POST {endpoint} url={url}");

        let response = self
            .http
            .post(&endpoint)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Http {
                status: status.as_u16(),
                message: snippet(&message),
            });
        }

        let body = response.bytes().await?;
        match decode_analysis(&body) {
            Ok(result) => Ok(result),
            Err(schema_err) => {
                log::error!("classifier contract mismatch from {endpoint}: {schema_err}");
                Err(AnalysisError::Schema(schema_err))
            }
        }
    }

    pub async fn model_performance(&self) -> Result<ModelPerformance, AnalysisError> {
        self.get_json("/model/performance").await
    }

    pub async fn dataset_metrics(&self) -> Result<DatasetMetrics, AnalysisError> {
        self.get_json("/model/dataset").await
    }

    pub async fn health(&self) -> Result<HealthStatus, AnalysisError> {
        self.get_json("/health").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, AnalysisError> {
        let endpoint = format!("{}{path}", self.base_url);
        log::debug!("GET {endpoint}");

        let response = self.http.get(&endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Http {
                status: status.as_u16(),
                message: snippet(&message),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            log::error!("contract mismatch from {endpoint}: {e}");
            AnalysisError::Schema(crate::errors::SchemaError::Shape(e.to_string()))
        })
    }
}

/// Keep remote error bodies short enough for a notification line.
fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}
