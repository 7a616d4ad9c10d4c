// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::ServiceError;
use crate::prompt::validate_prompt;

const DEFAULT_MODEL: &str = "black-forest-labs/flux-schnell";

/// Client for the external text-to-image service. Returns a
/// CDN-hosted, transient image URL per token.
pub struct ImageClient {
    http: reqwest::Client,
    api_token: String,
    model: String,
    base_url: String,
}

impl ImageClient {
    pub fn new(api_token: String, model: Option<String>) -> Self {
        Self::with_base_url(api_token, model, "https://api.replicate.com/v1".to_string())
    }

    pub fn with_base_url(api_token: String, model: Option<String>, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client build");
        Self {
            http,
            api_token,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url,
        }
    }

    /// Validates `prompt`, calls the model, and returns the resulting
    /// image URL. Errors are classified per `ServiceError`.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, ServiceError> {
        if self.api_token.is_empty() {
            return Err(ServiceError::Permanent(
                "image API token not configured".to_string(),
            ));
        }
        let prompt = validate_prompt(prompt)?;

        let response = self
            .http
            .post(format!("{}/models/{}/predictions", self.base_url, self.model))
            .bearer_auth(&self.api_token)
            .json(&json!({ "input": { "prompt": prompt } }))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status.as_u16(), &body));
        }

        let body: PredictionResponse = response.json().await.map_err(|e| {
            ServiceError::Permanent(format!("unexpected response shape: {e}"))
        })?;

        match body.output {
            Some(Output::Single(url)) => Ok(url),
            Some(Output::Many(urls)) => urls.into_iter().next().ok_or_else(|| {
                ServiceError::Permanent("image API returned an empty output list".to_string())
            }),
            None => Err(ServiceError::Permanent(
                "image API response had no output field".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    output: Option<Output>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Output {
    Single(String),
    Many(Vec<String>),
}

fn classify_transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() || e.is_connect() {
        ServiceError::Transient(format!("network error: {e}"))
    } else {
        ServiceError::Transient(format!("request failed: {e}"))
    }
}
