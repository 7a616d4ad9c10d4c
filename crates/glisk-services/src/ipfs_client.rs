// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ServiceError;

/// Content-pinning client. Pins image bytes and JSON metadata under
/// deterministic, semantic filenames keyed by `token_id`.
pub struct PinningClient {
    http: reqwest::Client,
    jwt: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinningClient {
    pub fn new(jwt: String) -> Self {
        Self::with_base_url(jwt, "https://api.pinata.cloud".to_string())
    }

    pub fn with_base_url(jwt: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client build");
        Self { http, jwt, base_url }
    }

    /// Downloads `image_url` and pins the bytes under
    /// `s0-token-<token_id>.png`, returning the content id.
    pub async fn pin_image(&self, image_url: &str, token_id: i64) -> Result<String, ServiceError> {
        if self.jwt.is_empty() {
            return Err(ServiceError::Permanent(
                "pinning JWT not configured".to_string(),
            ));
        }

        let image_bytes = self
            .http
            .get(image_url)
            .send()
            .await
            .map_err(classify_transport_error)?
            .error_for_status()
            .map_err(classify_transport_error)?
            .bytes()
            .await
            .map_err(classify_transport_error)?;

        let filename = format!("s0-token-{token_id}.png");
        let part = reqwest::multipart::Part::bytes(image_bytes.to_vec())
            .file_name(filename.clone())
            .mime_str("image/png")
            .map_err(|e| ServiceError::Permanent(e.to_string()))?;

        let pinata_metadata = serde_json::json!({
            "name": filename,
            "keyvalues": { "season": "0", "token_id": token_id.to_string() },
        });

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("pinataOptions", r#"{"cidVersion": 1}"#)
            .text("pinataMetadata", pinata_metadata.to_string());

        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.base_url))
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        self.extract_cid(response).await
    }

    /// Pins a JSON metadata document under
    /// `s0-token-<token_id>-metadata.json`, returning the content id.
    pub async fn pin_metadata(&self, metadata: &Value, token_id: i64) -> Result<String, ServiceError> {
        if self.jwt.is_empty() {
            return Err(ServiceError::Permanent(
                "pinning JWT not configured".to_string(),
            ));
        }

        let filename = format!("s0-token-{token_id}-metadata.json");
        let payload = serde_json::json!({
            "pinataContent": metadata,
            "pinataOptions": { "cidVersion": 1 },
            "pinataMetadata": {
                "name": filename,
                "keyvalues": { "season": "0", "token_id": token_id.to_string() },
            },
        });

        let response = self
            .http
            .post(format!("{}/pinning/pinJSONToIPFS", self.base_url))
            .bearer_auth(&self.jwt)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        self.extract_cid(response).await
    }

    async fn extract_cid(&self, response: reqwest::Response) -> Result<String, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status.as_u16(), &body));
        }
        let parsed: PinResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Permanent(format!("unexpected pin response shape: {e}")))?;
        Ok(parsed.ipfs_hash)
    }
}

fn classify_transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Transient(format!("request timeout after 30s: {e}"))
    } else {
        ServiceError::Transient(format!("network error: {e}"))
    }
}
