// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! Application settings, loaded from the environment (with an optional
//! `.env` file for local development): chain endpoint, contract
//! address, keeper key, external service credentials, and the worker
//! tuning knobs (poll interval, batch sizes, gas buffer/cap, timeouts).

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Database
    pub database_url: String,
    #[serde(default = "default_pool_size")]
    pub db_pool_size: u32,

    // Application environment
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    // Chain / contract
    pub rpc_url: String,
    #[serde(default = "default_network")]
    pub network: String,
    pub glisk_nft_contract_address: String,
    pub glisk_default_author_wallet: String,
    #[serde(default)]
    pub explorer_base_url: Option<String>,

    // Webhook
    pub alchemy_webhook_secret: String,

    // Keeper
    pub keeper_private_key: String,
    #[serde(default = "default_gas_buffer")]
    pub reveal_gas_buffer: f64,
    #[serde(default)]
    pub max_gas_price_gwei: Option<f64>,
    #[serde(default = "default_batch_wait")]
    pub reveal_batch_wait_seconds: u64,
    #[serde(default = "default_tx_timeout")]
    pub transaction_timeout_seconds: u64,
    #[serde(default = "default_reveal_batch_max")]
    pub reveal_batch_max: usize,

    // Image generation
    #[serde(default)]
    pub image_api_token: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_fallback_prompt")]
    pub fallback_censored_prompt: String,

    // Pinning
    #[serde(default)]
    pub pinning_jwt: String,

    // Worker tuning
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_worker_batch_size")]
    pub worker_batch_size: i64,

    // Recovery
    #[serde(default = "default_recovery_batch_size")]
    pub recovery_batch_size: u32,
}

fn default_pool_size() -> u32 {
    200
}
fn default_app_env() -> String {
    "development".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> String {
    "http://localhost:3000".to_string()
}
fn default_network() -> String {
    "BASE_SEPOLIA".to_string()
}
fn default_gas_buffer() -> f64 {
    0.20
}
fn default_batch_wait() -> u64 {
    5
}
fn default_tx_timeout() -> u64 {
    180
}
fn default_reveal_batch_max() -> usize {
    50
}
fn default_image_model() -> String {
    "black-forest-labs/flux-schnell".to_string()
}
fn default_fallback_prompt() -> String {
    "Cute kittens playing with yarn balls in a sunny meadow with flowers".to_string()
}
fn default_poll_interval() -> u64 {
    1
}
fn default_worker_batch_size() -> i64 {
    10
}
fn default_recovery_batch_size() -> u32 {
    500
}

impl Settings {
    /// Load from process environment, falling back to a local `.env`
    /// file (via `dotenvy`-style side effect the binary performs before
    /// calling this). Fails fast with field-level context on missing
    /// required variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings: Settings =
            envy::from_env().context("failed to load Settings from environment")?;
        settings.validate();
        Ok(settings)
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Soft validation: warns on missing optional-but-important
    /// production keys instead of failing, mirroring the original
    /// implementation's `validate_image_generation_config`.
    fn validate(&self) {
        if matches!(self.app_env.as_str(), "test" | "testing") {
            return;
        }
        if self.image_api_token.is_empty() {
            tracing::warn!(
                message = "IMAGE_API_TOKEN not set - image generation worker will fail",
            );
        }
        if self.pinning_jwt.is_empty() {
            tracing::warn!(message = "PINNING_JWT not set - content upload worker will fail");
        }
        if self.fallback_censored_prompt.is_empty() {
            tracing::warn!(message = "FALLBACK_CENSORED_PROMPT not set - using default");
        }
    }
}

/// Configure `tracing` once at process start: JSON in production,
/// human-readable otherwise, level from `Settings.log_level`.
pub fn configure_logging(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_new(&settings.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);

    if settings.is_production() {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_origins_split_and_trimmed() {
        let settings = Settings {
            database_url: String::new(),
            db_pool_size: 1,
            app_env: "test".into(),
            log_level: "info".into(),
            host: "0.0.0.0".into(),
            port: 8000,
            cors_origins: " http://a.com, http://b.com ".into(),
            rpc_url: String::new(),
            network: "BASE_SEPOLIA".into(),
            glisk_nft_contract_address: String::new(),
            glisk_default_author_wallet: String::new(),
            explorer_base_url: None,
            alchemy_webhook_secret: String::new(),
            keeper_private_key: String::new(),
            reveal_gas_buffer: 0.2,
            max_gas_price_gwei: None,
            reveal_batch_wait_seconds: 5,
            transaction_timeout_seconds: 180,
            reveal_batch_max: 50,
            image_api_token: String::new(),
            image_model: String::new(),
            fallback_censored_prompt: "x".into(),
            pinning_jwt: String::new(),
            poll_interval_seconds: 1,
            worker_batch_size: 10,
            recovery_batch_size: 500,
        };
        assert_eq!(
            settings.cors_origins_list(),
            vec!["http://a.com".to_string(), "http://b.com".to_string()]
        );
    }
}
