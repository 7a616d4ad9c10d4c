// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use ethers::types::{H256, U256};
use glisk_chain::{decode_batch_minted, persist_batch_minted, PersistOutcome, BATCH_MINTED_SIGNATURE};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-alchemy-signature";

#[derive(Debug, Deserialize)]
struct AlchemyPayload {
    #[serde(rename = "webhookId", default)]
    webhook_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    event: AlchemyEvent,
}

#[derive(Debug, Deserialize)]
struct AlchemyEvent {
    data: AlchemyEventData,
}

#[derive(Debug, Deserialize)]
struct AlchemyEventData {
    block: AlchemyBlock,
}

#[derive(Debug, Deserialize)]
struct AlchemyBlock {
    number: u64,
    logs: Vec<AlchemyLog>,
}

#[derive(Debug, Deserialize)]
struct AlchemyLog {
    topics: Vec<String>,
    data: String,
    #[serde(default)]
    index: Option<i32>,
    #[serde(default)]
    removed: bool,
    #[serde(default)]
    account: Option<AlchemyAccount>,
    transaction: AlchemyTransaction,
}

#[derive(Debug, Deserialize)]
struct AlchemyAccount {
    address: String,
}

#[derive(Debug, Deserialize)]
struct AlchemyTransaction {
    hash: String,
    #[serde(default)]
    status: Option<i32>,
}

/// `POST /webhooks/alchemy`. Validates the HMAC signature against the
/// raw body, then parses the GraphQL-shaped payload, filters logs by
/// contract address and `BatchMinted` signature, and persists each
/// surviving log the same way log replay does.
pub async fn receive_alchemy_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        warn!("webhook.missing_signature_header");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": "error", "message": "missing signature header" })),
        );
    };

    if !crate::signature::validate_signature(&body, signature, &state.webhook_secret) {
        warn!("webhook.invalid_signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": "error", "message": "invalid signature" })),
        );
    }

    let payload: AlchemyPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "webhook.invalid_json");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": format!("invalid JSON payload: {e}") })),
            );
        }
    };

    info!(
        webhook_id = ?payload.webhook_id,
        event_id = ?payload.id,
        "webhook.received"
    );

    let block_number = payload.event.data.block.number;
    let contract_address = state.contract_address.to_lowercase();

    let matching: Vec<&AlchemyLog> = payload
        .event
        .data
        .block
        .logs
        .iter()
        .filter(|log| {
            log.account
                .as_ref()
                .map(|a| a.address.to_lowercase() == contract_address)
                .unwrap_or(false)
        })
        .collect();

    if matching.is_empty() {
        info!(total_logs = payload.event.data.block.logs.len(), "webhook.no_matching_events");
        return (
            StatusCode::OK,
            Json(json!({ "status": "success", "message": "no matching events for this contract" })),
        );
    }

    let mut processed = 0usize;
    let mut duplicates = 0usize;

    for log in matching {
        if log.removed {
            warn!(tx_hash = %log.transaction.hash, "webhook.removed_log_skipped");
            continue;
        }
        if log.transaction.status != Some(1) {
            warn!(tx_hash = %log.transaction.hash, status = ?log.transaction.status, "webhook.failed_transaction_skipped");
            continue;
        }

        let Some(topic0_raw) = log.topics.first() else {
            continue;
        };
        let topic0 = match parse_topic(topic0_raw) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "webhook.decode_error");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "status": "error", "message": format!("failed to decode event: {e}") })),
                );
            }
        };
        if topic0 != *BATCH_MINTED_SIGNATURE {
            continue;
        }

        let topics = match parse_topics(&log.topics) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "webhook.decode_error");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "status": "error", "message": format!("failed to decode event: {e}") })),
                );
            }
        };

        let data = match hex::decode(log.data.trim_start_matches("0x")) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "webhook.invalid_data_hex");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "status": "error", "message": "log data is not valid hex" })),
                );
            }
        };

        let decoded = match decode_batch_minted(&topics, &data) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "webhook.decode_error");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "status": "error", "message": format!("failed to decode event: {e}") })),
                );
            }
        };

        let tx_hash: H256 = match log.transaction.hash.parse() {
            Ok(h) => h,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "status": "error", "message": "malformed transaction hash" })),
                );
            }
        };
        let log_index = log.index.unwrap_or_default();

        info!(
            start_token_id = decoded.start_token_id,
            quantity = decoded.quantity,
            tx_hash = %log.transaction.hash,
            "webhook.event_decoded"
        );

        match persist_batch_minted(
            &state.store,
            &state.default_author_wallet,
            &decoded,
            tx_hash,
            log_index,
            block_number,
            chrono::Utc::now(),
        )
        .await
        {
            Ok(PersistOutcome::Created { token_ids }) => {
                processed += 1;
                info!(token_ids = ?token_ids, "webhook.tokens_created");
            }
            Ok(PersistOutcome::Duplicate) => {
                duplicates += 1;
                warn!(tx_hash = %log.transaction.hash, log_index, "webhook.duplicate");
            }
            Err(e) => {
                warn!(error = %e, "webhook.storage_failure");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": "error", "message": e.to_string() })),
                );
            }
        }
    }

    if processed == 0 && duplicates > 0 {
        return (
            StatusCode::OK,
            Json(json!({ "status": "duplicate", "message": "event already processed" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({ "status": "success", "processed": processed, "duplicates": duplicates })),
    )
}

fn parse_topic(raw: &str) -> Result<H256, String> {
    let hex_part = raw.trim_start_matches("0x");
    let value = U256::from_str_radix(hex_part, 16).map_err(|e| format!("invalid topic hex: {e}"))?;
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    Ok(H256::from(bytes))
}

/// Full 4-topic decode for a confirmed `BatchMinted` log. Callers must
/// check `topics[0]` against the signature first so a non-matching log
/// from the same contract with fewer topics is skipped, not rejected.
fn parse_topics(raw: &[String]) -> Result<Vec<H256>, String> {
    if raw.len() < 4 {
        return Err(format!("invalid topics length: {}, expected 4", raw.len()));
    }
    raw.iter().map(|t| parse_topic(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_topics() {
        let topics = vec!["0x01".to_string(), "0x02".to_string()];
        assert!(parse_topics(&topics).is_err());
    }

    #[test]
    fn parses_well_formed_topics() {
        let topics = vec![
            format!("0x{}", hex::encode(BATCH_MINTED_SIGNATURE.as_bytes())),
            format!("0x{:064x}", 0x1111u64),
            format!("0x{:064x}", 0x2222u64),
            format!("0x{:064x}", 10u64),
        ];
        let parsed = parse_topics(&topics).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0], *BATCH_MINTED_SIGNATURE);
    }

    #[test]
    fn rejects_malformed_hex() {
        let topics = vec![
            "0xzz".to_string(),
            "0x01".to_string(),
            "0x02".to_string(),
            "0x03".to_string(),
        ];
        assert!(parse_topics(&topics).is_err());
    }

    #[test]
    fn parse_topic_accepts_a_single_short_topic() {
        let topic = format!("0x{}", hex::encode(BATCH_MINTED_SIGNATURE.as_bytes()));
        assert_eq!(parse_topic(&topic).unwrap(), *BATCH_MINTED_SIGNATURE);
    }
}
