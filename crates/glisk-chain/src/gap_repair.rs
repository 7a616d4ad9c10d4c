// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use glisk_store::{AuthorRepo, Store, StoreError, TokenRepo};
use glisk_types::NewToken;
use tracing::{info, warn};

use crate::checksum::to_checksum;
use crate::client::{extract_ipfs_cid, ChainReader};
use crate::error::ChainError;

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct GapRepairReport {
    pub total_on_chain: u64,
    pub missing_count: usize,
    pub recovered_count: usize,
    pub skipped_duplicate_count: usize,
    pub errors: Vec<String>,
}

/// The primary catch-up mechanism (§4.3a): diff `contract.nextTokenId()`
/// against the store's `token_id`s and fill every gap by querying the
/// contract for the prompt author and reveal status of each missing id.
pub async fn repair_gaps(
    reader: &ChainReader,
    store: &Store,
    default_author_wallet: &str,
    limit: Option<i64>,
) -> Result<GapRepairReport, ChainError> {
    let next_token_id = reader.next_token_id().await?;
    info!(next_token_id, "gap_repair.next_token_id_queried");

    let missing_ids: Vec<i64> = store
        .transaction({
            let max = next_token_id as i64;
            move |conn| {
                TokenRepo::missing_token_ids(conn, max, limit).map_err(StoreError::from)
            }
        })
        .await
        .map_err(|e| ChainError::Store(e.to_string()))?;

    if missing_ids.is_empty() {
        info!("gap_repair.no_gaps_detected");
        return Ok(GapRepairReport {
            total_on_chain: next_token_id.saturating_sub(1),
            ..Default::default()
        });
    }

    info!(
        missing_count = missing_ids.len(),
        first = missing_ids.first(),
        last = missing_ids.last(),
        "gap_repair.gaps_detected"
    );

    let mut report = GapRepairReport {
        total_on_chain: next_token_id.saturating_sub(1),
        missing_count: missing_ids.len(),
        ..Default::default()
    };

    for token_id in missing_ids {
        match repair_one(reader, store, default_author_wallet, token_id as u64).await {
            Ok(RepairOutcome::Recovered) => report.recovered_count += 1,
            Ok(RepairOutcome::SkippedDuplicate) => report.skipped_duplicate_count += 1,
            Err(e) => {
                warn!(token_id, error = %e, "gap_repair.token_failed");
                report.errors.push(format!("token {token_id}: {e}"));
            }
        }
    }

    Ok(report)
}

enum RepairOutcome {
    Recovered,
    SkippedDuplicate,
}

async fn repair_one(
    reader: &ChainReader,
    store: &Store,
    default_author_wallet: &str,
    token_id: u64,
) -> Result<RepairOutcome, ChainError> {
    let author_wallet = reader.token_prompt_author(token_id).await?;
    let author_wallet = to_checksum(&author_wallet);
    let is_revealed = reader.is_revealed(token_id).await?;

    let new_token = if is_revealed {
        let token_uri = reader.token_uri(token_id).await?;
        let cid = extract_ipfs_cid(&token_uri)?;
        NewTokenPlan::AlreadyRevealed(cid)
    } else {
        NewTokenPlan::Detected
    };

    let default_author_wallet = default_author_wallet.to_string();
    let result = store
        .transaction(move |conn| {
            let author = AuthorRepo::resolve_or_default(conn, &author_wallet, &default_author_wallet)?;
            let new_token = match &new_token {
                NewTokenPlan::Detected => NewToken::detected(token_id as i64, author.id),
                NewTokenPlan::AlreadyRevealed(cid) => {
                    NewToken::already_revealed(token_id as i64, author.id, cid.clone())
                }
            };
            TokenRepo::insert(conn, &new_token)
        })
        .await;

    match result {
        Ok(_) => Ok(RepairOutcome::Recovered),
        Err(e) if e.is_unique_violation() => Ok(RepairOutcome::SkippedDuplicate),
        Err(e) => Err(ChainError::Store(e.to_string())),
    }
}

enum NewTokenPlan {
    Detected,
    AlreadyRevealed(String),
}
