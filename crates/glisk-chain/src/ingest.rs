// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! The persistence step shared by the webhook ingester and log replay
//! (§4.2 step "Persistence, per log" / §4.3b): given a decoded
//! `BatchMinted` event, atomically insert one `MintEvent` and
//! `quantity` `Token` rows, or report a duplicate.

use chrono::{DateTime, Utc};
use ethers::types::H256;
use glisk_store::{AuthorRepo, MintEventRepo, Store, TokenRepo};
use glisk_types::{NewMintEvent, NewToken};

use crate::checksum::to_checksum;
use crate::decode::DecodedBatchMinted;
use crate::error::ChainError;

#[derive(Debug, Clone)]
pub enum PersistOutcome {
    Created { token_ids: Vec<i64> },
    Duplicate,
}

#[allow(clippy::too_many_arguments)]
pub async fn persist_batch_minted(
    store: &Store,
    default_author_wallet: &str,
    decoded: &DecodedBatchMinted,
    tx_hash: H256,
    log_index: i32,
    block_number: u64,
    block_timestamp: DateTime<Utc>,
) -> Result<PersistOutcome, ChainError> {
    let tx_hash_hex = format!("{tx_hash:#x}");
    let author_wallet = to_checksum(&decoded.prompt_author);
    let minter = to_checksum(&decoded.minter);
    let default_author_wallet = default_author_wallet.to_string();
    let start_token_id = decoded.start_token_id as i64;
    let quantity = decoded.quantity;
    let block_number = block_number as i64;

    store
        .transaction(move |conn| {
            if MintEventRepo::exists(conn, &tx_hash_hex, log_index)? {
                return Ok(PersistOutcome::Duplicate);
            }

            let author = AuthorRepo::resolve_or_default(conn, &author_wallet, &default_author_wallet)?;

            let new_event = NewMintEvent {
                tx_hash: tx_hash_hex.clone(),
                log_index,
                block_number,
                block_timestamp,
                token_id: start_token_id,
                author_wallet: author_wallet.clone(),
                recipient: minter.clone(),
            };
            MintEventRepo::insert(conn, &new_event)?;

            let mut token_ids = Vec::with_capacity(quantity as usize);
            for i in 0..quantity {
                let token_id = start_token_id + i as i64;
                TokenRepo::insert(conn, &NewToken::detected(token_id, author.id))?;
                token_ids.push(token_id);
            }

            Ok(PersistOutcome::Created { token_ids })
        })
        .await
        .map_err(|e| ChainError::Store(e.to_string()))
}
