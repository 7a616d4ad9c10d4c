// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use ethers::types::U256;
use glisk_chain::{ChainError, ChainReader, KeeperClient};
use glisk_store::{RevealTxRepo, Store, StoreError, TokenRepo};
use glisk_types::{NewRevealTransaction, Token, TokenStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const BATCH_MAX: i64 = 50;

/// Accumulates `ready` tokens into batches and submits reveal
/// transactions via the keeper (§4.7).
pub struct RevealWorker {
    store: Store,
    keeper: KeeperClient,
    reader: ChainReader,
    poll_interval: Duration,
    batch_wait: Duration,
    transaction_timeout: Duration,
    explorer_base_url: Option<String>,
}

impl RevealWorker {
    pub fn new(
        store: Store,
        keeper: KeeperClient,
        reader: ChainReader,
        poll_interval: Duration,
        batch_wait: Duration,
        transaction_timeout: Duration,
        explorer_base_url: Option<String>,
    ) -> Self {
        Self {
            store,
            keeper,
            reader,
            poll_interval,
            batch_wait,
            transaction_timeout,
            explorer_base_url,
        }
    }

    /// Startup orphan reconciliation: resolves every `pending`
    /// `RevealTransaction` against the chain before the main loop runs.
    pub async fn reconcile_orphans(&self) {
        let pending = self
            .store
            .transaction(|conn| RevealTxRepo::unresolved(conn))
            .await;
        let pending = match pending {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "reveal_worker.orphan_scan_failed");
                return;
            }
        };

        let covered: HashSet<i64> = pending
            .iter()
            .flat_map(|tx| tx.token_ids.iter().copied())
            .collect();

        for tx in pending {
            let Some(tx_hash) = tx.tx_hash.clone() else {
                continue;
            };
            let Ok(parsed_hash) = tx_hash.parse::<ethers::types::H256>() else {
                continue;
            };
            match self.reader.get_transaction_receipt(parsed_hash).await {
                Ok(Some(receipt)) if receipt.status == Some(1.into()) => {
                    let token_ids = tx.token_ids.clone();
                    let id = tx.id;
                    let block_number = receipt.block_number.map(|b| b.as_u64() as i64).unwrap_or(0);
                    let result = self
                        .store
                        .transaction(move |conn| {
                            RevealTxRepo::mark_confirmed(conn, id, &tx_hash, block_number)?;
                            for numeric_id in &token_ids {
                                if let Some(mut token) = TokenRepo::get_by_token_id(conn, *numeric_id)? {
                                    if token.status() == TokenStatus::Submitting {
                                        token.mark_revealed(Some(tx_hash.clone()))?;
                                        TokenRepo::save(conn, &token)?;
                                    }
                                }
                            }
                            Ok(())
                        })
                        .await;
                    if let Err(e) = result {
                        warn!(error = %e, "reveal_worker.orphan_confirm_failed");
                    }
                }
                Ok(Some(receipt)) if receipt.status == Some(0.into()) => {
                    let id = tx.id;
                    let token_ids = tx.token_ids.clone();
                    let result = self
                        .store
                        .transaction(move |conn| {
                            RevealTxRepo::mark_failed(conn, id)?;
                            for numeric_id in &token_ids {
                                if let Some(mut token) = TokenRepo::get_by_token_id(conn, *numeric_id)? {
                                    if token.status() == TokenStatus::Submitting {
                                        token.release_submission()?;
                                        TokenRepo::save(conn, &token)?;
                                    }
                                }
                            }
                            Ok(())
                        })
                        .await;
                    if let Err(e) = result {
                        warn!(error = %e, "reveal_worker.orphan_fail_failed");
                    }
                }
                Ok(Some(_)) | Ok(None) | Err(_) => {
                    info!(tx_id = %tx.id, "reveal_worker.orphan_left_pending");
                }
            }
        }

        self.release_unreferenced_stragglers(&covered).await;
    }

    /// A process can crash after `claim` commits a batch into
    /// `submitting` but before the matching `RevealTransaction` row is
    /// inserted, leaving tokens in `submitting` with nothing for the
    /// loop above to resolve against. `covered` is every token id named
    /// by a `Pending`/`Sent` row seen this scan; anything still
    /// `submitting` outside that set is such a straggler and is
    /// released back to `ready`.
    async fn release_unreferenced_stragglers(&self, covered: &HashSet<i64>) {
        let covered = covered.clone();
        let result = self
            .store
            .transaction(move |conn| {
                let mut released = 0usize;
                for mut token in TokenRepo::list_by_status(conn, TokenStatus::Submitting)? {
                    if covered.contains(&token.token_id) {
                        continue;
                    }
                    token.release_submission()?;
                    TokenRepo::save(conn, &token)?;
                    released += 1;
                }
                Ok(released)
            })
            .await;
        match result {
            Ok(released) if released > 0 => {
                info!(released, "reveal_worker.stragglers_released");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "reveal_worker.straggler_release_failed"),
        }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }
            let tokens = match self.accumulate_batch(&cancel).await {
                Some(tokens) => tokens,
                None => return,
            };

            if tokens.is_empty() {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = cancel.cancelled() => return,
                }
                continue;
            }

            self.submit_batch(tokens).await;
        }
    }

    /// Two-phase claim (§4.7): lease up to `BATCH_MAX`; if the batch is
    /// partially filled, wait `batch_wait` and top it up once.
    async fn accumulate_batch(&self, cancel: &CancellationToken) -> Option<Vec<Token>> {
        let first = self.claim(BATCH_MAX).await.ok()?;
        if first.len() >= BATCH_MAX as usize || first.is_empty() {
            return Some(first);
        }

        tokio::select! {
            _ = tokio::time::sleep(self.batch_wait) => {}
            _ = cancel.cancelled() => return Some(first),
        }

        let remaining = BATCH_MAX - first.len() as i64;
        let second = self.claim(remaining).await.unwrap_or_default();

        let mut by_token_id: HashMap<i64, Token> = HashMap::new();
        for token in first.into_iter().chain(second) {
            by_token_id.entry(token.token_id).or_insert(token);
        }
        Some(by_token_id.into_values().collect())
    }

    /// Leases up to `limit` `ready` tokens and advances each to
    /// `submitting` in the same transaction that releases the row lock,
    /// so the lease survives past the lock for the life of this batch.
    async fn claim(&self, limit: i64) -> Result<Vec<Token>, StoreError> {
        self.store
            .transaction(move |conn| {
                let claimed = TokenRepo::claim(conn, TokenStatus::Ready, limit)?;
                let mut submitting = Vec::with_capacity(claimed.len());
                for mut token in claimed {
                    token.mark_submitting()?;
                    TokenRepo::save(conn, &token)?;
                    submitting.push(token);
                }
                Ok(submitting)
            })
            .await
    }

    /// Releases a batch's tokens from `submitting` back to `ready` after
    /// a failed or inconclusive submission, so the next poll can retry
    /// them.
    async fn release_batch(&self, token_ids_numeric: Vec<i64>) {
        let result = self
            .store
            .transaction(move |conn| {
                for numeric_id in &token_ids_numeric {
                    if let Some(mut token) = TokenRepo::get_by_token_id(conn, *numeric_id)? {
                        if token.status() == TokenStatus::Submitting {
                            token.release_submission()?;
                            TokenRepo::save(conn, &token)?;
                        }
                    }
                }
                Ok(())
            })
            .await;
        if let Err(e) = result {
            warn!(error = %e, "reveal_worker.release_failed");
        }
    }

    async fn submit_batch(&self, tokens: Vec<Token>) {
        let token_ids_numeric: Vec<i64> = tokens.iter().map(|t| t.token_id).collect();
        let ids_u256: Vec<U256> = token_ids_numeric.iter().map(|id| U256::from(*id as u64)).collect();
        let uris: Vec<String> = tokens
            .iter()
            .map(|t| format!("ipfs://{}", t.metadata_cid.clone().unwrap_or_default()))
            .collect();

        let pending_record = self
            .store
            .transaction({
                let token_ids_numeric = token_ids_numeric.clone();
                move |conn| RevealTxRepo::insert(conn, &NewRevealTransaction::pending(token_ids_numeric))
            })
            .await;
        let pending_record = match pending_record {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "reveal_worker.pending_record_failed");
                return;
            }
        };

        match self
            .keeper
            .reveal_batch(&ids_u256, &uris, self.transaction_timeout)
            .await
        {
            Ok(receipt) => {
                let tx_hash = format!("{:#x}", receipt.transaction_hash);
                let block_number = receipt.block_number.map(|b| b.as_u64() as i64).unwrap_or(0);
                let explorer_link = self
                    .explorer_base_url
                    .as_ref()
                    .map(|base| format!("{base}/tx/{tx_hash}"));

                let result = self
                    .store
                    .transaction({
                        let tx_hash = tx_hash.clone();
                        let token_ids_numeric = token_ids_numeric.clone();
                        move |conn| {
                            RevealTxRepo::mark_confirmed(conn, pending_record.id, &tx_hash, block_number)?;
                            for numeric_id in &token_ids_numeric {
                                if let Some(mut token) = TokenRepo::get_by_token_id(conn, *numeric_id)? {
                                    token.mark_revealed(Some(tx_hash.clone()))?;
                                    TokenRepo::save(conn, &token)?;
                                }
                            }
                            Ok(())
                        }
                    })
                    .await;

                match result {
                    Ok(()) => info!(
                        batch_size = token_ids_numeric.len(),
                        tx_hash = %tx_hash,
                        explorer_link = ?explorer_link,
                        "keeper.transaction_submitted"
                    ),
                    Err(e) => warn!(error = %e, "reveal_worker.confirm_commit_failed"),
                }
            }
            Err(ChainError::Reverted(reason)) => {
                let explorer_link = self.explorer_base_url.clone();
                warn!(reason = %reason, explorer_link = ?explorer_link, "keeper.transaction_reverted");
                let result = self
                    .store
                    .transaction(move |conn| RevealTxRepo::mark_failed(conn, pending_record.id))
                    .await;
                if let Err(e) = result {
                    warn!(error = %e, "reveal_worker.revert_commit_failed");
                }
                self.release_batch(token_ids_numeric).await;
            }
            Err(ChainError::ConfirmationTimeout(Some(tx_hash))) => {
                // The tx may still confirm later; leave the tokens
                // `submitting` so a concurrent claim can't resubmit them,
                // and leave the row resolvable by the next restart's
                // orphan scan instead of marking it failed.
                let tx_hash = format!("{tx_hash:#x}");
                warn!(tx_hash = %tx_hash, "keeper.transaction_wait_timed_out");
                let result = self
                    .store
                    .transaction(move |conn| RevealTxRepo::mark_sent(conn, pending_record.id, &tx_hash))
                    .await;
                if let Err(e) = result {
                    warn!(error = %e, "reveal_worker.sent_commit_failed");
                }
            }
            Err(e) => {
                warn!(error = %e, "keeper.transaction_transient_failure");
                let result = self
                    .store
                    .transaction(move |conn| RevealTxRepo::mark_failed(conn, pending_record.id))
                    .await;
                if let Err(e) = result {
                    warn!(error = %e, "reveal_worker.transient_commit_failed");
                }
                self.release_batch(token_ids_numeric).await;
            }
        }
    }
}
