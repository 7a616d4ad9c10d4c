// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use glisk_services::{validate_prompt, ImageClient, ServiceError};
use glisk_store::{AuditRepo, AuthorRepo, Store, StoreError, TokenRepo};
use glisk_types::{NewImageGenerationJob, TokenStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Claims `detected` tokens and drives each through `generating` to
/// `uploading` (§4.5). Runs until `cancel` fires.
pub struct ImageGenerationWorker {
    store: Store,
    image_client: Arc<ImageClient>,
    default_author_wallet: String,
    fallback_prompt: String,
    poll_interval: Duration,
    batch_size: i64,
}

impl ImageGenerationWorker {
    pub fn new(
        store: Store,
        image_client: Arc<ImageClient>,
        default_author_wallet: String,
        fallback_prompt: String,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            image_client,
            default_author_wallet,
            fallback_prompt,
            poll_interval,
            batch_size,
        }
    }

    /// One-shot startup step (§4.8): every `generating` row is an orphan
    /// from a prior process death, since this process only ever holds a
    /// token in `generating` across an external call, never across a
    /// restart.
    pub async fn reset_orphans(&self) -> Result<usize, StoreError> {
        let batch_size = self.batch_size;
        self.store
            .transaction(move |conn| {
                let mut reset = 0usize;
                loop {
                    let claimed = TokenRepo::claim(conn, TokenStatus::Generating, batch_size)?;
                    if claimed.is_empty() {
                        break;
                    }
                    for mut token in claimed {
                        token.orphan_reset()?;
                        TokenRepo::save(conn, &token)?;
                        reset += 1;
                    }
                }
                Ok(reset)
            })
            .await
    }

    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }
            match self.process_batch().await {
                Ok(0) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = cancel.cancelled() => return,
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "image_worker.batch_failed");
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = cancel.cancelled() => return,
                    }
                }
            }
        }
    }

    async fn process_batch(&self) -> Result<usize, StoreError> {
        let batch_size = self.batch_size;
        let token_ids: Vec<uuid::Uuid> = self
            .store
            .transaction(move |conn| {
                let claimed = TokenRepo::claim(conn, TokenStatus::Detected, batch_size)?;
                let mut ids = Vec::with_capacity(claimed.len());
                for mut token in claimed {
                    token.mark_generating()?;
                    TokenRepo::save(conn, &token)?;
                    ids.push(token.id);
                }
                Ok(ids)
            })
            .await?;

        for id in &token_ids {
            self.process_one(*id).await;
        }
        Ok(token_ids.len())
    }

    async fn process_one(&self, token_id: uuid::Uuid) {
        let resolved = self
            .store
            .transaction({
                let default_author_wallet = self.default_author_wallet.clone();
                move |conn| {
                    let token = TokenRepo::get_by_id(conn, token_id)?.ok_or(StoreError::NotFound)?;
                    let author = AuthorRepo::get_by_id(conn, token.author_id)?
                        .ok_or(StoreError::NotFound)?;
                    let prompt = match author.usable_prompt() {
                        Some(p) => Some(p.to_string()),
                        None => AuthorRepo::get_by_wallet(conn, &default_author_wallet)?
                            .and_then(|a| a.usable_prompt().map(str::to_string)),
                    };
                    Ok((token.token_id, prompt))
                }
            })
            .await;

        let (numeric_token_id, prompt) = match resolved {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "image_worker.resolve_failed");
                return;
            }
        };

        let Some(prompt) = prompt else {
            self.fail_permanently(token_id, numeric_token_id, "no prompt available for token or default author", String::new())
                .await;
            return;
        };

        if let Err(e) = validate_prompt(&prompt) {
            self.fail_permanently(token_id, numeric_token_id, &e.to_string(), prompt)
                .await;
            return;
        }

        match self.image_client.generate_image(&prompt).await {
            Ok(image_url) => {
                self.complete(token_id, numeric_token_id, &prompt, false, image_url)
                    .await;
            }
            Err(ServiceError::ContentPolicy(reason)) => {
                info!(token_id = numeric_token_id, reason = %reason, "token.generation.content_policy_retry");
                match self.image_client.generate_image(&self.fallback_prompt).await {
                    Ok(image_url) => {
                        self.complete(
                            token_id,
                            numeric_token_id,
                            &self.fallback_prompt,
                            true,
                            image_url,
                        )
                        .await;
                    }
                    Err(e) => {
                        self.fail_permanently(
                            token_id,
                            numeric_token_id,
                            &format!("fallback prompt also rejected: {e}"),
                            self.fallback_prompt.clone(),
                        )
                        .await;
                    }
                }
            }
            Err(ServiceError::Transient(reason)) => {
                self.retry(token_id, numeric_token_id, &prompt, &reason).await;
            }
            Err(ServiceError::Permanent(reason)) => {
                self.fail_permanently(token_id, numeric_token_id, &reason, prompt)
                    .await;
            }
        }
    }

    async fn complete(
        &self,
        token_id: uuid::Uuid,
        numeric_token_id: i64,
        prompt: &str,
        used_fallback: bool,
        image_url: String,
    ) {
        let prompt = prompt.to_string();
        let result = self
            .store
            .transaction(move |conn| {
                let mut token = TokenRepo::get_by_id(conn, token_id)?.ok_or(StoreError::NotFound)?;
                token.mark_uploading(image_url)?;
                TokenRepo::save(conn, &token)?;
                AuditRepo::record_image_job(
                    conn,
                    &NewImageGenerationJob {
                        token_id,
                        prompt_used: prompt,
                        used_fallback,
                        succeeded: true,
                        error: None,
                    },
                )?;
                Ok(())
            })
            .await;

        if let Err(e) = result {
            warn!(token_id = numeric_token_id, error = %e, "image_worker.complete_failed");
        } else {
            info!(token_id = numeric_token_id, "token.generation.completed");
        }
    }

    async fn retry(&self, token_id: uuid::Uuid, numeric_token_id: i64, prompt: &str, reason: &str) {
        let prompt = prompt.to_string();
        let reason = reason.to_string();
        let result = self
            .store
            .transaction(move |conn| {
                let mut token = TokenRepo::get_by_id(conn, token_id)?.ok_or(StoreError::NotFound)?;
                token.mark_retry(reason.clone());
                TokenRepo::save(conn, &token)?;
                AuditRepo::record_image_job(
                    conn,
                    &NewImageGenerationJob {
                        token_id,
                        prompt_used: prompt,
                        used_fallback: false,
                        succeeded: false,
                        error: Some(reason),
                    },
                )?;
                Ok(())
            })
            .await;

        if let Err(e) = result {
            warn!(token_id = numeric_token_id, error = %e, "image_worker.retry_failed");
        } else {
            info!(token_id = numeric_token_id, "token.generation.transient_retry_scheduled");
        }
    }

    async fn fail_permanently(
        &self,
        token_id: uuid::Uuid,
        numeric_token_id: i64,
        reason: &str,
        prompt: String,
    ) {
        let reason = reason.to_string();
        let result = self
            .store
            .transaction({
                let reason = reason.clone();
                move |conn| {
                    let mut token =
                        TokenRepo::get_by_id(conn, token_id)?.ok_or(StoreError::NotFound)?;
                    token.mark_failed(reason.clone())?;
                    TokenRepo::save(conn, &token)?;
                    AuditRepo::record_image_job(
                        conn,
                        &NewImageGenerationJob {
                            token_id,
                            prompt_used: prompt,
                            used_fallback: false,
                            succeeded: false,
                            error: Some(reason),
                        },
                    )?;
                    Ok(())
                }
            })
            .await;

        if let Err(e) = result {
            warn!(token_id = numeric_token_id, error = %e, "image_worker.fail_failed");
        } else {
            warn!(token_id = numeric_token_id, reason = %reason, "token.generation.permanently_failed");
        }
    }
}
