// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use glisk_services::{build_metadata, PinningClient, ServiceError};
use glisk_store::{AuditRepo, AuthorRepo, Store, StoreError, TokenRepo};
use glisk_types::{upload_kind, NewIpfsUploadRecord, TokenStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Claims `uploading` tokens, pins image bytes and derived metadata,
/// and drives each to `ready` (§4.6).
pub struct ContentUploadWorker {
    store: Store,
    pinning_client: Arc<PinningClient>,
    poll_interval: Duration,
    batch_size: i64,
}

impl ContentUploadWorker {
    pub fn new(
        store: Store,
        pinning_client: Arc<PinningClient>,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            pinning_client,
            poll_interval,
            batch_size,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }
            match self.process_batch().await {
                Ok(0) | Err(_) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = cancel.cancelled() => return,
                    }
                }
                Ok(_) => {}
            }
        }
    }

    async fn process_batch(&self) -> Result<usize, StoreError> {
        let batch_size = self.batch_size;
        let token_ids: Vec<uuid::Uuid> = self
            .store
            .transaction(move |conn| {
                let claimed = TokenRepo::claim(conn, TokenStatus::Uploading, batch_size)?;
                Ok(claimed.into_iter().map(|t| t.id).collect())
            })
            .await?;

        for id in &token_ids {
            self.process_one(*id).await;
        }
        Ok(token_ids.len())
    }

    async fn process_one(&self, token_id: uuid::Uuid) {
        let fetched = self
            .store
            .transaction(move |conn| {
                let token = TokenRepo::get_by_id(conn, token_id)?.ok_or(StoreError::NotFound)?;
                let author = AuthorRepo::get_by_id(conn, token.author_id)?;
                Ok((
                    token.token_id,
                    token.image_url.clone(),
                    author.and_then(|a| a.twitter_handle),
                ))
            })
            .await;

        let (numeric_token_id, image_url, twitter_handle) = match fetched {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "upload_worker.resolve_failed");
                return;
            }
        };

        let Some(image_url) = image_url else {
            self.fail(token_id, numeric_token_id, "uploading".to_string(), "token has no image_url".to_string())
                .await;
            return;
        };

        match self.pinning_client.pin_image(&image_url, numeric_token_id).await {
            Ok(image_cid) => {
                self.record_pin(token_id, upload_kind::IMAGE, Some(image_cid.clone()), true, None)
                    .await;
                self.pin_metadata(token_id, numeric_token_id, image_cid, twitter_handle)
                    .await;
            }
            Err(ServiceError::Transient(reason)) => {
                self.record_pin(token_id, upload_kind::IMAGE, None, false, Some(reason.clone()))
                    .await;
                info!(token_id = numeric_token_id, reason = %reason, "token.upload.transient_retry");
            }
            Err(e) => {
                self.record_pin(token_id, upload_kind::IMAGE, None, false, Some(e.to_string()))
                    .await;
                self.fail(token_id, numeric_token_id, "image".to_string(), e.to_string())
                    .await;
            }
        }
    }

    async fn pin_metadata(
        &self,
        token_id: uuid::Uuid,
        numeric_token_id: i64,
        image_cid: String,
        twitter_handle: Option<String>,
    ) {
        let metadata = build_metadata(numeric_token_id, &image_cid, twitter_handle.as_deref());
        match self.pinning_client.pin_metadata(&metadata, numeric_token_id).await {
            Ok(metadata_cid) => {
                self.record_pin(
                    token_id,
                    upload_kind::METADATA,
                    Some(metadata_cid.clone()),
                    true,
                    None,
                )
                .await;
                self.complete(token_id, numeric_token_id, image_cid, metadata_cid).await;
            }
            Err(ServiceError::Transient(reason)) => {
                self.record_pin(
                    token_id,
                    upload_kind::METADATA,
                    None,
                    false,
                    Some(reason.clone()),
                )
                .await;
                info!(token_id = numeric_token_id, reason = %reason, "token.upload.transient_retry");
            }
            Err(e) => {
                self.record_pin(token_id, upload_kind::METADATA, None, false, Some(e.to_string()))
                    .await;
                self.fail(token_id, numeric_token_id, "metadata".to_string(), e.to_string())
                    .await;
            }
        }
    }

    async fn complete(
        &self,
        token_id: uuid::Uuid,
        numeric_token_id: i64,
        image_cid: String,
        metadata_cid: String,
    ) {
        let result = self
            .store
            .transaction(move |conn| {
                let mut token = TokenRepo::get_by_id(conn, token_id)?.ok_or(StoreError::NotFound)?;
                token.mark_ready(image_cid, metadata_cid)?;
                TokenRepo::save(conn, &token)
            })
            .await;

        match result {
            Ok(()) => info!(token_id = numeric_token_id, "token.upload.completed"),
            Err(e) => warn!(token_id = numeric_token_id, error = %e, "upload_worker.complete_failed"),
        }
    }

    async fn record_pin(
        &self,
        token_id: uuid::Uuid,
        kind: &str,
        content_id: Option<String>,
        succeeded: bool,
        error: Option<String>,
    ) {
        let kind = kind.to_string();
        let result = self
            .store
            .transaction(move |conn| {
                AuditRepo::record_upload(
                    conn,
                    &NewIpfsUploadRecord {
                        token_id,
                        kind,
                        content_id,
                        succeeded,
                        error,
                    },
                )
            })
            .await;
        if let Err(e) = result {
            warn!(error = %e, "upload_worker.audit_write_failed");
        }
    }

    async fn fail(&self, token_id: uuid::Uuid, numeric_token_id: i64, stage: String, reason: String) {
        let message = format!("{stage} pin failed permanently: {reason}");
        let result = self
            .store
            .transaction(move |conn| {
                let mut token = TokenRepo::get_by_id(conn, token_id)?.ok_or(StoreError::NotFound)?;
                token.mark_failed(message)?;
                TokenRepo::save(conn, &token)
            })
            .await;
        if let Err(e) = result {
            warn!(token_id = numeric_token_id, error = %e, "upload_worker.fail_failed");
        } else {
            warn!(token_id = numeric_token_id, "token.upload.permanently_failed");
        }
    }
}
