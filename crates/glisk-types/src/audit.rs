// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{image_generation_jobs, ipfs_upload_records};

/// Append-only per-attempt record of an image generation call. Carries
/// no invariants the pipeline relies on; exists for operator debugging.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = image_generation_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageGenerationJob {
    pub id: Uuid,
    pub token_id: Uuid,
    pub prompt_used: String,
    pub used_fallback: bool,
    pub succeeded: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = image_generation_jobs)]
pub struct NewImageGenerationJob {
    pub token_id: Uuid,
    pub prompt_used: String,
    pub used_fallback: bool,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// Kind of content pinned to the content-addressed store.
pub mod upload_kind {
    pub const IMAGE: &str = "image";
    pub const METADATA: &str = "metadata";
}

/// Append-only per-attempt record of a pin call (image bytes or the
/// derived metadata JSON).
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = ipfs_upload_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IpfsUploadRecord {
    pub id: Uuid,
    pub token_id: Uuid,
    pub kind: String,
    pub content_id: Option<String>,
    pub succeeded: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = ipfs_upload_records)]
pub struct NewIpfsUploadRecord {
    pub token_id: Uuid,
    pub kind: String,
    pub content_id: Option<String>,
    pub succeeded: bool,
    pub error: Option<String>,
}
