// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::mint_events;

/// One row per observed `BatchMinted` log. `(tx_hash, log_index)` is
/// unique — re-delivery of the same log is detected against this and
/// produces no new rows. Never mutated after insert.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = mint_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MintEvent {
    pub id: Uuid,
    pub tx_hash: String,
    pub log_index: i32,
    pub block_number: i64,
    pub block_timestamp: DateTime<Utc>,
    pub token_id: i64,
    pub author_wallet: String,
    pub recipient: String,
    pub detected_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = mint_events)]
pub struct NewMintEvent {
    pub tx_hash: String,
    pub log_index: i32,
    pub block_number: i64,
    pub block_timestamp: DateTime<Utc>,
    pub token_id: i64,
    pub author_wallet: String,
    pub recipient: String,
}
