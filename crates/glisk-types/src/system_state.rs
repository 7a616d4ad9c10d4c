// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::schema::system_state;

/// The watermark key; `SystemState.value` holds a JSON integer.
pub const LAST_PROCESSED_BLOCK: &str = "last_processed_block";

/// A key/value register over JSON values. Tiny operational bookkeeping
/// store, not a general cache: today it holds a single watermark, and
/// new keys should stay similarly small and singleton-scoped.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = system_state)]
#[diesel(primary_key(key))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SystemState {
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = system_state)]
#[diesel(primary_key(key))]
pub struct UpsertSystemState {
    pub key: String,
    pub value: Value,
}
