// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use glisk_types::schema::system_state;
use glisk_types::UpsertSystemState;
use serde_json::Value;

use crate::error::StoreError;

pub struct SystemStateRepo;

impl SystemStateRepo {
    pub fn get(conn: &mut PgConnection, key: &str) -> Result<Option<Value>, StoreError> {
        system_state::table
            .find(key)
            .select(system_state::value)
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    /// Upsert semantics per the data model: callers never need to know
    /// whether the key pre-exists.
    pub fn set(conn: &mut PgConnection, key: &str, value: Value) -> Result<(), StoreError> {
        let row = UpsertSystemState {
            key: key.to_string(),
            value,
        };
        diesel::insert_into(system_state::table)
            .values(&row)
            .on_conflict(system_state::key)
            .do_update()
            .set((
                system_state::value.eq(&row.value),
                system_state::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(conn)
            .map(|_| ())
            .map_err(StoreError::from)
    }

    pub fn get_last_processed_block(conn: &mut PgConnection) -> Result<Option<i64>, StoreError> {
        Ok(Self::get(conn, glisk_types::LAST_PROCESSED_BLOCK)?
            .and_then(|v| v.as_i64()))
    }

    pub fn set_last_processed_block(
        conn: &mut PgConnection,
        block: i64,
    ) -> Result<(), StoreError> {
        Self::set(
            conn,
            glisk_types::LAST_PROCESSED_BLOCK,
            Value::from(block),
        )
    }
}
