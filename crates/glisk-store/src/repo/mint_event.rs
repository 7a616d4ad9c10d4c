// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use glisk_types::schema::mint_events;
use glisk_types::{MintEvent, NewMintEvent};

use crate::error::StoreError;

pub struct MintEventRepo;

impl MintEventRepo {
    /// `(tx_hash, log_index)` uniqueness check backing "at-most-once
    /// persistence" — the property a duplicate webhook delivery or a
    /// re-run log replay relies on.
    pub fn exists(
        conn: &mut PgConnection,
        tx_hash: &str,
        log_index: i32,
    ) -> Result<bool, StoreError> {
        let count: i64 = mint_events::table
            .filter(mint_events::tx_hash.eq(tx_hash))
            .filter(mint_events::log_index.eq(log_index))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    }

    pub fn insert(conn: &mut PgConnection, event: &NewMintEvent) -> Result<MintEvent, StoreError> {
        diesel::insert_into(mint_events::table)
            .values(event)
            .get_result(conn)
            .map_err(StoreError::from)
    }
}
