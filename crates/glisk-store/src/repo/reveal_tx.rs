// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use chrono::Utc;
use diesel::prelude::*;
use glisk_types::schema::reveal_transactions;
use glisk_types::{NewRevealTransaction, RevealTransaction, RevealTxStatus};

use crate::error::StoreError;

pub struct RevealTxRepo;

impl RevealTxRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_tx: &NewRevealTransaction,
    ) -> Result<RevealTransaction, StoreError> {
        diesel::insert_into(reveal_transactions::table)
            .values(new_tx)
            .get_result(conn)
            .map_err(StoreError::from)
    }

    pub fn mark_confirmed(
        conn: &mut PgConnection,
        id: uuid::Uuid,
        tx_hash: &str,
        block_number: i64,
    ) -> Result<(), StoreError> {
        diesel::update(reveal_transactions::table.find(id))
            .set((
                reveal_transactions::status.eq(RevealTxStatus::Confirmed.as_str()),
                reveal_transactions::tx_hash.eq(tx_hash),
                reveal_transactions::block_number.eq(block_number),
                reveal_transactions::confirmed_at.eq(Utc::now()),
            ))
            .execute(conn)
            .map(|_| ())
            .map_err(StoreError::from)
    }

    /// Records the tx hash once a batch has been submitted but not yet
    /// confirmed, so a process restart's orphan scan (§4.7) can resolve
    /// it by querying the receipt instead of losing track of it.
    pub fn mark_sent(conn: &mut PgConnection, id: uuid::Uuid, tx_hash: &str) -> Result<(), StoreError> {
        diesel::update(reveal_transactions::table.find(id))
            .set((
                reveal_transactions::status.eq(RevealTxStatus::Sent.as_str()),
                reveal_transactions::tx_hash.eq(tx_hash),
            ))
            .execute(conn)
            .map(|_| ())
            .map_err(StoreError::from)
    }

    pub fn mark_failed(conn: &mut PgConnection, id: uuid::Uuid) -> Result<(), StoreError> {
        diesel::update(reveal_transactions::table.find(id))
            .set(reveal_transactions::status.eq(RevealTxStatus::Failed.as_str()))
            .execute(conn)
            .map(|_| ())
            .map_err(StoreError::from)
    }

    /// Rows left `pending` or `sent` across a restart — the startup
    /// orphan reconciliation scan of §4.7.
    pub fn unresolved(conn: &mut PgConnection) -> Result<Vec<RevealTransaction>, StoreError> {
        reveal_transactions::table
            .filter(
                reveal_transactions::status
                    .eq(RevealTxStatus::Pending.as_str())
                    .or(reveal_transactions::status.eq(RevealTxStatus::Sent.as_str())),
            )
            .select(RevealTransaction::as_select())
            .load(conn)
            .map_err(StoreError::from)
    }
}
