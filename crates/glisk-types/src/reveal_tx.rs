// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::reveal_transactions;

/// Status of a submitted batch reveal transaction.
///
/// `Pending` covers the window between claim and submission. `Sent`
/// marks a transaction that was broadcast but whose confirmation wait
/// timed out, so its hash survives a restart for orphan reconciliation.
/// `Confirmed`/`Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealTxStatus {
    Pending,
    Sent,
    Confirmed,
    Failed,
}

impl RevealTxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevealTxStatus::Pending => "pending",
            RevealTxStatus::Sent => "sent",
            RevealTxStatus::Confirmed => "confirmed",
            RevealTxStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for RevealTxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RevealTxStatus::Pending),
            "sent" => Ok(RevealTxStatus::Sent),
            "confirmed" => Ok(RevealTxStatus::Confirmed),
            "failed" => Ok(RevealTxStatus::Failed),
            other => Err(format!("unknown reveal tx status: {other}")),
        }
    }
}

/// One row per submitted batch transaction. `token_ids.len()` is always
/// in `[1, 50]`.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = reveal_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RevealTransaction {
    pub id: Uuid,
    pub token_ids: Vec<i64>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
    pub gas_price: Option<BigDecimal>,
    #[diesel(column_name = status)]
    status_raw: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl RevealTransaction {
    pub fn status(&self) -> RevealTxStatus {
        self.status_raw
            .parse()
            .expect("status column holds only values written by this crate")
    }
}

#[derive(Insertable)]
#[diesel(table_name = reveal_transactions)]
pub struct NewRevealTransaction {
    pub token_ids: Vec<i64>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
    pub gas_price: Option<BigDecimal>,
    #[diesel(column_name = status)]
    pub status_raw: String,
}

impl NewRevealTransaction {
    pub fn pending(token_ids: Vec<i64>) -> Self {
        assert!(
            !token_ids.is_empty() && token_ids.len() <= 50,
            "batch size must be in [1, 50]"
        );
        Self {
            token_ids,
            tx_hash: None,
            block_number: None,
            gas_price: None,
            status_raw: RevealTxStatus::Pending.as_str().to_string(),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = reveal_transactions)]
pub struct RevealTransactionUpdate {
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
    pub gas_price: Option<BigDecimal>,
    #[diesel(column_name = status)]
    pub status_raw: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
}
