// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use glisk_types::InvalidStateTransition;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to initialize connection pool: {0}")]
    PoolInit(#[source] diesel::r2d2::PoolError),

    #[error("failed to check out connection: {0}")]
    PoolCheckout(#[source] diesel::r2d2::PoolError),

    #[error("blocking task panicked: {0}")]
    Join(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error(transparent)]
    Query(#[from] diesel::result::Error),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidStateTransition),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Invariant(String),
}

impl StoreError {
    /// `true` when the store reports this row or unique key already
    /// exists — used by ingestion and gap repair to distinguish a race
    /// against another writer from a genuine failure.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Query(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}
