// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::StoreError;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Thin wrapper around the connection pool. Every stage worker claims a
/// batch under one short transaction and processes each token under its
/// own, re-reading the row by id, so a connection is never held idle
/// across an external call. `Store` is the factory that hands out those
/// transaction handles; it holds no mutable state of its own.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn connect(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(StoreError::PoolInit)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs pending migrations. Must happen before gap repair per the
    /// required startup order (migrate -> gap repair -> supervisor spawn
    /// -> accept HTTP).
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(StoreError::PoolCheckout)?;
            conn.run_pending_migrations(MIGRATIONS)
                .map(|_| ())
                .map_err(|e| StoreError::Migration(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    /// Runs `f` inside a single Postgres transaction on a blocking
    /// worker thread, committing on `Ok` and rolling back on `Err`.
    /// This is the "commit at well-defined decision points" idiom the
    /// per-token workers rely on: callers decide, inside `f`, exactly
    /// what gets persisted.
    pub async fn transaction<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(StoreError::PoolCheckout)?;
            conn.transaction(|conn| f(conn).map_err(StoreTxAbort::from))
                .map_err(StoreTxAbort::into_store_error)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

/// Bridges our `StoreError` through diesel's transaction closure, which
/// requires the error type to implement `From<diesel::result::Error>`.
enum StoreTxAbort {
    Store(StoreError),
    Diesel(diesel::result::Error),
}

impl From<StoreError> for StoreTxAbort {
    fn from(e: StoreError) -> Self {
        StoreTxAbort::Store(e)
    }
}

impl From<diesel::result::Error> for StoreTxAbort {
    fn from(e: diesel::result::Error) -> Self {
        StoreTxAbort::Diesel(e)
    }
}

impl StoreTxAbort {
    fn into_store_error(self) -> StoreError {
        match self {
            StoreTxAbort::Store(e) => e,
            StoreTxAbort::Diesel(e) => StoreError::Query(e),
        }
    }
}
