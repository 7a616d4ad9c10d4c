// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! Connection pool, migrations and repositories. Every repository
//! method takes `&mut PgConnection` and is meant to be called from
//! inside a `Store::transaction` closure — see `pool::Store` for the
//! per-token transaction discipline this crate is built around.

pub mod error;
pub mod pool;
pub mod repo;

pub use error::StoreError;
pub use pool::{PgPool, PgPooledConnection, Store};
pub use repo::{AuditRepo, AuthorRepo, MintEventRepo, RevealTxRepo, SystemStateRepo, TokenRepo};
