// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel::TextExpressionMethods;
use glisk_types::schema::authors;
use glisk_types::Author;
use uuid::Uuid;

use crate::error::StoreError;

pub struct AuthorRepo;

impl AuthorRepo {
    pub fn get_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Author>, StoreError> {
        authors::table
            .find(id)
            .select(Author::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    /// Case-insensitive lookup by wallet address — the single policy
    /// point callers use before falling back to the configured default
    /// author.
    pub fn get_by_wallet(
        conn: &mut PgConnection,
        wallet: &str,
    ) -> Result<Option<Author>, StoreError> {
        authors::table
            .filter(authors::wallet_address.ilike(wallet))
            .select(Author::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    /// Resolves the effective author for a mint: the author referenced
    /// by `wallet`, or the configured default author if absent. Returns
    /// `Err(StoreError::NotFound)` only if even the default is missing,
    /// which is a deployment misconfiguration.
    pub fn resolve_or_default(
        conn: &mut PgConnection,
        wallet: &str,
        default_wallet: &str,
    ) -> Result<Author, StoreError> {
        if let Some(author) = Self::get_by_wallet(conn, wallet)? {
            return Ok(author);
        }
        Self::get_by_wallet(conn, default_wallet)?.ok_or(StoreError::NotFound)
    }
}
