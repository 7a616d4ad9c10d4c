// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel::sql_types::BigInt;
use glisk_types::schema::tokens_s0;
use glisk_types::{NewToken, Token, TokenStatus};
use uuid::Uuid;

use crate::error::StoreError;

pub struct TokenRepo;

impl TokenRepo {
    pub fn get_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Token>, StoreError> {
        tokens_s0::table
            .find(id)
            .select(Token::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    pub fn get_by_token_id(
        conn: &mut PgConnection,
        token_id: i64,
    ) -> Result<Option<Token>, StoreError> {
        tokens_s0::table
            .filter(tokens_s0::token_id.eq(token_id))
            .select(Token::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::from)
    }

    pub fn insert(conn: &mut PgConnection, new_token: &NewToken) -> Result<Token, StoreError> {
        diesel::insert_into(tokens_s0::table)
            .values(new_token)
            .get_result(conn)
            .map_err(StoreError::from)
    }

    /// The work-leasing claim at the heart of §4.4: selects up to
    /// `limit` tokens in `status`, ordered ascending by `created_at`,
    /// locking the rows `FOR UPDATE SKIP LOCKED` so concurrent workers
    /// never receive overlapping sets. Must be called inside the
    /// transaction that will advance (or release) the returned rows.
    pub fn claim(
        conn: &mut PgConnection,
        status: TokenStatus,
        limit: i64,
    ) -> Result<Vec<Token>, StoreError> {
        tokens_s0::table
            .filter(tokens_s0::status.eq(status.as_str()))
            .order(tokens_s0::created_at.asc())
            .limit(limit)
            .for_update()
            .skip_locked()
            .select(Token::as_select())
            .load(conn)
            .map_err(StoreError::from)
    }

    pub fn save(conn: &mut PgConnection, token: &Token) -> Result<(), StoreError> {
        diesel::update(tokens_s0::table.find(token.id))
            .set((
                tokens_s0::status.eq(token.status().as_str()),
                tokens_s0::image_url.eq(&token.image_url),
                tokens_s0::image_cid.eq(&token.image_cid),
                tokens_s0::metadata_cid.eq(&token.metadata_cid),
                tokens_s0::reveal_tx_hash.eq(&token.reveal_tx_hash),
                tokens_s0::generation_attempts.eq(token.generation_attempts),
                tokens_s0::generation_error.eq(&token.generation_error),
            ))
            .execute(conn)
            .map(|_| ())
            .map_err(StoreError::from)
    }

    /// Unlocked read of every token currently in `status`. Used by
    /// startup reconciliation, which needs to see the full set before
    /// deciding what to release, not to lease it.
    pub fn list_by_status(
        conn: &mut PgConnection,
        status: TokenStatus,
    ) -> Result<Vec<Token>, StoreError> {
        tokens_s0::table
            .filter(tokens_s0::status.eq(status.as_str()))
            .select(Token::as_select())
            .load(conn)
            .map_err(StoreError::from)
    }

    /// Paginated per-author listing for the status read API (§4.9),
    /// newest first.
    pub fn list_by_author(
        conn: &mut PgConnection,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Token>, i64), StoreError> {
        let items = tokens_s0::table
            .filter(tokens_s0::author_id.eq(author_id))
            .order(tokens_s0::created_at.desc())
            .limit(limit)
            .offset(offset)
            .select(Token::as_select())
            .load(conn)?;
        let total: i64 = tokens_s0::table
            .filter(tokens_s0::author_id.eq(author_id))
            .count()
            .get_result(conn)?;
        Ok((items, total))
    }

    /// `generate_series` LEFT JOIN used by gap repair (§4.3a) to find
    /// token ids that exist on-chain (`[1, max_token_id)`) but not in
    /// the store, in a single query bounded by an optional `limit`.
    pub fn missing_token_ids(
        conn: &mut PgConnection,
        max_token_id_exclusive: i64,
        limit: Option<i64>,
    ) -> Result<Vec<i64>, StoreError> {
        if max_token_id_exclusive <= 1 {
            return Ok(Vec::new());
        }
        #[derive(QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            token_id: i64,
        }
        let rows: Vec<Row> = match limit {
            Some(limit) => diesel::sql_query(
                "SELECT series.token_id \
                 FROM generate_series(1, $1) AS series(token_id) \
                 LEFT JOIN tokens_s0 ON series.token_id = tokens_s0.token_id \
                 WHERE tokens_s0.token_id IS NULL \
                 ORDER BY series.token_id ASC LIMIT $2",
            )
            .bind::<BigInt, _>(max_token_id_exclusive - 1)
            .bind::<BigInt, _>(limit)
            .load(conn)?,
            None => diesel::sql_query(
                "SELECT series.token_id \
                 FROM generate_series(1, $1) AS series(token_id) \
                 LEFT JOIN tokens_s0 ON series.token_id = tokens_s0.token_id \
                 WHERE tokens_s0.token_id IS NULL \
                 ORDER BY series.token_id ASC",
            )
            .bind::<BigInt, _>(max_token_id_exclusive - 1)
            .load(conn)?,
        };
        Ok(rows.into_iter().map(|r| r.token_id).collect())
    }
}
