// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ethers::types::Address;
use glisk_store::{AuthorRepo, StoreError, TokenRepo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    offset: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
struct TokenSummary {
    token_id: i64,
    status: String,
    image_cid: Option<String>,
    metadata_cid: Option<String>,
    reveal_tx_hash: Option<String>,
    generation_error: Option<String>,
}

/// `GET /api/authors/{wallet}/tokens?offset=&limit=`. Unknown wallets
/// return an empty page, never an error — the wallet may simply never
/// have minted.
pub async fn list_author_tokens(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(pagination): Query<Pagination>,
) -> (StatusCode, Json<Value>) {
    if wallet.parse::<Address>().is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": "wallet is not a valid address" })),
        );
    }

    let offset = pagination.offset.max(0);
    let limit = pagination.limit.clamp(1, 100);

    let result = state
        .store
        .transaction(move |conn| {
            let Some(author) = AuthorRepo::get_by_wallet(conn, &wallet)? else {
                return Ok(None);
            };
            let (tokens, total) = TokenRepo::list_by_author(conn, author.id, limit, offset)?;
            Ok(Some((tokens, total)))
        })
        .await;

    match result {
        Ok(Some((tokens, total))) => {
            let items: Vec<TokenSummary> = tokens
                .into_iter()
                .map(|t| TokenSummary {
                    token_id: t.token_id,
                    status: t.status().to_string(),
                    image_cid: t.image_cid,
                    metadata_cid: t.metadata_cid,
                    reveal_tx_hash: t.reveal_tx_hash,
                    generation_error: t.generation_error,
                })
                .collect();
            (
                StatusCode::OK,
                Json(json!({ "items": items, "total": total, "offset": offset, "limit": limit })),
            )
        }
        Ok(None) => (
            StatusCode::OK,
            Json(json!({ "items": [], "total": 0, "offset": offset, "limit": limit })),
        ),
        Err(StoreError::NotFound) => (
            StatusCode::OK,
            Json(json!({ "items": [], "total": 0, "offset": offset, "limit": limit })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": e.to_string() })),
        ),
    }
}
