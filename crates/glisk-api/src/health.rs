// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /health`. Probes the pool with a trivial query; 503 on any
/// connectivity problem so a load balancer can route around this
/// instance instead of sending it traffic it can't serve.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let probe = state
        .store
        .transaction(|conn| diesel::sql_query("SELECT 1").execute(conn).map(|_| ()))
        .await;

    match probe {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "error_class": "store",
                "message": e.to_string(),
            })),
        ),
    }
}
