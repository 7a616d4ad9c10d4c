// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::health::health;
use crate::state::AppState;
use crate::status::list_author_tokens;
use crate::webhook::receive_alchemy_webhook;

pub fn build_router(state: AppState, cors_origins: Vec<String>) -> Router {
    let cors = if cors_origins.is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<_> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    Router::new()
        .route("/webhooks/alchemy", post(receive_alchemy_webhook))
        .route("/api/authors/:wallet/tokens", get(list_author_tokens))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
