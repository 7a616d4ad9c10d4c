// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! Diesel table definitions. Hand-written to mirror
//! `crates/glisk-store/migrations/`; regenerate with `diesel print-schema`
//! if the migrations change.

diesel::table! {
    authors (id) {
        id -> Uuid,
        wallet_address -> Varchar,
        prompt_text -> Nullable<Text>,
        twitter_handle -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tokens_s0 (id) {
        id -> Uuid,
        token_id -> Int8,
        author_id -> Uuid,
        status -> Varchar,
        image_url -> Nullable<Text>,
        image_cid -> Nullable<Varchar>,
        metadata_cid -> Nullable<Varchar>,
        reveal_tx_hash -> Nullable<Varchar>,
        generation_attempts -> Int4,
        generation_error -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    mint_events (id) {
        id -> Uuid,
        tx_hash -> Varchar,
        log_index -> Int4,
        block_number -> Int8,
        block_timestamp -> Timestamptz,
        token_id -> Int8,
        author_wallet -> Varchar,
        recipient -> Varchar,
        detected_at -> Timestamptz,
    }
}

diesel::table! {
    reveal_transactions (id) {
        id -> Uuid,
        token_ids -> Array<Int8>,
        tx_hash -> Nullable<Varchar>,
        block_number -> Nullable<Int8>,
        gas_price -> Nullable<Numeric>,
        status -> Varchar,
        created_at -> Timestamptz,
        confirmed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    system_state (key) {
        key -> Varchar,
        value -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    image_generation_jobs (id) {
        id -> Uuid,
        token_id -> Uuid,
        prompt_used -> Text,
        used_fallback -> Bool,
        succeeded -> Bool,
        error -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ipfs_upload_records (id) {
        id -> Uuid,
        token_id -> Uuid,
        kind -> Varchar,
        content_id -> Nullable<Varchar>,
        succeeded -> Bool,
        error -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(tokens_s0 -> authors (author_id));
diesel::joinable!(image_generation_jobs -> tokens_s0 (token_id));
diesel::joinable!(ipfs_upload_records -> tokens_s0 (token_id));

diesel::allow_tables_to_appear_in_same_query!(
    authors,
    tokens_s0,
    mint_events,
    reveal_transactions,
    system_state,
    image_generation_jobs,
    ipfs_upload_records,
);
