// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::authors;

/// An author profile. Created and mutated by the (out-of-scope)
/// author-profile endpoints; the pipeline only ever reads it.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Author {
    pub id: Uuid,
    pub wallet_address: String,
    pub prompt_text: Option<String>,
    pub twitter_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Author {
    /// Prompt to hand to the image generation worker, or `None` if this
    /// author hasn't set one (the caller then substitutes the default
    /// author's prompt per the "missing author" policy).
    pub fn usable_prompt(&self) -> Option<&str> {
        self.prompt_text
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

#[derive(Insertable)]
#[diesel(table_name = authors)]
pub struct NewAuthor {
    pub wallet_address: String,
    pub prompt_text: Option<String>,
    pub twitter_handle: Option<String>,
}
