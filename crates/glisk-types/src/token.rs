// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::tokens_s0;

/// Lifecycle status of a minted token. Stored as text in Postgres (not a
/// native enum) so new terminal-adjacent states can be added without a
/// migration that rewrites the column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Detected,
    Generating,
    Uploading,
    Ready,
    Submitting,
    Revealed,
    Failed,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Detected => "detected",
            TokenStatus::Generating => "generating",
            TokenStatus::Uploading => "uploading",
            TokenStatus::Ready => "ready",
            TokenStatus::Submitting => "submitting",
            TokenStatus::Revealed => "revealed",
            TokenStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenStatus::Revealed | TokenStatus::Failed)
    }
}

impl std::str::FromStr for TokenStatus {
    type Err = InvalidStateTransition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detected" => Ok(TokenStatus::Detected),
            "generating" => Ok(TokenStatus::Generating),
            "uploading" => Ok(TokenStatus::Uploading),
            "ready" => Ok(TokenStatus::Ready),
            "submitting" => Ok(TokenStatus::Submitting),
            "revealed" => Ok(TokenStatus::Revealed),
            "failed" => Ok(TokenStatus::Failed),
            other => Err(InvalidStateTransition::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a caller attempts a transition not in the state machine.
/// A bug signal, not a runtime condition: normal flows never hit this.
#[derive(Debug, thiserror::Error)]
pub enum InvalidStateTransition {
    #[error("cannot transition from {from} to {to}: not an allowed edge")]
    IllegalEdge {
        from: TokenStatus,
        to: &'static str,
    },
    #[error("cannot transition terminal state {0}")]
    Terminal(TokenStatus),
    #[error("unknown token status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = tokens_s0)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Token {
    pub id: Uuid,
    pub token_id: i64,
    pub author_id: Uuid,
    #[diesel(column_name = status)]
    status_raw: String,
    pub image_url: Option<String>,
    pub image_cid: Option<String>,
    pub metadata_cid: Option<String>,
    pub reveal_tx_hash: Option<String>,
    pub generation_attempts: i32,
    pub generation_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn status(&self) -> TokenStatus {
        self.status_raw
            .parse()
            .expect("status column holds only values written by this crate")
    }

    /// `detected -> generating`. Only the image-generation worker calls this.
    pub fn mark_generating(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(TokenStatus::Detected, "generating")?;
        self.status_raw = TokenStatus::Generating.as_str().to_string();
        Ok(())
    }

    /// `generating -> uploading`, recording the CDN image URL.
    pub fn mark_uploading(&mut self, image_url: String) -> Result<(), InvalidStateTransition> {
        self.require(TokenStatus::Generating, "uploading")?;
        self.image_url = Some(image_url);
        self.status_raw = TokenStatus::Uploading.as_str().to_string();
        Ok(())
    }

    /// `uploading -> ready`. Both cids are set together, exactly once.
    pub fn mark_ready(
        &mut self,
        image_cid: String,
        metadata_cid: String,
    ) -> Result<(), InvalidStateTransition> {
        self.require(TokenStatus::Uploading, "ready")?;
        self.image_cid = Some(image_cid);
        self.metadata_cid = Some(metadata_cid);
        self.status_raw = TokenStatus::Ready.as_str().to_string();
        Ok(())
    }

    /// `ready -> submitting`. Claimed into a reveal batch; holding this
    /// status (not the row lock) across the batch's gas estimation and
    /// submission keeps a second process from re-claiming the same
    /// tokens while the first submission is in flight.
    pub fn mark_submitting(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(TokenStatus::Ready, "submitting")?;
        self.status_raw = TokenStatus::Submitting.as_str().to_string();
        Ok(())
    }

    /// `submitting -> revealed`.
    pub fn mark_revealed(&mut self, tx_hash: Option<String>) -> Result<(), InvalidStateTransition> {
        self.require(TokenStatus::Submitting, "revealed")?;
        self.reveal_tx_hash = tx_hash;
        self.status_raw = TokenStatus::Revealed.as_str().to_string();
        Ok(())
    }

    /// `submitting -> ready`. Releases a token back to the reveal pool
    /// after a reverted, timed-out, or otherwise failed submission so it
    /// is eligible for the next batch.
    pub fn release_submission(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(TokenStatus::Submitting, "ready")?;
        self.status_raw = TokenStatus::Ready.as_str().to_string();
        Ok(())
    }

    /// Any non-terminal state -> `failed`. Error string is truncated to
    /// 1000 chars per the data model invariant.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), InvalidStateTransition> {
        let current = self.status();
        if current.is_terminal() {
            return Err(InvalidStateTransition::Terminal(current));
        }
        let mut error = error.into();
        error.truncate(1000);
        self.generation_error = Some(error);
        self.status_raw = TokenStatus::Failed.as_str().to_string();
        Ok(())
    }

    /// Transient failure: stay replayable. Increments the attempts
    /// counter and records the error, but leaves (or resets to) `detected`
    /// so the natural poll loop retries on a later tick.
    pub fn mark_retry(&mut self, error: impl Into<String>) {
        self.generation_attempts += 1;
        let mut error = error.into();
        error.truncate(1000);
        self.generation_error = Some(error);
        self.status_raw = TokenStatus::Detected.as_str().to_string();
    }

    /// The back-edge `generating -> detected`, performed only by the
    /// supervisor's startup orphan reset, never by normal workflow.
    pub fn orphan_reset(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(TokenStatus::Generating, "detected")?;
        self.status_raw = TokenStatus::Detected.as_str().to_string();
        Ok(())
    }

    fn require(
        &self,
        expected: TokenStatus,
        to: &'static str,
    ) -> Result<(), InvalidStateTransition> {
        let current = self.status();
        if current != expected {
            return Err(InvalidStateTransition::IllegalEdge { from: current, to });
        }
        Ok(())
    }
}

#[derive(Insertable)]
#[diesel(table_name = tokens_s0)]
pub struct NewToken {
    pub token_id: i64,
    pub author_id: Uuid,
    #[diesel(column_name = status)]
    pub status_raw: String,
    pub image_cid: Option<String>,
    pub metadata_cid: Option<String>,
    pub reveal_tx_hash: Option<String>,
}

impl NewToken {
    pub fn detected(token_id: i64, author_id: Uuid) -> Self {
        Self {
            token_id,
            author_id,
            status_raw: TokenStatus::Detected.as_str().to_string(),
            image_cid: None,
            metadata_cid: None,
            reveal_tx_hash: None,
        }
    }

    /// Used by gap repair when a missing token is discovered already
    /// revealed on-chain: inserted directly as `revealed`, no tx hash
    /// recorded because this system did not submit the reveal.
    pub fn already_revealed(token_id: i64, author_id: Uuid, metadata_cid: String) -> Self {
        Self {
            token_id,
            author_id,
            status_raw: TokenStatus::Revealed.as_str().to_string(),
            image_cid: None,
            metadata_cid: Some(metadata_cid),
            reveal_tx_hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(status: TokenStatus) -> Token {
        Token {
            id: Uuid::new_v4(),
            token_id: 1,
            author_id: Uuid::new_v4(),
            status_raw: status.as_str().to_string(),
            image_url: None,
            image_cid: None,
            metadata_cid: None,
            reveal_tx_hash: None,
            generation_attempts: 0,
            generation_error: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn happy_path_transitions() {
        let mut t = token_with(TokenStatus::Detected);
        t.mark_generating().unwrap();
        assert_eq!(t.status(), TokenStatus::Generating);
        t.mark_uploading("https://cdn/x.png".into()).unwrap();
        assert_eq!(t.status(), TokenStatus::Uploading);
        t.mark_ready("cidA".into(), "cidB".into()).unwrap();
        assert_eq!(t.status(), TokenStatus::Ready);
        t.mark_submitting().unwrap();
        assert_eq!(t.status(), TokenStatus::Submitting);
        t.mark_revealed(Some("0xabc".into())).unwrap();
        assert_eq!(t.status(), TokenStatus::Revealed);
    }

    #[test]
    fn submission_can_be_released_back_to_ready() {
        let mut t = token_with(TokenStatus::Ready);
        t.mark_submitting().unwrap();
        t.release_submission().unwrap();
        assert_eq!(t.status(), TokenStatus::Ready);
        t.mark_submitting().unwrap();
        assert_eq!(t.status(), TokenStatus::Submitting);
    }

    #[test]
    fn release_submission_rejected_outside_submitting() {
        let mut t = token_with(TokenStatus::Ready);
        assert!(t.release_submission().is_err());
    }

    #[test]
    fn illegal_edge_rejected() {
        let mut t = token_with(TokenStatus::Detected);
        assert!(t.mark_uploading("u".into()).is_err());
    }

    #[test]
    fn terminal_states_never_change() {
        let mut t = token_with(TokenStatus::Revealed);
        assert!(t.mark_failed("boom").is_err());
        let mut f = token_with(TokenStatus::Failed);
        assert!(f.mark_generating().is_err());
    }

    #[test]
    fn failed_reachable_from_any_nonterminal_state() {
        for s in [
            TokenStatus::Detected,
            TokenStatus::Generating,
            TokenStatus::Uploading,
            TokenStatus::Ready,
            TokenStatus::Submitting,
        ] {
            let mut t = token_with(s);
            t.mark_failed("permanent").unwrap();
            assert_eq!(t.status(), TokenStatus::Failed);
        }
    }

    #[test]
    fn orphan_reset_only_from_generating() {
        let mut t = token_with(TokenStatus::Generating);
        t.orphan_reset().unwrap();
        assert_eq!(t.status(), TokenStatus::Detected);

        let mut t2 = token_with(TokenStatus::Uploading);
        assert!(t2.orphan_reset().is_err());
    }

    #[test]
    fn error_message_truncated_to_1000_chars() {
        let mut t = token_with(TokenStatus::Detected);
        let long = "x".repeat(5000);
        t.mark_failed(long).unwrap();
        assert_eq!(t.generation_error.unwrap().len(), 1000);
    }
}
