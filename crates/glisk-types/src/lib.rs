// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared by every crate in the pipeline: the schema,
//! entity structs, and the token state machine. No I/O lives here.

pub mod audit;
pub mod author;
pub mod mint_event;
pub mod reveal_tx;
pub mod schema;
pub mod system_state;
pub mod token;

pub use audit::{
    upload_kind, ImageGenerationJob, IpfsUploadRecord, NewImageGenerationJob, NewIpfsUploadRecord,
};
pub use author::{Author, NewAuthor};
pub use mint_event::{MintEvent, NewMintEvent};
pub use reveal_tx::{NewRevealTransaction, RevealTransaction, RevealTransactionUpdate, RevealTxStatus};
pub use system_state::{SystemState, UpsertSystemState, LAST_PROCESSED_BLOCK};
pub use token::{InvalidStateTransition, NewToken, Token, TokenStatus};
