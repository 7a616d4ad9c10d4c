// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! EVM RPC client, `BatchMinted` event decoding, and the two chain
//! catch-up mechanisms: gap repair (primary) and log replay (secondary,
//! operator-invoked).

mod abi;
pub mod checksum;
pub mod client;
pub mod decode;
pub mod error;
pub mod gap_repair;
pub mod ingest;
pub mod log_replay;

pub use checksum::to_checksum;
pub use client::{extract_ipfs_cid, ChainReader, GasPlan, KeeperClient, KeeperMiddleware, ReadProvider};
pub use decode::{decode_batch_minted, DecodeError, DecodedBatchMinted, BATCH_MINTED_SIGNATURE};
pub use error::ChainError;
pub use gap_repair::{repair_gaps, GapRepairReport};
pub use ingest::{persist_batch_minted, PersistOutcome};
pub use log_replay::{replay_logs, ReplayReport};
