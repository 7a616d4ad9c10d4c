// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("RPC call failed: {0}")]
    Rpc(String),

    #[error("store operation failed: {0}")]
    Store(String),

    #[error("contract not found at configured address, or function missing: {0}")]
    ContractNotFound(String),

    #[error("gas estimation failed: {0}")]
    GasEstimation(String),

    #[error("transaction submission failed: {0}")]
    Submission(String),

    #[error("transaction confirmation timed out{}", .0.map(|h| format!(" (tx {h:#x})")).unwrap_or_default())]
    ConfirmationTimeout(Option<ethers::types::H256>),

    #[error("transaction reverted on-chain: {0}")]
    Reverted(String),

    #[error("invalid tokenURI: {0}")]
    InvalidTokenUri(String),
}

impl ChainError {
    /// Maps a raw provider error message to an actionable classification,
    /// mirroring the keeper's `insufficient funds` / `execution reverted`
    /// operator-facing context.
    pub fn classify_estimation_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let context = if lower.contains("insufficient funds") {
            format!(
                "keeper wallet has insufficient balance for gas: {message}. \
                 fund the wallet or adjust the gas buffer."
            )
        } else if lower.contains("execution reverted") {
            format!(
                "transaction simulation reverted: {message}. \
                 verify token ids are valid and not already revealed."
            )
        } else {
            message
        };
        ChainError::GasEstimation(context)
    }
}
