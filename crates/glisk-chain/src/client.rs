// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, BlockNumber, Eip1559TransactionRequest, TransactionReceipt, U256};

use crate::abi::GliskNft;
use crate::error::ChainError;

pub type ReadProvider = Provider<Http>;
pub type KeeperMiddleware = SignerMiddleware<ReadProvider, LocalWallet>;

/// Read-only access to the contract: `nextTokenId`, `tokenPromptAuthor`,
/// `isRevealed`, `tokenURI`, and receipt lookups. Used by gap repair,
/// log replay, and startup orphan reconciliation.
#[derive(Clone)]
pub struct ChainReader {
    provider: Arc<ReadProvider>,
    contract: GliskNft<ReadProvider>,
}

impl ChainReader {
    pub fn new(rpc_url: &str, contract_address: Address) -> Result<Self, ChainError> {
        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| ChainError::Rpc(e.to_string()))?;
        let provider = Arc::new(provider);
        let contract = GliskNft::new(contract_address, Arc::clone(&provider));
        Ok(Self { provider, contract })
    }

    pub fn provider(&self) -> &Arc<ReadProvider> {
        &self.provider
    }

    /// `contract.nextTokenId()` with exponential backoff (1s, 2s, 4s) on
    /// RPC errors; a missing-function / bad-output error is fatal
    /// immediately since retrying won't help.
    pub async fn next_token_id(&self) -> Result<u64, ChainError> {
        let delays = [1u64, 2, 4];
        let mut last_err = None;
        for (attempt, delay) in delays.iter().enumerate() {
            match self.contract.next_token_id().call().await {
                Ok(value) => return Ok(value.as_u64()),
                Err(e) if is_contract_logic_error(&e) => {
                    return Err(ChainError::ContractNotFound(e.to_string()));
                }
                Err(e) => {
                    last_err = Some(e);
                    if attempt + 1 < delays.len() {
                        tokio::time::sleep(Duration::from_secs(*delay)).await;
                    }
                }
            }
        }
        Err(ChainError::Rpc(
            last_err.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }

    pub async fn token_prompt_author(&self, token_id: u64) -> Result<Address, ChainError> {
        self.contract
            .token_prompt_author(U256::from(token_id))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    pub async fn is_revealed(&self, token_id: u64) -> Result<bool, ChainError> {
        self.contract
            .is_revealed(U256::from(token_id))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    pub async fn token_uri(&self, token_id: u64) -> Result<String, ChainError> {
        self.contract
            .token_uri(U256::from(token_id))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: ethers::types::H256,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}

fn is_contract_logic_error(e: &ethers::contract::ContractError<ReadProvider>) -> bool {
    matches!(e, ethers::contract::ContractError::Revert(_))
        || matches!(e, ethers::contract::ContractError::DecodingError(_))
}

/// Extracts the IPFS content id from a `tokenURI` result of the form
/// `ipfs://<cid>`. Used by gap repair when a missing token turns out to
/// already be revealed on-chain.
pub fn extract_ipfs_cid(token_uri: &str) -> Result<String, ChainError> {
    token_uri
        .strip_prefix("ipfs://")
        .map(|s| s.to_string())
        .ok_or_else(|| ChainError::InvalidTokenUri(token_uri.to_string()))
}

/// EIP-1559 gas parameters computed for a batch reveal, with the
/// configured safety buffer already applied.
#[derive(Debug, Clone, Copy)]
pub struct GasPlan {
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Wraps a signing middleware around the contract for keeper writes:
/// gas estimation, submission, and confirmation wait.
pub struct KeeperClient {
    contract: GliskNft<KeeperMiddleware>,
    middleware: Arc<KeeperMiddleware>,
    gas_buffer: f64,
    max_gas_price: Option<U256>,
}

impl KeeperClient {
    pub async fn new(
        rpc_url: &str,
        contract_address: Address,
        private_key: &str,
        gas_buffer: f64,
        max_gas_price_wei: Option<U256>,
    ) -> Result<Self, ChainError> {
        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| ChainError::Rpc(e.to_string()))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let wallet: LocalWallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .with_chain_id(chain_id.as_u64());
        let middleware = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = GliskNft::new(contract_address, Arc::clone(&middleware));
        Ok(Self {
            contract,
            middleware,
            gas_buffer,
            max_gas_price: max_gas_price_wei,
        })
    }

    pub fn keeper_address(&self) -> Address {
        self.middleware.address()
    }

    /// Simulates `revealTokens`, reads current fee parameters, and
    /// computes EIP-1559 gas parameters with the configured buffer
    /// applied — `maxFee = 2*baseFee + bufferedPriority`,
    /// `maxPriority = basePriority * (1 + buffer)` per §4.7.
    pub async fn estimate_gas(
        &self,
        token_ids: &[U256],
        uris: &[String],
    ) -> Result<GasPlan, ChainError> {
        let call = self
            .contract
            .reveal_tokens(token_ids.to_vec(), uris.to_vec())
            .from(self.keeper_address());

        let estimated_gas = call
            .estimate_gas()
            .await
            .map_err(|e| ChainError::classify_estimation_failure(e.to_string()))?;
        let gas_limit = apply_buffer(estimated_gas, self.gas_buffer);

        let max_priority_fee = self
            .middleware
            .provider()
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| ChainError::classify_estimation_failure(e.to_string()))?;
        let latest = self
            .middleware
            .provider()
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| ChainError::classify_estimation_failure(e.to_string()))?
            .ok_or_else(|| ChainError::GasEstimation("latest block unavailable".to_string()))?;
        let base_fee = latest.base_fee_per_gas.unwrap_or_default();

        let max_priority_fee_buffered = apply_buffer(max_priority_fee, self.gas_buffer);
        let max_fee_per_gas = base_fee
            .saturating_mul(U256::from(2))
            .saturating_add(max_priority_fee_buffered);

        let max_fee_per_gas = match self.max_gas_price {
            Some(cap) => std::cmp::min(max_fee_per_gas, cap),
            None => max_fee_per_gas,
        };

        Ok(GasPlan {
            gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas: max_priority_fee_buffered,
        })
    }

    /// Builds, signs and sends the batch reveal transaction, then waits
    /// for the receipt up to `timeout`. Interprets `status == 1` as
    /// success, `status == 0` as a permanent on-chain revert.
    pub async fn reveal_batch(
        &self,
        token_ids: &[U256],
        uris: &[String],
        timeout: Duration,
    ) -> Result<TransactionReceipt, ChainError> {
        let plan = self.estimate_gas(token_ids, uris).await?;

        let nonce = self
            .middleware
            .get_transaction_count(self.keeper_address(), Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;

        let chain_id = self.middleware.signer().chain_id();

        let request = Eip1559TransactionRequest::new()
            .to(self.contract.address())
            .from(self.keeper_address())
            .nonce(nonce)
            .gas(plan.gas_limit)
            .max_fee_per_gas(plan.max_fee_per_gas)
            .max_priority_fee_per_gas(plan.max_priority_fee_per_gas)
            .chain_id(chain_id)
            .data(
                self.contract
                    .reveal_tokens(token_ids.to_vec(), uris.to_vec())
                    .calldata()
                    .unwrap_or_default(),
            );

        let pending = self
            .middleware
            .send_transaction(request, None)
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;
        let tx_hash = pending.tx_hash();

        let receipt = tokio::time::timeout(timeout, pending)
            .await
            .map_err(|_| ChainError::ConfirmationTimeout(Some(tx_hash)))?
            .map_err(|e| ChainError::Submission(e.to_string()))?
            .ok_or(ChainError::ConfirmationTimeout(Some(tx_hash)))?;

        if receipt.status == Some(0.into()) {
            return Err(ChainError::Reverted(format!(
                "tx {:?} reverted in block {:?}",
                receipt.transaction_hash, receipt.block_number
            )));
        }

        Ok(receipt)
    }
}

fn apply_buffer(value: U256, buffer: f64) -> U256 {
    let multiplier = ((1.0 + buffer) * 1_000.0).round() as u64;
    value.saturating_mul(U256::from(multiplier)) / U256::from(1_000u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_cid_strips_ipfs_scheme() {
        assert_eq!(extract_ipfs_cid("ipfs://bafy123").unwrap(), "bafy123");
    }

    #[test]
    fn extract_cid_rejects_non_ipfs_uri() {
        assert!(extract_ipfs_cid("https://example.com/1").is_err());
    }

    #[test]
    fn buffer_applies_20_percent() {
        let buffered = apply_buffer(U256::from(100_000u64), 0.20);
        assert_eq!(buffered, U256::from(120_000u64));
    }
}
