// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use once_cell::sync::Lazy;

/// `keccak256("BatchMinted(address,address,uint256,uint256,uint256)")`.
pub static BATCH_MINTED_SIGNATURE: Lazy<H256> = Lazy::new(|| {
    H256::from(keccak256(
        b"BatchMinted(address,address,uint256,uint256,uint256)",
    ))
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBatchMinted {
    pub minter: Address,
    pub prompt_author: Address,
    pub start_token_id: u64,
    pub quantity: u64,
    pub total_paid: U256,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected 4 topics, got {0}")]
    WrongTopicCount(usize),
    #[error("topics[0] does not match the BatchMinted signature")]
    SignatureMismatch,
    #[error("data section too short: {0} bytes, expected at least 64")]
    DataTooShort(usize),
    #[error("start_token_id overflows u64")]
    StartTokenIdOverflow,
    #[error("quantity overflows u64")]
    QuantityOverflow,
}

/// Decodes a `BatchMinted` log's `topics`/`data`.
///
/// `minter` = `topics[1]` last 20 bytes, `author` = `topics[2]` last 20
/// bytes, `startTokenId` = `topics[3]` as a full `uint256` — **not**
/// the data section, a common decoding mistake since `startTokenId` is
/// also `indexed` and therefore lives in topics, unlike `quantity` and
/// `totalPaid` which are packed into `data`.
pub fn decode_batch_minted(
    topics: &[H256],
    data: &[u8],
) -> Result<DecodedBatchMinted, DecodeError> {
    if topics.len() < 4 {
        return Err(DecodeError::WrongTopicCount(topics.len()));
    }
    if topics[0] != *BATCH_MINTED_SIGNATURE {
        return Err(DecodeError::SignatureMismatch);
    }
    if data.len() < 64 {
        return Err(DecodeError::DataTooShort(data.len()));
    }

    let minter = Address::from(topics[1]);
    let prompt_author = Address::from(topics[2]);

    let start_token_id_u256 = U256::from_big_endian(topics[3].as_bytes());
    let start_token_id = start_token_id_u256
        .try_into()
        .map_err(|_| DecodeError::StartTokenIdOverflow)?;

    let quantity_u256 = U256::from_big_endian(&data[0..32]);
    let quantity: u64 = quantity_u256
        .try_into()
        .map_err(|_| DecodeError::QuantityOverflow)?;

    let total_paid = U256::from_big_endian(&data[32..64]);

    Ok(DecodedBatchMinted {
        minter,
        prompt_author,
        start_token_id,
        quantity,
        total_paid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_from_address(addr: Address) -> H256 {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(addr.as_bytes());
        H256::from(bytes)
    }

    fn topic_from_u256(v: U256) -> H256 {
        let mut bytes = [0u8; 32];
        v.to_big_endian(&mut bytes);
        H256::from(bytes)
    }

    fn sample_log() -> (Vec<H256>, Vec<u8>) {
        let minter: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();
        let author: Address = "0x2222222222222222222222222222222222222222"
            .parse()
            .unwrap();
        let topics = vec![
            *BATCH_MINTED_SIGNATURE,
            topic_from_address(minter),
            topic_from_address(author),
            topic_from_u256(U256::from(10u64)),
        ];
        let mut data = vec![0u8; 64];
        U256::from(3u64).to_big_endian(&mut data[0..32]);
        U256::from(1_000_000u64).to_big_endian(&mut data[32..64]);
        (topics, data)
    }

    #[test]
    fn decodes_happy_path() {
        let (topics, data) = sample_log();
        let decoded = decode_batch_minted(&topics, &data).unwrap();
        assert_eq!(decoded.start_token_id, 10);
        assert_eq!(decoded.quantity, 3);
        assert_eq!(decoded.total_paid, U256::from(1_000_000u64));
    }

    #[test]
    fn start_token_id_comes_from_topics_not_data() {
        // If the decoder mistakenly read start_token_id from the data
        // section it would see `quantity` (3) here instead of 10.
        let (topics, data) = sample_log();
        let decoded = decode_batch_minted(&topics, &data).unwrap();
        assert_ne!(decoded.start_token_id, decoded.quantity);
        assert_eq!(decoded.start_token_id, 10);
    }

    #[test]
    fn rejects_wrong_topic_count() {
        let (mut topics, data) = sample_log();
        topics.pop();
        assert_eq!(
            decode_batch_minted(&topics, &data),
            Err(DecodeError::WrongTopicCount(3))
        );
    }

    #[test]
    fn rejects_signature_mismatch() {
        let (mut topics, data) = sample_log();
        topics[0] = H256::zero();
        assert_eq!(
            decode_batch_minted(&topics, &data),
            Err(DecodeError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_short_data() {
        let (topics, _) = sample_log();
        assert_eq!(
            decode_batch_minted(&topics, &[0u8; 10]),
            Err(DecodeError::DataTooShort(10))
        );
    }
}
