// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use ethers::types::Address;

/// Normalizes an address to its EIP-55 mixed-case checksum form. Both
/// the webhook decoder and the gap-repair path route addresses through
/// this so the same wallet always produces the same string for the
/// case-insensitive `Author` lookup.
pub fn to_checksum(address: &Address) -> String {
    ethers::utils::to_checksum(address, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksums_lowercase_input() {
        let addr: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .unwrap();
        let checksummed = to_checksum(&addr);
        assert_eq!(checksummed, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }
}
