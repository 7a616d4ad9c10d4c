// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Validates the `X-Alchemy-Signature` header: hex HMAC-SHA256 of the
/// raw request body, keyed by the webhook signing secret. Comparison
/// is constant-time to avoid leaking the expected signature through
/// response timing.
pub fn validate_signature(raw_body: &[u8], signature_hex: &str, signing_key: &str) -> bool {
    let Ok(expected_bytes) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(signing_key.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_signature() {
        let body = b"{\"webhookId\":\"wh_123\"}";
        let key = "shared_secret";
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());
        assert!(validate_signature(body, &signature, key));
    }

    #[test]
    fn rejects_tampered_body() {
        let key = "shared_secret";
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).unwrap();
        mac.update(b"original");
        let signature = hex::encode(mac.finalize().into_bytes());
        assert!(!validate_signature(b"tampered", &signature, key));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(!validate_signature(b"body", "not-hex", "key"));
    }

    #[test]
    fn accepts_uppercase_hex() {
        let body = b"payload";
        let key = "k";
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes()).to_uppercase();
        assert!(validate_signature(body, &signature, key));
    }
}
