// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use serde_json::{json, Value};

/// Builds the ERC-721 metadata record for a revealed token: name,
/// description, `image: ipfs://<cid>`, and an X-handle attribute when
/// the author has one on file.
pub fn build_metadata(token_id: i64, image_cid: &str, twitter_handle: Option<&str>) -> Value {
    let mut attributes = Vec::new();
    if let Some(handle) = twitter_handle.filter(|h| !h.trim().is_empty()) {
        attributes.push(json!({
            "trait_type": "Author X Handle",
            "value": format!("@{handle}"),
        }));
    }

    json!({
        "name": format!("GLISK S0 #{token_id}"),
        "description": "GLISK Season 0. https://x.com/getglisk",
        "image": format!("ipfs://{image_cid}"),
        "attributes": attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_handle_attribute_when_present() {
        let metadata = build_metadata(42, "bafy123", Some("getglisk"));
        assert_eq!(metadata["name"], "GLISK S0 #42");
        assert_eq!(metadata["image"], "ipfs://bafy123");
        assert_eq!(metadata["attributes"][0]["value"], "@getglisk");
    }

    #[test]
    fn omits_attribute_when_handle_absent() {
        let metadata = build_metadata(7, "bafy456", None);
        assert_eq!(metadata["attributes"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn omits_attribute_when_handle_blank() {
        let metadata = build_metadata(7, "bafy456", Some("   "));
        assert_eq!(metadata["attributes"].as_array().unwrap().len(), 0);
    }
}
