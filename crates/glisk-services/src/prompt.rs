// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use crate::error::ServiceError;

/// Validates a resolved prompt before sending it to the image API:
/// non-empty, at most 1000 characters.
pub fn validate_prompt(prompt: &str) -> Result<&str, ServiceError> {
    if prompt.trim().is_empty() {
        return Err(ServiceError::Permanent("prompt is empty".to_string()));
    }
    if prompt.chars().count() > 1000 {
        return Err(ServiceError::Permanent(format!(
            "prompt exceeds maximum length of 1000 characters (got {})",
            prompt.chars().count()
        )));
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(validate_prompt("").is_err());
        assert!(validate_prompt("   ").is_err());
    }

    #[test]
    fn rejects_too_long() {
        let prompt = "a".repeat(1001);
        assert!(validate_prompt(&prompt).is_err());
    }

    #[test]
    fn accepts_valid() {
        assert!(validate_prompt("a friendly robot").is_ok());
    }
}
