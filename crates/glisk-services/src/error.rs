// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

/// Classification shared by the image-generation and IPFS-pinning
/// clients (§7): workers branch on this, not on the raw transport
/// error, to decide whether to retry, fall back, or give up.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("transient: {0}")]
    Transient(String),

    #[error("content policy violation: {0}")]
    ContentPolicy(String),

    #[error("permanent: {0}")]
    Permanent(String),
}

impl ServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }

    pub fn is_content_policy(&self) -> bool {
        matches!(self, ServiceError::ContentPolicy(_))
    }

    /// Classifies an HTTP status code and response body the way both
    /// the image and pinning clients need to: 429/5xx are transient,
    /// 401/403/400 are permanent, content-policy language in the body
    /// overrides to `ContentPolicy` regardless of status.
    pub fn from_status(status: u16, body: &str) -> Self {
        let lower = body.to_lowercase();
        if lower.contains("content policy")
            || lower.contains("nsfw")
            || lower.contains("safety")
            || lower.contains("inappropriate")
        {
            return ServiceError::ContentPolicy(format!("{status}: {body}"));
        }
        match status {
            429 => ServiceError::Transient(format!("rate limited (429): {body}")),
            500..=599 => ServiceError::Transient(format!("upstream {status}: {body}")),
            401 | 403 => ServiceError::Permanent(format!("authentication failed ({status}): {body}")),
            400 => ServiceError::Permanent(format!("bad request (400): {body}")),
            _ => ServiceError::Permanent(format!("unexpected status {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_transient() {
        assert!(ServiceError::from_status(429, "slow down").is_transient());
    }

    #[test]
    fn server_error_is_transient() {
        assert!(ServiceError::from_status(503, "down").is_transient());
    }

    #[test]
    fn auth_failure_is_permanent() {
        let e = ServiceError::from_status(401, "bad token");
        assert!(!e.is_transient() && !e.is_content_policy());
    }

    #[test]
    fn content_policy_language_overrides_status() {
        let e = ServiceError::from_status(400, "flagged for NSFW content");
        assert!(e.is_content_policy());
    }
}
