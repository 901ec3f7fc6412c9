use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudyBoltError>;

#[derive(Debug, Error)]
pub enum StudyBoltError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{service} returned HTTP {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{service} did not respond within {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StudyBoltError {
    /// True for failures caused by a third-party service rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::Network(_) | Self::Decode { .. } | Self::Timeout { .. }
        )
    }
}

impl StudyBoltError {
    /// Classify a reqwest failure: timeouts and body decoding get their own variants.
    pub fn from_transport(service: &'static str, after: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { service, after }
        } else if err.is_decode() {
            Self::Decode {
                service,
                message: err.to_string(),
            }
        } else {
            Self::Network(err)
        }
    }
}

impl From<redis::RedisError> for StudyBoltError {
    fn from(err: redis::RedisError) -> Self {
        Self::CacheUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_classification() {
        let upstream = StudyBoltError::Upstream {
            service: "serpapi",
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(upstream.is_upstream());
        assert!(StudyBoltError::Timeout {
            service: "mistral",
            after: Duration::from_secs(1)
        }
        .is_upstream());

        assert!(!StudyBoltError::Validation("empty".into()).is_upstream());
        assert!(!StudyBoltError::CacheUnavailable("down".into()).is_upstream());
    }

    #[test]
    fn upstream_message_names_service_and_status() {
        let err = StudyBoltError::Upstream {
            service: "mistral",
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "mistral returned HTTP 401: unauthorized");
    }
}
