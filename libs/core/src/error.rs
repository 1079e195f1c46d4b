use thiserror::Error;

/// Which upstream API produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Shopify,
    Slack,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Shopify => "shopify",
            Upstream::Slack => "slack",
        }
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure talking to one of the upstream REST APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{upstream} transport error: {source}")]
    Transport {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },
    #[error("{upstream} returned status {status}: {body}")]
    Status {
        upstream: Upstream,
        status: u16,
        body: String,
    },
    #[error("{upstream} rejected the request: {error}")]
    Rejected { upstream: Upstream, error: String },
    #[error("{upstream} response could not be decoded: {source}")]
    Decode {
        upstream: Upstream,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn upstream(&self) -> Upstream {
        match self {
            ApiError::Transport { upstream, .. }
            | ApiError::Status { upstream, .. }
            | ApiError::Rejected { upstream, .. }
            | ApiError::Decode { upstream, .. } => *upstream,
        }
    }

    /// Short machine-readable code used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport { .. } => "transport",
            ApiError::Status { .. } => "status",
            ApiError::Rejected { .. } => "rejected",
            ApiError::Decode { .. } => "decode",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_upstream() {
        let err = ApiError::Status {
            upstream: Upstream::Shopify,
            status: 404,
            body: "{\"errors\":\"Not Found\"}".into(),
        };
        assert_eq!(
            err.to_string(),
            "shopify returned status 404: {\"errors\":\"Not Found\"}"
        );
        assert_eq!(err.code(), "status");

        let err = ApiError::Rejected {
            upstream: Upstream::Slack,
            error: "channel_not_found".into(),
        };
        assert_eq!(err.upstream(), Upstream::Slack);
        assert_eq!(
            err.to_string(),
            "slack rejected the request: channel_not_found"
        );
    }
}
