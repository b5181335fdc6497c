use thiserror::Error;

#[derive(Debug, Error)]
/// Errors raised while talking to the content API.
pub enum ApiError {
    /// Transport failure (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{url} responded with {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// No document matched the request.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The repository root listed no master ref to query against.
    #[error("repository has no master ref")]
    NoMasterRef,
}

/// Result of content API operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, url: &str) -> Self {
        match status {
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(url.to_string()),
            _ => Self::Status {
                status,
                url: url.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        let err = ApiError::from_http_status(reqwest::StatusCode::NOT_FOUND, "https://x/api");
        assert!(err.is_not_found());

        let err = ApiError::from_http_status(reqwest::StatusCode::UNAUTHORIZED, "https://x/api");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "https://x/api responded with 401 Unauthorized");
    }
}
