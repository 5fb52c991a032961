use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Failure of a single backend call
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status
    #[error("request failed with status {status}{}", detail_suffix(.detail))]
    Api {
        status: StatusCode,
        detail: Option<String>,
    },

    /// Connect, timeout or decode failure
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl BackendError {
    /// `detail` field of the backend's error payload, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Api { detail, .. } => detail.as_deref(),
            BackendError::Transport(_) => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Transport(err) => err.status(),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_detail() {
        let err = BackendError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: Some("db down".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "request failed with status 500 Internal Server Error: db down"
        );
        assert_eq!(err.detail(), Some("db down"));
    }

    #[test]
    fn test_api_error_display_without_detail() {
        let err = BackendError::Api {
            status: StatusCode::BAD_GATEWAY,
            detail: None,
        };
        assert_eq!(err.to_string(), "request failed with status 502 Bad Gateway");
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert!(err.detail().is_none());
    }
}
