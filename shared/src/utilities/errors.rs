#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config value {0} could not be parsed")]
    InvalidConfigValueError(String),
    #[error("{0}")]
    FileReadError(String),
    #[error("Url parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Serde json error: {0}")]
    SerdejsonError(#[from] serde_json::Error),
    #[error("Validation errors, {0}")]
    ValidatorValidationErrors(#[from] validator::ValidationErrors),
    #[error("Storage error, {0}")]
    StorageError(String),
    #[error("Search error, {0}")]
    SearchError(#[from] SearchError),
    #[error("Search controller stopped error")]
    ControllerStoppedError,
}

/// Outcome of a failed search or suggestion request.
///
/// Zero results is not an error; it comes back as an empty page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Network error, {0}")]
    NetworkError(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Server error (status {status}), {message}")]
    ServerError { status: u16, message: String },
    #[error("Failed to decode response, {0}")]
    DecodeError(String),
    #[error("Request was superseded")]
    Cancelled,
}

impl SearchError {
    /// Whether the same request may be sent again as-is.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// `Cancelled` is swallowed at the guard and never rendered.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::DecodeError(e.to_string())
        } else if let Some(status) = e.status() {
            Self::ServerError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::NetworkError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        Self::DecodeError(e.to_string())
    }
}
