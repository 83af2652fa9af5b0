use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// No extractable text at all. Processing cannot continue.
    #[error("Input unavailable: {0}")]
    InputUnavailable(String),
    #[error("Render failure on page {page}: {reason}")]
    RenderFailure { page: usize, reason: String },
    #[error("Face detection error: {0}")]
    Detection(String),
    #[error("Invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl DocumentError {
    pub fn render(page: usize, reason: impl Into<String>) -> Self {
        DocumentError::RenderFailure {
            page,
            reason: reason.into(),
        }
    }
}
