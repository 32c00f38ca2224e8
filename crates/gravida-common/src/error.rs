use thiserror::Error;

#[derive(Debug, Error)]
pub enum GravidaError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Security policy violation: {0}")]
    SecurityError(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GravidaError>;
