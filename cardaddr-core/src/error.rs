//! Crate-level error type for I/O, parsing, and configuration failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardAddrError {
    #[error("parse error [{code}]: {message}")]
    Parse { code: &'static str, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CardAddrError {
    pub fn parse(code: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CardAddrError>;
