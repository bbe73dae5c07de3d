use std::io;

#[derive(Debug, thiserror::Error)]
pub enum LdifError {
    #[error("parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("line width must be greater than zero")]
    InvalidLineWidth,

    #[error("unsupported line separator {0:?}")]
    InvalidLineSeparator(String),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("base64 decode error")]
    Base64Decode,
}

pub type Result<T> = std::result::Result<T, LdifError>;
