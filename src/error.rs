use thiserror::Error;

use crate::shape::Shape;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("expected a record at the root, found a {0}")]
    NotARecord(Shape),

    #[error("cycle detected at `{path}`")]
    Cycle { path: String },

    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },

    #[error("could not parse URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unexpected status code: {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
