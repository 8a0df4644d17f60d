use thiserror::Error;

#[derive(Debug, Error)]
pub enum S3Error {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("bucket unreachable: {0}")]
    Unreachable(String),
}
