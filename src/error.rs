use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
