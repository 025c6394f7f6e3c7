use thiserror::Error;

/// Errors raised by the surfaces around the freshness core.
///
/// Freshness evaluation itself never fails: malformed cache headers fall back
/// to defaults. Only configuration loading and command line input can error.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
