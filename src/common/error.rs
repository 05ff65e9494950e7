use rust_tokenizers::error::TokenizerError;
use tch::TchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RustUdError {
    #[error("Model not available: {0}")]
    ModelNotAvailableError(String),

    #[error("Endpoint not available error: {0}")]
    FileDownloadError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Tch tensor error: {0}")]
    TchError(String),

    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    #[error("Invalid configuration error: {0}")]
    InvalidConfigurationError(String),

    #[error("Visualization server error: {0}")]
    ServerError(String),
}

impl From<std::io::Error> for RustUdError {
    fn from(error: std::io::Error) -> Self {
        RustUdError::IOError(error.to_string())
    }
}

impl From<TokenizerError> for RustUdError {
    fn from(error: TokenizerError) -> Self {
        RustUdError::TokenizerError(error.to_string())
    }
}

impl From<TchError> for RustUdError {
    fn from(error: TchError) -> Self {
        RustUdError::TchError(error.to_string())
    }
}

#[cfg(feature = "remote")]
impl From<cached_path::Error> for RustUdError {
    fn from(error: cached_path::Error) -> Self {
        RustUdError::FileDownloadError(error.to_string())
    }
}
