//! Server application errors.

use thiserror::Error;
use visage::cache::StoreError;
use visage::invoker::InvokerError;

/// Errors that can occur during server startup and serving.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to open the durable asset store.
    #[error("failed to open durable store: {0}")]
    DurableStore(StoreError),

    /// Failed to construct the model host client.
    #[error("failed to configure model host: {0}")]
    Invoker(#[from] InvokerError),

    /// Failed to construct the asset fetcher.
    #[error("failed to create asset fetcher: {0}")]
    AssetFetcher(StoreError),

    /// Failed to bind the listen address.
    #[error("failed to bind listener: {0}")]
    Bind(std::io::Error),

    /// The HTTP server exited with an error.
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("cannot determine cache directory".to_string());
        assert!(err.to_string().contains("configuration error"));
        assert!(err.to_string().contains("cache directory"));
    }

    #[test]
    fn test_invoker_error_converts() {
        let err: AppError = InvokerError::InvalidDeployment("nope".to_string()).into();
        assert!(matches!(err, AppError::Invoker(_)));
    }
}
