use thiserror::Error;

#[derive(Debug, Error)]
pub enum LuminaryError {
    #[error("Response catalog IO error: {0}")]
    CatalogIo(#[from] std::io::Error),

    #[error("Response catalog JSON parsing error: {0}")]
    CatalogJson(#[from] serde_json::Error),

    #[error("Invalid response catalog: {0}")]
    InvalidCatalog(String),

    #[error("Unsupported history store type: {0}")]
    UnsupportedHistoryStore(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
