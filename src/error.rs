use thiserror::Error;

/// Failure talking to the remote catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Catalog responded with status {0}")]
    Status(u16),

    #[error("Malformed catalog payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Failure reading or writing durable storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write {key}: {reason}")]
    Write { key: String, reason: String },
}

/// Persisted or cross-context payload that could not be decoded
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Snapshot is not a JSON object")]
    NotAnObject,
}

/// Side-effect failures inside the store; logged, never returned to callers
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
