//! Error types for the custody core
//!
//! Every failure surfaces synchronously to the caller as a typed error with
//! a message and a machine-readable kind tag. Nothing is retried here; the
//! substrate owns atomic commit-or-abort per invocation.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CustodyError>;

/// Failure raised by the record store substrate.
///
/// Treated as fatal for the current invocation. Retries, if any, belong to
/// the substrate, not this core.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Typed failures surfaced by custody operations.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// Required field missing, empty, or of the wrong type in a payload.
    #[error("incomplete input: {0}")]
    IncompleteInput(String),

    /// An authorization rule denied the operation.
    #[error("invalid access: {0}")]
    InvalidAccess(String),

    /// Key absent with no valid erasure correlation.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// Duplicate create.
    #[error("asset {0} already exists")]
    AssetAlreadyExists(String),

    /// Malformed stored record or audit entry.
    #[error("malformed record: {0}")]
    Data(String),

    /// Substrate failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CustodyError {
    /// Machine-readable kind tag, stable across message changes.
    pub fn kind(&self) -> &'static str {
        match self {
            CustodyError::IncompleteInput(_) => "INCOMPLETE_INPUT",
            CustodyError::InvalidAccess(_) => "INVALID_ACCESS",
            CustodyError::AssetNotFound(_) => "ASSET_NOT_FOUND",
            CustodyError::AssetAlreadyExists(_) => "ASSET_ALREADY_EXISTS",
            CustodyError::Data(_) => "DATA_ERROR",
            CustodyError::Store(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(
            CustodyError::IncompleteInput("x".into()).kind(),
            "INCOMPLETE_INPUT"
        );
        assert_eq!(CustodyError::InvalidAccess("x".into()).kind(), "INVALID_ACCESS");
        assert_eq!(CustodyError::AssetNotFound("x".into()).kind(), "ASSET_NOT_FOUND");
        assert_eq!(
            CustodyError::AssetAlreadyExists("x".into()).kind(),
            "ASSET_ALREADY_EXISTS"
        );
        assert_eq!(CustodyError::Data("x".into()).kind(), "DATA_ERROR");
        assert_eq!(
            CustodyError::Store(StoreError::Unavailable("down".into())).kind(),
            "STORE_ERROR"
        );
    }

    #[test]
    fn store_errors_convert() {
        fn fails() -> Result<()> {
            let outcome: std::result::Result<(), StoreError> =
                Err(StoreError::Unavailable("peer gone".into()));
            outcome?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, CustodyError::Store(_)));
        assert!(err.to_string().contains("peer gone"));
    }
}
