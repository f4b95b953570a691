//! # Error Module
//!
//! The scoring functions never fail: degenerate input propagates as NaN.
//! These errors come from boundary validation, catalog lookup and the
//! reading store.

use thiserror::Error;

/// Errors raised by canopy-core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A species parameter that must be strictly positive and finite is not.
    #[error("invalid species '{species}': {field} must be positive and finite, got {value}")]
    InvalidSpecies {
        species: String,
        field: &'static str,
        value: f64,
    },

    /// A sensor reading carries a NaN or infinite value.
    #[error("invalid sensor reading: {field} is not finite ({value})")]
    NonFiniteSensor { field: &'static str, value: f64 },

    /// The catalog has no species under this key.
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    /// A device identifier was empty, too long or held control characters.
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),

    /// The embedded database failed.
    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),

    /// A stored record could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),
}

/// Result type used across canopy-core.
pub type Result<T> = std::result::Result<T, CoreError>;

macro_rules! storage_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CoreError {
                fn from(err: $ty) -> Self {
                    CoreError::Storage(redb::Error::from(err))
                }
            }
        )*
    };
}

storage_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
