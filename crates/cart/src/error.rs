//! Unified error handling for cart operations.
//!
//! These errors never reach the shopper: cart operations catch them at the
//! operation boundary, log them, and surface a fixed message through the
//! notifier instead. They are returned directly only while opening a store.

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Error type for cart store internals.
#[derive(Debug, Error)]
pub enum CartError {
    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The catalog answered with a different product than requested.
    #[error("Catalog returned product {received} when {requested} was requested")]
    UnexpectedProduct {
        requested: ProductId,
        received: ProductId,
    },
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
