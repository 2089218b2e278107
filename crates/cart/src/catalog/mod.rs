//! Remote product and stock source.
//!
//! # Architecture
//!
//! - The catalog is the source of truth for product details and stock
//! - [`Catalog`] is the seam the cart store depends on; tests swap in fakes
//! - [`HttpCatalog`] talks to the REST API with `reqwest`, caching product
//!   details via `moka` (stock is always fetched fresh)
//!
//! # Endpoints
//!
//! - `GET {base}/products/{id}` - product details
//! - `GET {base}/stock/{id}` - available amount

mod http;

pub use http::HttpCatalog;

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("Catalog returned {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request URL could not be built.
    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),

    /// The call did not finish within the configured time limit.
    #[error("Catalog call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Capability exposing product details and stock levels.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the details of a product.
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError>;

    /// Fetch the available stock of a product.
    async fn stock(&self, id: ProductId) -> Result<Stock, CatalogError>;
}
