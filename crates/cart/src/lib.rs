//! RocketShoes cart library.
//!
//! A client-side shopping cart state container. The [`CartStore`] keeps the
//! shopper's cart in memory and in a persisted storage slot, checks quantity
//! changes against a remote stock source, and reports failures through a
//! notifier.
//!
//! # Capabilities
//!
//! The store depends on three injected collaborators:
//!
//! - [`Catalog`] - product details and stock ([`HttpCatalog`] for REST)
//! - [`CartStorage`] - the persisted slot ([`FileStorage`], [`MemoryStorage`])
//! - [`Notifier`] - user-facing messages ([`TracingNotifier`], [`ChannelNotifier`])
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rocketshoes_cart::{CartConfig, CartStore, ChannelNotifier};
//! use rocketshoes_core::ProductId;
//!
//! let config = CartConfig::from_env()?;
//! let (notifier, mut messages) = ChannelNotifier::channel();
//! let store = CartStore::from_config(&config, Arc::new(notifier)).await?;
//!
//! store.add_product(ProductId::new(1)).await;
//! println!("{} items", store.cart().total_items());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use catalog::{Catalog, CatalogError, HttpCatalog};
pub use config::{CartConfig, CatalogConfig, ConfigError, DEFAULT_CATALOG_TIMEOUT};
pub use error::CartError;
pub use notify::{ChannelNotifier, Notifier, TracingNotifier, messages};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{CartOutcome, CartStore};
