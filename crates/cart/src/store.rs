//! The cart state container.
//!
//! [`CartStore`] owns the shopper's cart for the session. It is restored from
//! the storage slot when opened, mutated only through
//! [`CartStore::add_product`], [`CartStore::remove_product`] and
//! [`CartStore::update_product_amount`], and published to subscribers after
//! every committed change.
//!
//! # Consistency
//!
//! Operations are serialized: each one holds the cart lock from its first
//! read until it commits or gives up, including while it waits on the
//! catalog. Each catalog call is bounded by a time limit so a hung request
//! fails its own operation instead of blocking the session. A commit serializes the fully computed next cart, saves it, and
//! only then swaps it into memory, so a failed save never leaves memory and
//! storage disagreeing.
//!
//! # Failures
//!
//! No operation returns an error. Every failure path sends exactly one
//! message through the [`Notifier`]; success paths send none. The returned
//! [`CartOutcome`] lets programmatic callers tell the cases apart.

use std::sync::Arc;
use std::time::Duration;

use rocketshoes_core::{Cart, CartItem, ProductId, UpdateProductAmount};
use tokio::sync::{Mutex, watch};
use tracing::instrument;

use crate::catalog::{Catalog, CatalogError, HttpCatalog};
use crate::config::{CartConfig, DEFAULT_CATALOG_TIMEOUT};
use crate::error::{CartError, Result};
use crate::notify::{Notifier, messages};
use crate::storage::{CartStorage, FileStorage};

/// What a cart operation ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOutcome {
    /// The cart changed and was persisted.
    Updated,
    /// Validation or stock check refused the change.
    Rejected,
    /// The catalog or storage failed; the cart is unchanged.
    Failed,
}

/// Shared handle to the session's cart.
///
/// Cheaply cloneable via `Arc`; clones operate on the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn CartStorage>,
    notifier: Arc<dyn Notifier>,
    /// Limit for a single catalog call made under the cart lock.
    catalog_timeout: Duration,
    /// Working copy; held for the whole duration of an operation.
    cart: Mutex<Cart>,
    /// Last committed cart.
    committed: watch::Sender<Cart>,
}

impl CartStore {
    /// Open the store, restoring the cart from `storage` if it holds one.
    ///
    /// Persisted entries that break the cart invariants are dropped, and
    /// unreadable contents are discarded; both are logged.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the slot cannot be read.
    pub async fn open(
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn CartStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Self::open_with_timeout(catalog, storage, notifier, DEFAULT_CATALOG_TIMEOUT).await
    }

    /// Open the store with a custom limit for each catalog call.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the slot cannot be read.
    pub async fn open_with_timeout(
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn CartStorage>,
        notifier: Arc<dyn Notifier>,
        catalog_timeout: Duration,
    ) -> Result<Self> {
        let cart = match storage.load().await? {
            Some(serialized) => restore(&serialized),
            None => Cart::new(),
        };

        tracing::debug!(items = cart.len(), "Cart store opened");

        let (committed, _) = watch::channel(cart.clone());

        Ok(Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                storage,
                notifier,
                catalog_timeout,
                cart: Mutex::new(cart),
                committed,
            }),
        })
    }

    /// Open a store wired to the HTTP catalog and file storage from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, the storage key is
    /// invalid, or the slot cannot be read.
    pub async fn from_config(config: &CartConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let catalog = HttpCatalog::new(&config.catalog)?;
        let storage = FileStorage::new(&config.storage_dir, &config.storage_key)?;
        Self::open_with_timeout(
            Arc::new(catalog),
            Arc::new(storage),
            notifier,
            config.catalog.timeout,
        )
        .await
    }

    /// Snapshot of the last committed cart.
    ///
    /// Never waits for an in-flight operation.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.committed.borrow().clone()
    }

    /// Observe committed changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.committed.subscribe()
    }

    /// Add one unit of `product_id`.
    ///
    /// Products already in the cart go through the quantity update path with
    /// their amount plus one. New products are fetched from the catalog and
    /// appended with amount 1.
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> CartOutcome {
        let mut cart = self.inner.cart.lock().await;

        if let Some(existing) = cart.get(product_id) {
            let request = UpdateProductAmount::new(product_id, existing.amount.saturating_add(1));
            return self.update_locked(&mut cart, request).await;
        }

        match self.try_add(&mut cart, product_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Failed to add product");
                self.notify(messages::ADD_FAILED);
                CartOutcome::Failed
            }
        }
    }

    /// Remove `product_id` from the cart entirely.
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: ProductId) -> CartOutcome {
        let mut cart = self.inner.cart.lock().await;

        if !cart.contains(product_id) {
            tracing::info!("Remove rejected, product not in cart");
            self.notify(messages::REMOVE_FAILED);
            return CartOutcome::Rejected;
        }

        let next = cart.without(product_id);
        match self.commit(&mut cart, next).await {
            Ok(()) => CartOutcome::Updated,
            Err(e) => {
                tracing::error!(error = %e, "Failed to remove product");
                self.notify(messages::REMOVE_FAILED);
                CartOutcome::Failed
            }
        }
    }

    /// Set the exact quantity of a product already in the cart.
    #[instrument(skip(self))]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) -> CartOutcome {
        let mut cart = self.inner.cart.lock().await;
        self.update_locked(&mut cart, request).await
    }

    // =========================================================================
    // Internals (callers hold the cart lock)
    // =========================================================================

    async fn try_add(&self, cart: &mut Cart, product_id: ProductId) -> Result<CartOutcome> {
        if !self.has_stock(cart, product_id, 1).await? {
            return Ok(CartOutcome::Rejected);
        }

        let product = self
            .bounded(self.inner.catalog.product(product_id))
            .await?;
        if product.id != product_id {
            return Err(CartError::UnexpectedProduct {
                requested: product_id,
                received: product.id,
            });
        }

        let next = cart.with_item(CartItem::new(product, 1));
        self.commit(cart, next).await?;
        Ok(CartOutcome::Updated)
    }

    async fn update_locked(&self, cart: &mut Cart, request: UpdateProductAmount) -> CartOutcome {
        let UpdateProductAmount { product_id, amount } = request;

        if amount < 1 || !cart.contains(product_id) {
            tracing::info!(%product_id, amount, "Amount update rejected");
            self.notify(messages::UPDATE_FAILED);
            return CartOutcome::Rejected;
        }

        match self.try_update(cart, product_id, amount).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, %product_id, amount, "Failed to update product amount");
                self.notify(messages::UPDATE_FAILED);
                CartOutcome::Failed
            }
        }
    }

    async fn try_update(
        &self,
        cart: &mut Cart,
        product_id: ProductId,
        amount: i32,
    ) -> Result<CartOutcome> {
        if !self.has_stock(cart, product_id, amount).await? {
            return Ok(CartOutcome::Rejected);
        }

        let next = cart.with_amount(product_id, amount);
        self.commit(cart, next).await?;
        Ok(CartOutcome::Updated)
    }

    /// Check the remote stock for `product_id` against `amount`.
    ///
    /// Only products already in the cart are compared; for anything else the
    /// check passes whatever the remote amount is.
    async fn has_stock(&self, cart: &Cart, product_id: ProductId, amount: i32) -> Result<bool> {
        let stock = self.bounded(self.inner.catalog.stock(product_id)).await?;

        if cart.contains(product_id) && stock.amount < amount {
            tracing::info!(
                %product_id,
                requested = amount,
                available = stock.amount,
                "Requested amount exceeds stock"
            );
            self.notify(messages::OUT_OF_STOCK);
            return Ok(false);
        }

        Ok(true)
    }

    /// Run a catalog call, failing it once the time limit passes.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, CatalogError>> + Send,
    ) -> Result<T> {
        let limit = self.inner.catalog_timeout;
        let response = tokio::time::timeout(limit, call)
            .await
            .map_err(|_| CatalogError::Timeout(limit))?;
        Ok(response?)
    }

    /// Persist `next`, then make it the current cart and publish it.
    async fn commit(&self, cart: &mut Cart, next: Cart) -> Result<()> {
        let serialized = serde_json::to_string(&next)?;
        self.inner.storage.save(&serialized).await?;

        *cart = next;
        self.inner.committed.send_replace(cart.clone());

        tracing::debug!(
            items = cart.len(),
            total = cart.total_items(),
            "Cart committed"
        );
        Ok(())
    }

    fn notify(&self, message: &str) {
        self.inner.notifier.notify(message);
    }
}

/// Rebuild a cart from the storage slot contents.
fn restore(serialized: &str) -> Cart {
    match serde_json::from_str::<Vec<CartItem>>(serialized) {
        Ok(items) => {
            let (cart, rejected) = Cart::from_items(items);
            for entry in rejected {
                tracing::warn!(?entry, "Dropped invalid persisted cart entry");
            }
            cart
        }
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable persisted cart");
            Cart::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_empty_array() {
        assert!(restore("[]").is_empty());
    }

    #[test]
    fn test_restore_garbage_starts_empty() {
        assert!(restore("not json").is_empty());
        assert!(restore(r#"{"id": 1}"#).is_empty());
    }

    #[test]
    fn test_restore_drops_invalid_entries() {
        let serialized = r#"[
            {"id": 1, "title": "Tênis A", "price": 139.9, "image": "a.jpg", "amount": 2},
            {"id": 2, "title": "Tênis B", "price": 99.9, "image": "b.jpg", "amount": 0},
            {"id": 1, "title": "Tênis A", "price": 139.9, "image": "a.jpg", "amount": 4}
        ]"#;

        let cart = restore(serialized);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().amount, 2);
    }

    #[test]
    fn test_restore_keeps_extra_product_fields() {
        let serialized = r#"[
            {"id": 5, "title": "Tênis", "price": "59.90", "image": "", "color": "red", "amount": 1}
        ]"#;

        let cart = restore(serialized);
        let item = cart.get(ProductId::new(5)).unwrap();
        assert_eq!(item.product.extra["color"], "red");
        assert_eq!(item.amount, 1);
    }
}
