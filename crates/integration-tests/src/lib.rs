//! Integration test fixtures for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! # Fixtures
//!
//! - [`FakeCatalog`] - in-memory catalog with switchable failures and latency
//! - [`FlakyStorage`] - memory slot whose loads and saves can be made to fail
//! - [`RecordingNotifier`] - keeps every notification for assertions
//! - [`Harness`] - a `CartStore` wired to all three

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rocketshoes_cart::{
    CartStorage, CartStore, Catalog, CatalogError, DEFAULT_CATALOG_TIMEOUT, MemoryStorage,
    Notifier, StorageError,
};
use rocketshoes_core::{Cart, CartItem, Product, ProductId, Stock};
use rust_decimal::Decimal;

/// Build a product with a predictable title and image.
#[must_use]
pub fn product(id: i32, price_cents: i64) -> Product {
    Product::new(
        ProductId::new(id),
        format!("Tênis {id}"),
        Decimal::new(price_cents, 2),
        format!("https://rocketshoes.example/images/{id}.jpg"),
    )
}

/// Build a cart from `(id, price_cents, amount)` triples.
#[must_use]
pub fn cart_of(items: &[(i32, i64, i32)]) -> Cart {
    items.iter().fold(Cart::new(), |cart, &(id, price, amount)| {
        cart.with_item(CartItem::new(product(id, price), amount))
    })
}

// =============================================================================
// FakeCatalog
// =============================================================================

/// In-memory catalog.
#[derive(Default)]
pub struct FakeCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
    stock: Mutex<HashMap<ProductId, i32>>,
    fail_products: AtomicBool,
    fail_stock: AtomicBool,
    latency: Mutex<Option<Duration>>,
    stock_calls: AtomicUsize,
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product and its available stock.
    #[must_use]
    pub fn with_product(self, product: Product, stock: i32) -> Self {
        self.set_stock(product.id, stock);
        lock(&self.products).insert(product.id, product);
        self
    }

    /// Serve `product` for `id`, even if the ids differ.
    #[must_use]
    pub fn with_product_at(self, id: ProductId, product: Product) -> Self {
        self.set_stock(id, 10);
        lock(&self.products).insert(id, product);
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        *lock(&self.latency) = Some(latency);
        self
    }

    pub fn set_stock(&self, id: ProductId, amount: i32) {
        lock(&self.stock).insert(id, amount);
    }

    pub fn fail_products(&self, fail: bool) {
        self.fail_products.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stock(&self, fail: bool) {
        self.fail_stock.store(fail, Ordering::SeqCst);
    }

    /// Number of stock lookups served so far.
    pub fn stock_calls(&self) -> usize {
        self.stock_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn unavailable(path: &str, id: ProductId) -> CatalogError {
    CatalogError::Status {
        status: 503,
        url: format!("http://catalog.test/{path}/{id}"),
    }
}

fn not_found(path: &str, id: ProductId) -> CatalogError {
    CatalogError::Status {
        status: 404,
        url: format!("http://catalog.test/{path}/{id}"),
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.simulate_latency().await;
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(unavailable("products", id));
        }
        lock(&self.products)
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("products", id))
    }

    async fn stock(&self, id: ProductId) -> Result<Stock, CatalogError> {
        self.stock_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_stock.load(Ordering::SeqCst) {
            return Err(unavailable("stock", id));
        }
        lock(&self.stock)
            .get(&id)
            .map(|&amount| Stock { id, amount })
            .ok_or_else(|| not_found("stock", id))
    }
}

// =============================================================================
// FlakyStorage
// =============================================================================

/// Memory slot whose loads and saves can be switched to fail.
#[derive(Default)]
pub struct FlakyStorage {
    slot: MemoryStorage,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl FlakyStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `cart`.
    #[must_use]
    pub fn holding(cart: &Cart) -> Self {
        let serialized = serde_json::to_string(cart).expect("cart serializes");
        Self {
            slot: MemoryStorage::with_contents(serialized),
            ..Self::default()
        }
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Raw slot contents.
    pub async fn contents(&self) -> Option<String> {
        self.slot.contents().await
    }

    /// Slot contents decoded as a cart.
    pub async fn persisted_cart(&self) -> Option<Cart> {
        self.contents()
            .await
            .map(|s| serde_json::from_str(&s).expect("persisted cart is valid JSON"))
    }
}

#[async_trait]
impl CartStorage for FlakyStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("slot locked".to_string()));
        }
        self.slot.load().await
    }

    async fn save(&self, serialized: &str) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.slot.save(serialized).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// RecordingNotifier
// =============================================================================

/// Notifier that records every message.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A cart store wired to fake capabilities.
pub struct Harness {
    pub store: CartStore,
    pub catalog: Arc<FakeCatalog>,
    pub storage: Arc<FlakyStorage>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    /// Open a store over `catalog` with an empty slot.
    pub async fn open(catalog: FakeCatalog) -> Self {
        Self::open_with(catalog, FlakyStorage::new(), DEFAULT_CATALOG_TIMEOUT).await
    }

    /// Open a store over `catalog` whose slot already holds `cart`.
    pub async fn open_holding(catalog: FakeCatalog, cart: &Cart) -> Self {
        Self::open_with(catalog, FlakyStorage::holding(cart), DEFAULT_CATALOG_TIMEOUT).await
    }

    /// Like [`Harness::open_holding`], with a custom limit per catalog call.
    pub async fn open_holding_with_timeout(
        catalog: FakeCatalog,
        cart: &Cart,
        catalog_timeout: Duration,
    ) -> Self {
        Self::open_with(catalog, FlakyStorage::holding(cart), catalog_timeout).await
    }

    async fn open_with(catalog: FakeCatalog, storage: FlakyStorage, catalog_timeout: Duration) -> Self {
        let catalog = Arc::new(catalog);
        let storage = Arc::new(storage);
        let notifier = Arc::new(RecordingNotifier::default());

        let store = CartStore::open_with_timeout(
            catalog.clone(),
            storage.clone(),
            notifier.clone(),
            catalog_timeout,
        )
        .await
        .expect("store opens");

        Self {
            store,
            catalog,
            storage,
            notifier,
        }
    }

    /// Amount held for `id`, if present.
    #[must_use]
    pub fn amount_of(&self, id: i32) -> Option<i32> {
        self.store
            .cart()
            .get(ProductId::new(id))
            .map(|item| item.amount)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
