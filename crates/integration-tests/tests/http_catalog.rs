//! Integration tests for the HTTP catalog client.
//!
//! A small axum app stands in for the catalog API on a random local port.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocketshoes_cart::{
    CartOutcome, CartStore, Catalog, CatalogConfig, CatalogError, FileStorage, HttpCatalog,
};
use rocketshoes_core::{ProductId, UpdateProductAmount};
use rocketshoes_integration_tests::RecordingNotifier;
use rust_decimal::Decimal;
use serde_json::json;

#[derive(Clone, Default)]
struct Hits {
    products: Arc<AtomicUsize>,
    stock: Arc<AtomicUsize>,
}

async fn product_handler(State(hits): State<Hits>, Path(id): Path<i32>) -> Response {
    hits.products.fetch_add(1, Ordering::SeqCst);
    match id {
        1 => Json(json!({
            "id": 1,
            "title": "Tênis de Caminhada Leve Confortável",
            "price": 179.9,
            "image": "https://rocketshoes.example/images/1.jpg"
        }))
        .into_response(),
        2 => Json(json!({
            "id": 2,
            "title": "Tênis VR Caminhada Confortável Detalhes Couro Masculino",
            "price": 139.9,
            "image": "https://rocketshoes.example/images/2.jpg"
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn stock_handler(State(hits): State<Hits>, Path(id): Path<i32>) -> Response {
    hits.stock.fetch_add(1, Ordering::SeqCst);
    match id {
        1 => Json(json!({ "id": 1, "amount": 3 })).into_response(),
        2 => Json(json!({ "id": 2, "amount": 1 })).into_response(),
        3 => (StatusCode::OK, "definitely not json").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve the fake catalog and return its base URL.
async fn spawn_catalog(hits: Hits) -> String {
    let app = Router::new()
        .route("/products/{id}", get(product_handler))
        .route("/stock/{id}", get(stock_handler))
        .with_state(hits);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server runs");
    });

    format!("http://{addr}")
}

async fn client(hits: Hits) -> HttpCatalog {
    let base_url = spawn_catalog(hits).await;
    let config = CatalogConfig::new(&base_url).expect("valid base URL");
    HttpCatalog::new(&config).expect("client builds")
}

#[tokio::test]
async fn test_fetch_product_details() {
    let catalog = client(Hits::default()).await;

    let product = catalog.product(ProductId::new(1)).await.expect("product");

    assert_eq!(product.id, ProductId::new(1));
    assert_eq!(product.title, "Tênis de Caminhada Leve Confortável");
    assert_eq!(product.price, Decimal::new(1799, 1));
    assert!(product.image.ends_with("/1.jpg"));
}

#[tokio::test]
async fn test_product_details_are_cached() {
    let hits = Hits::default();
    let catalog = client(hits.clone()).await;

    catalog.product(ProductId::new(1)).await.expect("first fetch");
    catalog.product(ProductId::new(1)).await.expect("second fetch");

    assert_eq!(hits.products.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stock_is_never_cached() {
    let hits = Hits::default();
    let catalog = client(hits.clone()).await;

    let stock = catalog.stock(ProductId::new(1)).await.expect("stock");
    catalog.stock(ProductId::new(1)).await.expect("stock again");

    assert_eq!(stock.amount, 3);
    assert_eq!(hits.stock.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_not_found_maps_to_status_error() {
    let catalog = client(Hits::default()).await;

    let err = catalog
        .product(ProductId::new(42))
        .await
        .expect_err("unknown product");

    assert!(matches!(err, CatalogError::Status { status: 404, .. }));
    assert!(err.to_string().ends_with("/products/42"));
}

#[tokio::test]
async fn test_malformed_body_maps_to_parse_error() {
    let catalog = client(Hits::default()).await;

    let err = catalog
        .stock(ProductId::new(3))
        .await
        .expect_err("malformed stock");

    assert!(matches!(err, CatalogError::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_catalog_maps_to_http_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let config = CatalogConfig::new(&format!("http://{addr}")).expect("valid base URL");
    let catalog = HttpCatalog::new(&config).expect("client builds");

    let err = catalog
        .stock(ProductId::new(1))
        .await
        .expect_err("connection refused");

    assert!(matches!(err, CatalogError::Http(_)));
}

#[tokio::test]
async fn test_store_round_trip_over_http_and_file_storage() {
    let catalog = Arc::new(client(Hits::default()).await);
    let dir = tempfile::tempdir().expect("tempdir");
    let storage =
        Arc::new(FileStorage::new(dir.path(), "@RocketShoes:cart").expect("valid key"));
    let notifier = Arc::new(RecordingNotifier::default());

    let store = CartStore::open(catalog.clone(), storage.clone(), notifier.clone())
        .await
        .expect("store opens");

    assert_eq!(store.add_product(ProductId::new(1)).await, CartOutcome::Updated);
    assert_eq!(store.add_product(ProductId::new(2)).await, CartOutcome::Updated);
    assert_eq!(store.add_product(ProductId::new(1)).await, CartOutcome::Updated);
    // Stock for product 2 is 1.
    assert_eq!(
        store
            .update_product_amount(UpdateProductAmount::new(ProductId::new(2), 2))
            .await,
        CartOutcome::Rejected
    );

    let reopened = CartStore::open(catalog, storage, notifier.clone())
        .await
        .expect("store reopens");

    assert_eq!(reopened.cart(), store.cart());
    assert_eq!(reopened.cart().total_items(), 3);
    assert_eq!(
        notifier.messages(),
        vec![rocketshoes_cart::messages::OUT_OF_STOCK]
    );
}
