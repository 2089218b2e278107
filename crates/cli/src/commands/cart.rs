//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! rocketshoes show
//! rocketshoes add 1
//! rocketshoes update 1 3
//! rocketshoes remove 1
//! ```
//!
//! # Environment Variables
//!
//! See `rocketshoes_cart::config` for the full list. At minimum
//! `ROCKETSHOES_API_URL` must point at the catalog.

use std::fmt::Write as _;
use std::sync::Arc;

use rocketshoes_cart::{CartConfig, CartError, CartOutcome, CartStore, ConfigError, TracingNotifier};
use rocketshoes_core::{Cart, ProductId, UpdateProductAmount};
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store could not be opened.
    #[error("Cart store error: {0}")]
    Store(#[from] CartError),

    /// The operation ran but did not change the cart.
    #[error("Cart not changed ({0:?})")]
    NotApplied(CartOutcome),
}

/// Open the cart store described by the environment.
///
/// Notifications are routed to the tracing subscriber.
///
/// # Errors
///
/// Returns error if configuration is missing or the storage slot is unreadable.
pub async fn open_store() -> Result<CartStore, CartCommandError> {
    let config = CartConfig::from_env()?;
    tracing::debug!(
        api = %config.catalog.base_url,
        storage_dir = %config.storage_dir.display(),
        "Opening cart store"
    );
    Ok(CartStore::from_config(&config, Arc::new(TracingNotifier)).await?)
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns `CartCommandError::NotApplied` if the cart did not change.
pub async fn add(store: &CartStore, id: ProductId) -> Result<(), CartCommandError> {
    applied(store.add_product(id).await)
}

/// Remove a product entirely.
///
/// # Errors
///
/// Returns `CartCommandError::NotApplied` if the cart did not change.
pub async fn remove(store: &CartStore, id: ProductId) -> Result<(), CartCommandError> {
    applied(store.remove_product(id).await)
}

/// Set the amount of a product already in the cart.
///
/// # Errors
///
/// Returns `CartCommandError::NotApplied` if the cart did not change.
pub async fn update(store: &CartStore, id: ProductId, amount: i32) -> Result<(), CartCommandError> {
    applied(
        store
            .update_product_amount(UpdateProductAmount::new(id, amount))
            .await,
    )
}

fn applied(outcome: CartOutcome) -> Result<(), CartCommandError> {
    match outcome {
        CartOutcome::Updated => Ok(()),
        other => Err(CartCommandError::NotApplied(other)),
    }
}

/// Render a cart as a plain-text table.
#[must_use]
pub fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "{:>3} x #{:<4} {}  @ {:.2} = {:.2}",
            item.amount,
            item.id(),
            item.product.title,
            item.product.price,
            item.line_total()
        );
    }
    let _ = writeln!(
        out,
        "Items: {}  Subtotal: {:.2}",
        cart.total_items(),
        cart.subtotal()
    );
    out
}

#[cfg(test)]
mod tests {
    use rocketshoes_core::{CartItem, Product};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render(&Cart::new()), "Cart is empty\n");
    }

    #[test]
    fn test_render_lists_items_and_totals() {
        let cart = Cart::new()
            .with_item(CartItem::new(
                Product::new(ProductId::new(1), "Tênis Leve", Decimal::new(17990, 2), ""),
                2,
            ))
            .with_item(CartItem::new(
                Product::new(ProductId::new(2), "Tênis VR", Decimal::new(13990, 2), ""),
                1,
            ));

        let output = render(&cart);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines.first().is_some_and(|l| l.contains("Tênis Leve") && l.ends_with("= 359.80")));
        assert!(lines.get(1).is_some_and(|l| l.contains("#2")));
        assert_eq!(lines.get(2).copied(), Some("Items: 3  Subtotal: 499.70"));
    }

    #[test]
    fn test_applied_maps_outcomes() {
        assert!(applied(CartOutcome::Updated).is_ok());
        assert!(matches!(
            applied(CartOutcome::Rejected),
            Err(CartCommandError::NotApplied(CartOutcome::Rejected))
        ));
        assert!(matches!(
            applied(CartOutcome::Failed),
            Err(CartCommandError::NotApplied(CartOutcome::Failed))
        ));
    }
}
