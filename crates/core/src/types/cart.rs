//! Cart contents.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s, unique by product id,
//! where quantity is tracked by `amount` rather than by repeated entries.
//! The mutating helpers return a new cart so callers can compute the next
//! state completely before committing it anywhere.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// A product held in the cart with the requested quantity.
///
/// Serializes flat: the product fields sit next to `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    /// Requested quantity, always at least 1 inside a [`Cart`].
    pub amount: i32,
}

/// Keys written by [`CartItem`] itself; catalog extras with these names are dropped.
const ITEM_FIELDS: [&str; 5] = ["id", "title", "price", "image", "amount"];

impl CartItem {
    /// Create a cart item from catalog details.
    ///
    /// The item's own fields replace any same-named extra the catalog sent.
    #[must_use]
    pub fn new(mut product: Product, amount: i32) -> Self {
        for key in ITEM_FIELDS {
            product.extra.remove(key);
        }
        Self { product, amount }
    }

    /// The product id this item is keyed by.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.amount)
    }
}

/// Request to set the exact quantity of a cart item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Requested quantity. Values below 1 are rejected by the store.
    pub amount: i32,
}

impl UpdateProductAmount {
    #[must_use]
    pub const fn new(product_id: ProductId, amount: i32) -> Self {
        Self { product_id, amount }
    }
}

/// An entry dropped while building a cart from untrusted items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedItem {
    /// The entry had an amount below 1.
    NonPositiveAmount { id: ProductId, amount: i32 },
    /// An earlier entry already used this id.
    Duplicate(ProductId),
}

/// The shopper's list of intended purchases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(Vec<CartItem>);

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a cart from items of unknown provenance (e.g. persisted state).
    ///
    /// Entries with `amount < 1` and repeated ids after the first occurrence
    /// are dropped and reported back to the caller.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> (Self, Vec<RejectedItem>) {
        let mut cart = Self::new();
        let mut rejected = Vec::new();

        for item in items {
            if item.amount < 1 {
                rejected.push(RejectedItem::NonPositiveAmount {
                    id: item.id(),
                    amount: item.amount,
                });
            } else if cart.contains(item.id()) {
                rejected.push(RejectedItem::Duplicate(item.id()));
            } else {
                cart.0.push(item);
            }
        }

        (cart, rejected)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.0.iter()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.0
    }

    /// Look up the item for `id`.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.0.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Sum of all amounts (the badge count).
    #[must_use]
    pub fn total_items(&self) -> i64 {
        self.0.iter().map(|item| i64::from(item.amount)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.0.iter().map(CartItem::line_total).sum()
    }

    /// A copy of this cart with `item` appended.
    ///
    /// The caller is responsible for checking that the id is not already
    /// present.
    #[must_use]
    pub fn with_item(&self, item: CartItem) -> Self {
        let mut items = self.0.clone();
        items.push(item);
        Self(items)
    }

    /// A copy of this cart without the item for `id`.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Self {
        Self(self.0.iter().filter(|item| item.id() != id).cloned().collect())
    }

    /// A copy of this cart with the amount for `id` replaced.
    ///
    /// Other fields and the item order are untouched. Unknown ids leave the
    /// copy identical to `self`.
    #[must_use]
    pub fn with_amount(&self, id: ProductId, amount: i32) -> Self {
        Self(
            self.0
                .iter()
                .map(|item| {
                    if item.id() == id {
                        CartItem {
                            amount,
                            ..item.clone()
                        }
                    } else {
                        item.clone()
                    }
                })
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
