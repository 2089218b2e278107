//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for the catalog and cart domain.

pub mod cart;
pub mod id;
pub mod product;

pub use cart::{Cart, CartItem, RejectedItem, UpdateProductAmount};
pub use id::ProductId;
pub use product::{Product, Stock};
