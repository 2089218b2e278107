//! RocketShoes Core - Shared types library.
//!
//! This crate provides the domain types used across all RocketShoes components:
//! - `cart` - The cart state container and its capabilities
//! - `cli` - Command-line driver for a persisted cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere, including
//! by a view layer that only renders a cart snapshot.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, catalog records, and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
