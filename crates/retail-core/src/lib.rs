//! # retail-core: Pure Business Logic
//!
//! This crate is the heart of the retail transaction engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Retail Engine Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Service layer (HTTP, CSV, ...)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                        retail-engine                            │   │
//! │  │     TransactionEngine • AnalyticsEngine • ResultCache           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ retail-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌─────────────┐   │   │
//! │  │   │   types   │ │   money   │ │ validation│ │  analytics  │   │   │
//! │  │   │ Item, Txn │ │   Money   │ │   rules   │ │ aggregation │   │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └─────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   retail-db (SQLite via sqlx)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Transaction, LineItem, DateRange, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Explicit input validation
//! - [`analytics`] - Aggregation passes over ledger row sets
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input, same output
//! 2. **No I/O**: database, network and file system access are forbidden here
//! 3. **Integer Money**: stored amounts are cents (i64); floats are reserved
//!    for derived statistics
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use retail_core::Money` instead of
// `use retail_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
