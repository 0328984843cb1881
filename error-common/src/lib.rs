//! Common error handling utilities for the RustCare settlement core
//!
//! Every service crate keeps its own `thiserror` enum close to the code that
//! raises it. This crate holds what they share:
//!
//! - **Error codes**: stable identifiers that survive message rewording and
//!   are safe to hand to API clients and dashboards
//! - **`RustCareError`**: the envelope an outer layer (HTTP, CLI, jobs)
//!   receives once a service error leaves its crate
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, RustCareError};
//!
//! fn reject_zero_total(total: i64) -> Result<(), RustCareError> {
//!     if total <= 0 {
//!         return Err(RustCareError::validation(
//!             codes::billing::INVALID_ORDER_AMOUNT,
//!             "order total must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! let err = reject_zero_total(0).unwrap_err();
//! assert_eq!(err.code(), "BILLING_5001");
//! ```

pub mod codes;
pub mod types;

pub use types::*;
