//! Insurance side of the settlement core
//!
//! Provides:
//! - Coverage resolution against HMO coverage plans
//! - Covered / patient split calculation with half-up money rounding
//! - The claim ledger: claim creation, adjudication and per-encounter
//!   claim summaries
//!
//! Storage is abstracted behind [`ClaimTx`]; the billing service supplies
//! the implementations and owns the transaction boundaries.

pub mod calculator;
pub mod claim_number;
pub mod coverage;
pub mod error;
pub mod ledger;
pub mod models;
pub mod store;

pub use calculator::*;
pub use claim_number::*;
pub use coverage::*;
pub use error::*;
pub use ledger::*;
pub use models::*;
pub use store::*;
