//! Billing settlement for hospital orders
//!
//! Provides:
//! - Order settlement: insurance claim, deposit or wallet draw, debt and an
//!   immutable transaction record, committed atomically
//! - Deposit drawdown: FIFO clearing of pending admission orders when a
//!   deposit arrives
//! - Claim adjudication entry points for the insurance back office
//! - PostgreSQL and in-memory stores behind [`SettlementStore`]
//!
//! # Example
//!
//! ```rust
//! use billing_service::{MemorySettlementStore, OrderRef, SettlementEngine, Wallet};
//! use config_engine::SettlementConfig;
//! use insurance_service::ClaimType;
//! use rust_decimal::Decimal;
//! use uuid::Uuid;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), billing_service::BillingError> {
//! let store = MemorySettlementStore::new();
//! let patient = Uuid::new_v4();
//! store.add_wallet(Wallet::new(patient, Decimal::new(10_000, 2))).await;
//!
//! let engine = SettlementEngine::new(store.clone(), &SettlementConfig::default());
//! let order = OrderRef::new(ClaimType::Drug, patient, Decimal::new(2_500, 2));
//! let result = engine.settle_new(order, Uuid::new_v4()).await?;
//!
//! assert_eq!(result.patient_paid, Decimal::new(2_500, 2));
//! assert!(!result.claim_created());
//! # Ok(())
//! # }
//! ```

pub mod adjudication;
pub mod drawdown;
pub mod error;
pub mod models;
pub mod settlement;
pub mod store;

pub use adjudication::*;
pub use drawdown::*;
pub use error::*;
pub use models::*;
pub use settlement::*;
pub use store::*;
