//! Storage seam of the settlement core
//!
//! A [`SettlementStore`] hands out transactions. Everything a settlement or
//! drawdown writes goes through one [`SettlementTx`] and becomes visible only
//! when the store commits it. Dropping a transaction rolls it back.

mod memory;
mod postgres;

pub use memory::{MemorySettlementStore, MemoryTx};
pub use postgres::{PgSettlementStore, PgSettlementTx};

use async_trait::async_trait;
use insurance_service::{ClaimTarget, ClaimTx};
use uuid::Uuid;

use crate::error::BillingResult;
use crate::models::{Admission, Order, OrderRef, TransactionRecord, Wallet};

/// Billing-side operations of one open transaction
///
/// Extends [`ClaimTx`] so the claim ledger runs in the same transaction as
/// balance and order updates.
///
/// Callers lock in one order: admission or wallet first, then orders, then
/// claims and summaries.
#[async_trait]
pub trait SettlementTx: ClaimTx {
    /// Register a pending order and assign its arrival sequence; fails with
    /// `DuplicateOrder` when the target is already recorded
    async fn insert_order(&mut self, order: &OrderRef) -> BillingResult<Order>;

    /// Read an order without locking it
    async fn find_order(&mut self, target: &ClaimTarget) -> BillingResult<Option<Order>>;

    async fn lock_order(&mut self, target: &ClaimTarget) -> BillingResult<Option<Order>>;

    async fn update_order(&mut self, order: &Order) -> BillingResult<()>;

    /// Pending orders of every type linked to the admission, unordered
    async fn pending_admission_orders(&mut self, admission_id: Uuid) -> BillingResult<Vec<Order>>;

    async fn lock_admission(&mut self, admission_id: Uuid) -> BillingResult<Option<Admission>>;

    async fn update_admission(&mut self, admission: &Admission) -> BillingResult<()>;

    /// Lock the patient's wallet, creating an empty one on first use
    async fn lock_wallet(&mut self, patient_id: Uuid) -> BillingResult<Wallet>;

    async fn update_wallet(&mut self, wallet: &Wallet) -> BillingResult<()>;

    async fn insert_transaction(&mut self, record: &TransactionRecord) -> BillingResult<()>;
}

#[async_trait]
pub trait SettlementStore: Send + Sync {
    type Tx: SettlementTx + 'static;

    async fn begin(&self) -> BillingResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> BillingResult<()>;
}
