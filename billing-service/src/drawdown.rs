use chrono::Utc;
use insurance_service::ClaimNumberGenerator;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::models::{DrawdownResult, Order, PayerContext, TransactionDirection, TransactionKind, TransactionRecord};
use crate::settlement::SettlementEngine;
use crate::store::{SettlementStore, SettlementTx};

/// Pending orders a deposit of `available` clears, oldest first
///
/// Orders are stably sorted by `(ordered_at, sequence)` and taken while the
/// remaining deposit covers each whole total. The first order that does not
/// fit ends the run. Orders with a non-positive total cannot be settled and
/// are left out.
pub fn drawdown_plan(mut pending: Vec<Order>, available: Decimal) -> Vec<Order> {
    pending.retain(|order| order.is_pending() && order.order.total_amount > Decimal::ZERO);
    pending.sort_by_key(Order::arrival_key);

    let mut remaining = available;
    pending
        .into_iter()
        .take_while(|order| {
            if remaining >= order.order.total_amount {
                remaining -= order.order.total_amount;
                true
            } else {
                false
            }
        })
        .collect()
}

impl<S, G> SettlementEngine<S, G>
where
    S: SettlementStore,
    G: ClaimNumberGenerator,
{
    /// Credit an admission deposit and settle pending admission orders from
    /// it in arrival order
    ///
    /// The credit and every settlement it triggers commit together.
    ///
    /// # Errors
    ///
    /// `InvalidDepositAmount` for a non-positive amount, `AdmissionNotFound`
    /// for an unknown admission.
    pub async fn apply_deposit(&self, admission_id: Uuid, amount: Decimal, actor: Uuid) -> BillingResult<DrawdownResult> {
        if amount <= Decimal::ZERO {
            return Err(BillingError::InvalidDepositAmount(amount));
        }

        let mut tx = self.store().begin().await?;

        let mut admission = tx
            .lock_admission(admission_id)
            .await?
            .ok_or(BillingError::AdmissionNotFound(admission_id))?;
        admission.deposit_balance += amount;
        tx.update_admission(&admission).await?;

        tx.insert_transaction(&TransactionRecord {
            id: Uuid::new_v4(),
            patient_id: admission.patient_id,
            admission_id: Some(admission_id),
            order: None,
            kind: TransactionKind::Deposit,
            direction: TransactionDirection::Credit,
            amount,
            drawn_amount: Decimal::ZERO,
            debt_amount: Decimal::ZERO,
            covered_amount: Decimal::ZERO,
            claim_id: None,
            actor,
            created_at: Utc::now(),
        })
        .await?;

        let pending = tx.pending_admission_orders(admission_id).await?;
        let skipped = pending
            .iter()
            .filter(|o| o.order.total_amount <= Decimal::ZERO)
            .count();
        if skipped > 0 {
            warn!(%admission_id, skipped, "Pending orders with non-positive totals left out of drawdown");
        }

        let plan = drawdown_plan(pending, admission.deposit_balance);
        let mut settlements = Vec::with_capacity(plan.len());
        for order in &plan {
            let result = self
                .settle_in(&mut tx, &order.order.target, PayerContext::Admission(admission_id), actor)
                .await?;
            settlements.push(result);
        }

        let deposit_balance = tx
            .lock_admission(admission_id)
            .await?
            .map_or(admission.deposit_balance, |a| a.deposit_balance);

        self.store().commit(tx).await?;

        let amount_used: Decimal = settlements.iter().map(|s| s.total_amount).sum();
        info!(
            %admission_id,
            deposit = %amount,
            orders_cleared = settlements.len(),
            amount_used = %amount_used,
            deposit_balance = %deposit_balance,
            "Deposit applied"
        );

        Ok(DrawdownResult {
            orders_cleared: settlements.len(),
            amount_used,
            deposit_balance,
            settlements,
        })
    }
}
