use chrono::Utc;
use config_engine::SettlementConfig;
use insurance_service::{ClaimLedger, ClaimNumberGenerator, ClaimRequest, ClaimTarget, ClaimTx, RandomClaimNumbers};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::models::{
    Admission, ClaimRef, Order, OrderRef, OrderStatus, PayerContext, PaymentStamp, SettlementResult,
    TransactionDirection, TransactionKind, TransactionRecord, Wallet,
};
use crate::store::{SettlementStore, SettlementTx};

/// How a patient share is funded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub drawn: Decimal,
    pub debt: Decimal,
}

/// Balance row locked for one settlement
enum PayerBalance {
    Admission(Admission),
    Wallet(Wallet),
}

/// Split `patient_amount` into what the balance can pay and the shortfall
///
/// # Errors
///
/// `InsufficientFunds` when there is a shortfall and debt is not allowed.
pub fn allocate(available: Decimal, patient_amount: Decimal, debt_allowed: bool) -> BillingResult<Allocation> {
    let drawn = available.max(Decimal::ZERO).min(patient_amount);
    let debt = patient_amount - drawn;
    if debt > Decimal::ZERO && !debt_allowed {
        return Err(BillingError::InsufficientFunds {
            required: patient_amount,
            available,
        });
    }
    Ok(Allocation { drawn, debt })
}

/// Settles orders: insurance claim, balance draw, debt and transaction
/// record, all inside one store transaction
pub struct SettlementEngine<S, G = RandomClaimNumbers> {
    store: S,
    ledger: ClaimLedger<G>,
    wallet_debt_allowed: bool,
    admission_debt_allowed: bool,
}

impl<S: SettlementStore> SettlementEngine<S> {
    pub fn new(store: S, config: &SettlementConfig) -> Self {
        Self::with_ledger(store, ClaimLedger::new(config), config)
    }
}

impl<S, G> SettlementEngine<S, G>
where
    S: SettlementStore,
    G: ClaimNumberGenerator,
{
    pub fn with_ledger(store: S, ledger: ClaimLedger<G>, config: &SettlementConfig) -> Self {
        Self {
            store,
            ledger,
            wallet_debt_allowed: config.wallet_debt_allowed,
            admission_debt_allowed: config.admission_debt_allowed,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &ClaimLedger<G> {
        &self.ledger
    }

    /// Register a pending order so it can be settled or picked up by a
    /// deposit drawdown
    pub async fn record_order(&self, order: OrderRef) -> BillingResult<Order> {
        let mut tx = self.store.begin().await?;
        let stored = tx.insert_order(&order).await?;
        self.store.commit(tx).await?;

        debug!(
            order_id = %stored.id(),
            claim_type = stored.order.target.claim_type().as_str(),
            sequence = stored.sequence,
            "Order recorded"
        );
        Ok(stored)
    }

    /// Settle a recorded order
    ///
    /// Nothing is persisted when this fails; the order stays pending.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `OrderAlreadySettled`, `InvalidOrderAmount`,
    /// `PayerMismatch` when `payer` is neither the order's admission nor the
    /// patient's wallet, `AdmissionNotFound` and `InsufficientFunds`, plus
    /// claim and storage failures.
    pub async fn settle(&self, order: &ClaimTarget, payer: PayerContext, actor: Uuid) -> BillingResult<SettlementResult> {
        let mut tx = self.store.begin().await?;
        let result = self.settle_in(&mut tx, order, payer, actor).await?;
        self.store.commit(tx).await?;
        Ok(result)
    }

    /// Record and settle a new order in one transaction, paying from the
    /// admission deposit when the order belongs to an admission and from the
    /// wallet otherwise
    pub async fn settle_new(&self, order: OrderRef, actor: Uuid) -> BillingResult<SettlementResult> {
        let payer = PayerContext::for_order(&order);
        let mut tx = self.store.begin().await?;
        tx.insert_order(&order).await?;
        let result = self.settle_in(&mut tx, &order.target, payer, actor).await?;
        self.store.commit(tx).await?;
        Ok(result)
    }

    pub(crate) async fn settle_in(
        &self,
        tx: &mut S::Tx,
        target: &ClaimTarget,
        payer: PayerContext,
        actor: Uuid,
    ) -> BillingResult<SettlementResult> {
        let snapshot = tx
            .find_order(target)
            .await?
            .ok_or(BillingError::OrderNotFound(target.order_id()))?;
        Self::check_payer(&snapshot, payer)?;

        // Balance row before order row, matching the drawdown path
        let mut balance = match payer {
            PayerContext::Admission(admission_id) => PayerBalance::Admission(
                tx.lock_admission(admission_id)
                    .await?
                    .ok_or(BillingError::AdmissionNotFound(admission_id))?,
            ),
            PayerContext::Wallet(patient_id) => PayerBalance::Wallet(tx.lock_wallet(patient_id).await?),
        };

        let mut order = tx
            .lock_order(target)
            .await?
            .ok_or(BillingError::OrderNotFound(target.order_id()))?;
        if !order.is_pending() {
            return Err(BillingError::OrderAlreadySettled(order.id()));
        }

        let total = order.order.total_amount;
        if total <= Decimal::ZERO {
            return Err(BillingError::InvalidOrderAmount(total));
        }

        let service_date = order.order.ordered_at.date_naive();
        let insurance = tx.active_insurance(order.order.patient_id, service_date).await?;
        let request = ClaimRequest {
            target: *target,
            patient_id: order.order.patient_id,
            billed_item: order.order.billed_item,
            total_amount: total,
            service_date,
            created_by: actor,
        };
        let claim = self.ledger.create_claim(tx, insurance.as_ref(), &request).await?;

        let (covered, patient) = match &claim {
            Some(claim) => (claim.covered_amount, claim.patient_amount),
            None => (Decimal::ZERO, total),
        };

        let (allocation, admission_id) = match &mut balance {
            PayerBalance::Admission(admission) => {
                let allocation = allocate(admission.deposit_balance, patient, self.admission_debt_allowed)?;

                admission.deposit_balance -= allocation.drawn;
                admission.outstanding_debt += allocation.debt;
                admission.total_charges += total;
                tx.update_admission(admission).await?;
                (allocation, Some(admission.id))
            }
            PayerBalance::Wallet(wallet) => {
                let allocation = allocate(wallet.balance, patient, self.wallet_debt_allowed)?;

                wallet.balance -= allocation.drawn;
                wallet.outstanding_debt += allocation.debt;
                tx.update_wallet(wallet).await?;
                (allocation, None)
            }
        };

        let now = Utc::now();
        let record = TransactionRecord {
            id: Uuid::new_v4(),
            patient_id: order.order.patient_id,
            admission_id,
            order: Some(*target),
            kind: TransactionKind::Settlement,
            direction: TransactionDirection::Debit,
            amount: patient,
            drawn_amount: allocation.drawn,
            debt_amount: allocation.debt,
            covered_amount: covered,
            claim_id: claim.as_ref().map(|c| c.id),
            actor,
            created_at: now,
        };
        tx.insert_transaction(&record).await?;

        order.status = OrderStatus::Paid;
        order.payment = Some(PaymentStamp {
            paid_at: now,
            paid_by: actor,
            transaction_id: record.id,
            claim_id: record.claim_id,
            covered_amount: covered,
            amount_paid: allocation.drawn,
            debt_added: allocation.debt,
        });
        tx.update_order(&order).await?;

        info!(
            order_id = %target.order_id(),
            claim_type = target.claim_type().as_str(),
            total = %total,
            covered = %covered,
            drawn = %allocation.drawn,
            debt = %allocation.debt,
            "Order settled"
        );

        Ok(SettlementResult {
            order: *target,
            total_amount: total,
            covered_amount: covered,
            patient_amount: patient,
            patient_paid: allocation.drawn,
            debt_added: allocation.debt,
            claim: claim.map(|c| ClaimRef {
                id: c.id,
                claim_number: c.claim_number,
            }),
            transaction_id: record.id,
        })
    }

    fn check_payer(order: &Order, payer: PayerContext) -> BillingResult<()> {
        let matches = match payer {
            PayerContext::Admission(admission_id) => order.order.links.admission_id == Some(admission_id),
            PayerContext::Wallet(patient_id) => order.order.patient_id == patient_id,
        };
        if matches {
            Ok(())
        } else {
            Err(BillingError::PayerMismatch {
                order_id: order.id(),
                payer,
            })
        }
    }
}
