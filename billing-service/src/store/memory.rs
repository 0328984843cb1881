use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use insurance_service::{
    ClaimStatus, ClaimSummary, ClaimTarget, ClaimTx, CoveragePlan, Encounter, EncounterLinks, InsuranceClaim,
    InsuranceError, InsuranceResult, PatientInsurance, ServiceCategory,
};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{SettlementStore, SettlementTx};
use crate::error::{BillingError, BillingResult};
use crate::models::{Admission, Order, OrderRef, TransactionRecord, Wallet};

#[derive(Debug, Clone, Default)]
struct State {
    plans: HashMap<Uuid, CoveragePlan>,
    insurances: HashMap<Uuid, PatientInsurance>,
    claims: HashMap<Uuid, InsuranceClaim>,
    summaries: HashMap<Uuid, ClaimSummary>,
    orders: HashMap<ClaimTarget, Order>,
    admissions: HashMap<Uuid, Admission>,
    wallets: HashMap<Uuid, Wallet>,
    transactions: Vec<TransactionRecord>,
    next_sequence: i64,
}

/// In-process store
///
/// One transaction at a time: `begin` waits for the state lock and holds it
/// until the transaction is committed or dropped, so concurrent settlements
/// are fully serialized. Writes go to a private copy that `commit` publishes.
///
/// The read helpers take the same lock; do not call them while holding an
/// open transaction on the same task.
#[derive(Debug, Clone, Default)]
pub struct MemorySettlementStore {
    state: Arc<Mutex<State>>,
}

impl MemorySettlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_coverage_plan(&self, plan: CoveragePlan) {
        self.state.lock().await.plans.insert(plan.id, plan);
    }

    pub async fn add_patient_insurance(&self, insurance: PatientInsurance) {
        self.state.lock().await.insurances.insert(insurance.id, insurance);
    }

    pub async fn add_admission(&self, admission: Admission) {
        self.state.lock().await.admissions.insert(admission.id, admission);
    }

    pub async fn add_wallet(&self, wallet: Wallet) {
        self.state.lock().await.wallets.insert(wallet.patient_id, wallet);
    }

    pub async fn admission(&self, admission_id: Uuid) -> Option<Admission> {
        self.state.lock().await.admissions.get(&admission_id).cloned()
    }

    pub async fn wallet(&self, patient_id: Uuid) -> Option<Wallet> {
        self.state.lock().await.wallets.get(&patient_id).cloned()
    }

    pub async fn order(&self, target: &ClaimTarget) -> Option<Order> {
        self.state.lock().await.orders.get(target).cloned()
    }

    pub async fn claim(&self, claim_id: Uuid) -> Option<InsuranceClaim> {
        self.state.lock().await.claims.get(&claim_id).cloned()
    }

    pub async fn claims(&self) -> Vec<InsuranceClaim> {
        self.state.lock().await.claims.values().cloned().collect()
    }

    pub async fn summaries(&self) -> Vec<ClaimSummary> {
        self.state.lock().await.summaries.values().cloned().collect()
    }

    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.lock().await.transactions.clone()
    }
}

#[async_trait]
impl SettlementStore for MemorySettlementStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> BillingResult<MemoryTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }

    async fn commit(&self, tx: MemoryTx) -> BillingResult<()> {
        let MemoryTx { mut guard, work } = tx;
        *guard = work;
        Ok(())
    }
}

/// Open transaction on a [`MemorySettlementStore`]
pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    work: State,
}

#[async_trait]
impl ClaimTx for MemoryTx {
    async fn active_insurance(&mut self, patient_id: Uuid, on: NaiveDate) -> InsuranceResult<Option<PatientInsurance>> {
        Ok(self
            .work
            .insurances
            .values()
            .filter(|i| i.patient_id == patient_id && i.is_valid_on(on))
            .max_by_key(|i| i.valid_from)
            .cloned())
    }

    async fn coverage_plan(&mut self, plan_id: Uuid) -> InsuranceResult<Option<CoveragePlan>> {
        Ok(self.work.plans.get(&plan_id).cloned())
    }

    async fn covered_in_period(
        &mut self,
        patient_insurance_id: Uuid,
        category: ServiceCategory,
        from: NaiveDate,
        to: NaiveDate,
    ) -> InsuranceResult<Decimal> {
        Ok(self
            .work
            .claims
            .values()
            .filter(|c| {
                c.patient_insurance_id == patient_insurance_id
                    && c.target.category() == category
                    && c.status != ClaimStatus::Rejected
                    && (from..=to).contains(&c.service_date)
            })
            .map(|c| c.covered_amount)
            .sum())
    }

    async fn claim_for_target(&mut self, target: &ClaimTarget) -> InsuranceResult<Option<InsuranceClaim>> {
        Ok(self.work.claims.values().find(|c| c.target == *target).cloned())
    }

    async fn insert_claim(&mut self, claim: &InsuranceClaim) -> InsuranceResult<()> {
        if self.work.claims.values().any(|c| c.claim_number == claim.claim_number) {
            return Err(InsuranceError::DuplicateClaimNumber(claim.claim_number.clone()));
        }
        if let Some(existing) = self.work.claims.values().find(|c| c.target == claim.target) {
            return Err(InsuranceError::DuplicateClaim {
                claim_number: existing.claim_number.clone(),
            });
        }
        self.work.claims.insert(claim.id, claim.clone());
        Ok(())
    }

    async fn lock_claim(&mut self, claim_id: Uuid) -> InsuranceResult<Option<InsuranceClaim>> {
        Ok(self.work.claims.get(&claim_id).cloned())
    }

    async fn update_claim(&mut self, claim: &InsuranceClaim) -> InsuranceResult<()> {
        match self.work.claims.get_mut(&claim.id) {
            Some(stored) => {
                *stored = claim.clone();
                Ok(())
            }
            None => Err(InsuranceError::ClaimNotFound(claim.id)),
        }
    }

    async fn delete_claim(&mut self, claim_id: Uuid) -> InsuranceResult<()> {
        self.work.claims.remove(&claim_id);
        Ok(())
    }

    async fn encounter_links(&mut self, target: &ClaimTarget) -> InsuranceResult<Option<EncounterLinks>> {
        Ok(self.work.orders.get(target).map(|o| o.order.links))
    }

    async fn find_or_create_summary(
        &mut self,
        encounter: &Encounter,
        patient_insurance_id: Uuid,
    ) -> InsuranceResult<ClaimSummary> {
        let existing = self
            .work
            .summaries
            .values()
            .find(|s| s.encounter == *encounter && s.patient_insurance_id == patient_insurance_id);
        if let Some(summary) = existing {
            return Ok(summary.clone());
        }

        let summary = ClaimSummary::new(*encounter, patient_insurance_id);
        self.work.summaries.insert(summary.id, summary.clone());
        Ok(summary)
    }

    async fn lock_summary(&mut self, summary_id: Uuid) -> InsuranceResult<Option<ClaimSummary>> {
        Ok(self.work.summaries.get(&summary_id).cloned())
    }

    async fn summary_claims(&mut self, summary_id: Uuid) -> InsuranceResult<Vec<InsuranceClaim>> {
        let mut claims: Vec<_> = self
            .work
            .claims
            .values()
            .filter(|c| c.summary_id == Some(summary_id))
            .cloned()
            .collect();
        claims.sort_by_key(|c| c.created_at);
        Ok(claims)
    }

    async fn update_summary(&mut self, summary: &ClaimSummary) -> InsuranceResult<()> {
        self.work.summaries.insert(summary.id, summary.clone());
        Ok(())
    }

    async fn delete_summary(&mut self, summary_id: Uuid) -> InsuranceResult<()> {
        self.work.summaries.remove(&summary_id);
        Ok(())
    }
}

#[async_trait]
impl SettlementTx for MemoryTx {
    async fn insert_order(&mut self, order: &OrderRef) -> BillingResult<Order> {
        if self.work.orders.contains_key(&order.target) {
            return Err(BillingError::DuplicateOrder(order.id()));
        }
        self.work.next_sequence += 1;
        let stored = Order::pending(order.clone(), self.work.next_sequence);
        self.work.orders.insert(order.target, stored.clone());
        Ok(stored)
    }

    async fn find_order(&mut self, target: &ClaimTarget) -> BillingResult<Option<Order>> {
        Ok(self.work.orders.get(target).cloned())
    }

    async fn lock_order(&mut self, target: &ClaimTarget) -> BillingResult<Option<Order>> {
        Ok(self.work.orders.get(target).cloned())
    }

    async fn update_order(&mut self, order: &Order) -> BillingResult<()> {
        self.work.orders.insert(order.order.target, order.clone());
        Ok(())
    }

    async fn pending_admission_orders(&mut self, admission_id: Uuid) -> BillingResult<Vec<Order>> {
        Ok(self
            .work
            .orders
            .values()
            .filter(|o| o.is_pending() && o.order.links.admission_id == Some(admission_id))
            .cloned()
            .collect())
    }

    async fn lock_admission(&mut self, admission_id: Uuid) -> BillingResult<Option<Admission>> {
        Ok(self.work.admissions.get(&admission_id).cloned())
    }

    async fn update_admission(&mut self, admission: &Admission) -> BillingResult<()> {
        self.work.admissions.insert(admission.id, admission.clone());
        Ok(())
    }

    async fn lock_wallet(&mut self, patient_id: Uuid) -> BillingResult<Wallet> {
        Ok(self
            .work
            .wallets
            .entry(patient_id)
            .or_insert_with(|| Wallet::new(patient_id, Decimal::ZERO))
            .clone())
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> BillingResult<()> {
        self.work.wallets.insert(wallet.patient_id, wallet.clone());
        Ok(())
    }

    async fn insert_transaction(&mut self, record: &TransactionRecord) -> BillingResult<()> {
        self.work.transactions.push(record.clone());
        Ok(())
    }
}
