use config_engine::SettlementConfig;
use insurance_service::{ClaimLedger, InsuranceClaim};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::BillingResult;
use crate::store::SettlementStore;

/// Entry point for the insurance back office
///
/// Each call locks the claim, applies one ledger action and refreshes the
/// claim's summary in a transaction of its own.
pub struct AdjudicationService<S> {
    store: S,
    ledger: ClaimLedger,
}

impl<S: SettlementStore> AdjudicationService<S> {
    pub fn new(store: S, config: &SettlementConfig) -> Self {
        Self {
            store,
            ledger: ClaimLedger::new(config),
        }
    }

    pub async fn start_processing(&self, claim_id: Uuid) -> BillingResult<InsuranceClaim> {
        let mut tx = self.store.begin().await?;
        let claim = self.ledger.start_processing(&mut tx, claim_id).await?;
        self.store.commit(tx).await?;
        Ok(claim)
    }

    pub async fn approve(
        &self,
        claim_id: Uuid,
        approved_amount: Decimal,
        by: Uuid,
        reason: Option<String>,
    ) -> BillingResult<InsuranceClaim> {
        let mut tx = self.store.begin().await?;
        let claim = self.ledger.approve(&mut tx, claim_id, approved_amount, by, reason).await?;
        self.store.commit(tx).await?;
        Ok(claim)
    }

    pub async fn reject(&self, claim_id: Uuid, by: Uuid, reason: &str) -> BillingResult<InsuranceClaim> {
        let mut tx = self.store.begin().await?;
        let claim = self.ledger.reject(&mut tx, claim_id, by, reason).await?;
        self.store.commit(tx).await?;
        Ok(claim)
    }

    pub async fn mark_paid(&self, claim_id: Uuid) -> BillingResult<InsuranceClaim> {
        let mut tx = self.store.begin().await?;
        let claim = self.ledger.mark_paid(&mut tx, claim_id).await?;
        self.store.commit(tx).await?;
        Ok(claim)
    }

    /// Withdraw an unpaid claim
    pub async fn remove_claim(&self, claim_id: Uuid) -> BillingResult<InsuranceClaim> {
        let mut tx = self.store.begin().await?;
        let claim = self.ledger.remove_claim(&mut tx, claim_id).await?;
        self.store.commit(tx).await?;
        Ok(claim)
    }
}
