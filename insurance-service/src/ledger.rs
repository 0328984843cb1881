use chrono::{Datelike, NaiveDate, Utc};
use config_engine::SettlementConfig;
use logger_redacted::PiiRedactor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculator::{Capped, ClaimCalculator, CoverageSplit, Percentage};
use crate::claim_number::{ClaimNumberGenerator, RandomClaimNumbers};
use crate::coverage::CoverageResolver;
use crate::error::{InsuranceError, InsuranceResult};
use crate::models::{
    ClaimStatus, ClaimSummary, ClaimTarget, CoveragePlan, Encounter, EncounterLinks, InsuranceClaim,
    PatientInsurance,
};
use crate::store::ClaimTx;

/// What the ordering workflow knows about the order being claimed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub target: ClaimTarget,
    pub patient_id: Uuid,
    /// Drug, test template, scan template or surgery type; `None` for
    /// itemless services
    pub billed_item: Option<Uuid>,
    pub total_amount: Decimal,
    pub service_date: NaiveDate,
    pub created_by: Uuid,
}

/// Encounter a claim is summarised under
///
/// Consultation, admission and surgery orders are encounters themselves.
/// Drug, lab, scan and service orders belong to their admission first, then
/// their consultation, then their surgery.
pub fn resolve_encounter(target: &ClaimTarget, links: Option<&EncounterLinks>) -> Option<Encounter> {
    match target {
        ClaimTarget::Consultation(id) => Some(Encounter::Consultation(*id)),
        ClaimTarget::Admission(id) => Some(Encounter::Admission(*id)),
        ClaimTarget::Surgery(id) => Some(Encounter::Surgery(*id)),
        ClaimTarget::Drug(_) | ClaimTarget::Laboratory(_) | ClaimTarget::Scan(_) | ClaimTarget::Service(_) => {
            let links = links?;
            links
                .admission_id
                .map(Encounter::Admission)
                .or(links.consultation_id.map(Encounter::Consultation))
                .or(links.surgery_id.map(Encounter::Surgery))
        }
    }
}

/// Creates, adjudicates and summarises insurance claims
///
/// Every operation runs against a caller-supplied [`ClaimTx`] so that claim
/// writes and summary recalculation commit together with whatever else the
/// caller does in that transaction.
pub struct ClaimLedger<G = RandomClaimNumbers> {
    resolver: CoverageResolver,
    calculator: ClaimCalculator,
    numbers: G,
    attempts: u32,
    redactor: PiiRedactor,
}

impl ClaimLedger {
    pub fn new(config: &SettlementConfig) -> Self {
        Self::with_generator(config, RandomClaimNumbers::new(config.claim_number_prefix.clone()))
    }
}

impl<G: ClaimNumberGenerator> ClaimLedger<G> {
    pub fn with_generator(config: &SettlementConfig, numbers: G) -> Self {
        Self {
            resolver: CoverageResolver::new(config.itemless_coverage),
            calculator: ClaimCalculator::new(),
            numbers,
            attempts: config.claim_number_attempts.max(1),
            redactor: PiiRedactor::from_config(&config.logging),
        }
    }

    pub fn resolver(&self) -> &CoverageResolver {
        &self.resolver
    }

    /// Raise a pending claim for an order
    ///
    /// Returns `Ok(None)` when the patient has no valid policy or the plan
    /// does not cover the order; the patient then pays the whole total.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive total, `DuplicateClaim` when the
    /// order already carries a claim, `ClaimNumberExhausted` when every
    /// generated number collided.
    pub async fn create_claim<T>(
        &self,
        tx: &mut T,
        insurance: Option<&PatientInsurance>,
        request: &ClaimRequest,
    ) -> InsuranceResult<Option<InsuranceClaim>>
    where
        T: ClaimTx + ?Sized,
    {
        if request.total_amount <= Decimal::ZERO {
            return Err(InsuranceError::InvalidAmount(format!(
                "total {} must be positive",
                request.total_amount
            )));
        }

        let Some(insurance) = insurance.filter(|i| i.is_valid_on(request.service_date)) else {
            debug!(order_id = %request.target.order_id(), "No active insurance; patient pays in full");
            return Ok(None);
        };

        let plan = tx
            .coverage_plan(insurance.coverage_plan_id)
            .await?
            .ok_or(InsuranceError::CoveragePlanNotFound(insurance.coverage_plan_id))?;

        let category = request.target.category();
        if !self.resolver.is_covered(&plan, category, request.billed_item) {
            debug!(
                order_id = %request.target.order_id(),
                category = ?category,
                "Order not covered by plan; patient pays in full"
            );
            return Ok(None);
        }

        if let Some(existing) = tx.claim_for_target(&request.target).await? {
            return Err(InsuranceError::DuplicateClaim {
                claim_number: existing.claim_number,
            });
        }

        let split = self.split(tx, &plan, insurance, request).await?;
        let mut claim = self.new_claim(insurance, request, &split);
        self.insert_with_fresh_number(tx, &mut claim).await?;
        self.attach_to_summary(tx, &mut claim).await?;

        info!(
            claim_number = %claim.claim_number,
            policy_number = %self.redactor.mask_policy_number(&insurance.policy_number),
            claim_type = claim.target.claim_type().as_str(),
            total = %claim.total_amount,
            covered = %claim.covered_amount,
            patient = %claim.patient_amount,
            "Insurance claim created"
        );

        Ok(Some(claim))
    }

    async fn split<T>(
        &self,
        tx: &mut T,
        plan: &CoveragePlan,
        insurance: &PatientInsurance,
        request: &ClaimRequest,
    ) -> InsuranceResult<CoverageSplit>
    where
        T: ClaimTx + ?Sized,
    {
        let category = request.target.category();
        let percentage = Percentage(self.resolver.coverage_percentage(plan, category));

        let Some(limit) = plan.rule(category).annual_limit else {
            return self.calculator.split_with(request.total_amount, &percentage);
        };

        let date = request.service_date;
        let year_start = date.with_ordinal(1).unwrap_or(date);
        let year_end = NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date);
        let used = tx
            .covered_in_period(insurance.id, category, year_start, year_end)
            .await?;

        let capped = Capped {
            inner: percentage,
            cap: (limit - used).max(Decimal::ZERO),
        };
        self.calculator.split_with(request.total_amount, &capped)
    }

    fn new_claim(&self, insurance: &PatientInsurance, request: &ClaimRequest, split: &CoverageSplit) -> InsuranceClaim {
        let now = Utc::now();
        InsuranceClaim {
            id: Uuid::new_v4(),
            claim_number: String::new(),
            patient_id: request.patient_id,
            patient_insurance_id: insurance.id,
            target: request.target,
            total_amount: split.total,
            approved_amount: None,
            covered_amount: split.covered,
            patient_amount: split.patient,
            status: ClaimStatus::Pending,
            service_date: request.service_date,
            processed_date: None,
            processed_by: None,
            paid_date: None,
            rejection_reason: None,
            notes: None,
            summary_id: None,
            created_by: request.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    async fn insert_with_fresh_number<T>(&self, tx: &mut T, claim: &mut InsuranceClaim) -> InsuranceResult<()>
    where
        T: ClaimTx + ?Sized,
    {
        for attempt in 1..=self.attempts {
            claim.claim_number = self.numbers.next_claim_number();
            match tx.insert_claim(claim).await {
                Ok(()) => return Ok(()),
                Err(InsuranceError::DuplicateClaimNumber(number)) => {
                    debug!(claim_number = %number, attempt, "Claim number collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(InsuranceError::ClaimNumberExhausted(self.attempts))
    }

    async fn load<T>(&self, tx: &mut T, claim_id: Uuid) -> InsuranceResult<InsuranceClaim>
    where
        T: ClaimTx + ?Sized,
    {
        tx.lock_claim(claim_id)
            .await?
            .ok_or(InsuranceError::ClaimNotFound(claim_id))
    }

    /// Persist an adjudication change and bring its summary up to date
    async fn save<T>(&self, tx: &mut T, claim: &mut InsuranceClaim) -> InsuranceResult<()>
    where
        T: ClaimTx + ?Sized,
    {
        tx.update_claim(claim).await?;
        self.attach_to_summary(tx, claim).await?;
        Ok(())
    }

    /// `pending -> processing`
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the claim is pending.
    pub async fn start_processing<T>(&self, tx: &mut T, claim_id: Uuid) -> InsuranceResult<InsuranceClaim>
    where
        T: ClaimTx + ?Sized,
    {
        let mut claim = self.load(tx, claim_id).await?;
        claim.start_processing(Utc::now())?;
        self.save(tx, &mut claim).await?;
        Ok(claim)
    }

    /// Approve `approved_amount`; a reason with a reduced amount records a
    /// partial approval
    ///
    /// # Errors
    ///
    /// `InvalidState` unless pending or processing, `InvalidAmount` for an
    /// amount outside `0..=total`.
    pub async fn approve<T>(
        &self,
        tx: &mut T,
        claim_id: Uuid,
        approved_amount: Decimal,
        by: Uuid,
        reason: Option<String>,
    ) -> InsuranceResult<InsuranceClaim>
    where
        T: ClaimTx + ?Sized,
    {
        let mut claim = self.load(tx, claim_id).await?;
        claim.approve(approved_amount, by, reason, Utc::now())?;
        self.save(tx, &mut claim).await?;

        info!(
            claim_number = %claim.claim_number,
            status = %claim.status,
            approved = %approved_amount,
            "Insurance claim approved"
        );
        Ok(claim)
    }

    /// # Errors
    ///
    /// `InvalidState` unless pending or processing.
    pub async fn reject<T>(&self, tx: &mut T, claim_id: Uuid, by: Uuid, reason: &str) -> InsuranceResult<InsuranceClaim>
    where
        T: ClaimTx + ?Sized,
    {
        let mut claim = self.load(tx, claim_id).await?;
        claim.reject(by, reason.to_string(), Utc::now())?;
        self.save(tx, &mut claim).await?;

        info!(
            claim_number = %claim.claim_number,
            reason = %self.redactor.redact(reason),
            "Insurance claim rejected"
        );
        Ok(claim)
    }

    /// # Errors
    ///
    /// `InvalidState` unless approved or partially approved.
    pub async fn mark_paid<T>(&self, tx: &mut T, claim_id: Uuid) -> InsuranceResult<InsuranceClaim>
    where
        T: ClaimTx + ?Sized,
    {
        let mut claim = self.load(tx, claim_id).await?;
        claim.mark_paid(Utc::now())?;
        self.save(tx, &mut claim).await?;

        info!(claim_number = %claim.claim_number, "Insurance claim paid");
        Ok(claim)
    }

    /// Link the claim to its `(encounter, policy)` summary and recalculate
    /// the summary totals
    ///
    /// Claims whose order resolves to no encounter stay summary-less. Calling
    /// this again for an attached claim only recalculates.
    pub async fn attach_to_summary<T>(&self, tx: &mut T, claim: &mut InsuranceClaim) -> InsuranceResult<Option<ClaimSummary>>
    where
        T: ClaimTx + ?Sized,
    {
        let links = tx.encounter_links(&claim.target).await?;
        let Some(encounter) = resolve_encounter(&claim.target, links.as_ref()) else {
            warn!(
                claim_number = %claim.claim_number,
                claim_type = claim.target.claim_type().as_str(),
                order_id = %claim.target.order_id(),
                "Orphan claim: no encounter found, claim kept without summary"
            );
            return Ok(None);
        };

        let summary = tx
            .find_or_create_summary(&encounter, claim.patient_insurance_id)
            .await?;

        if claim.summary_id != Some(summary.id) {
            let previous = claim.summary_id.replace(summary.id);
            tx.update_claim(claim).await?;
            if let Some(previous) = previous {
                self.refresh_summary(tx, previous).await?;
            }
        }

        self.recalculate(tx, summary).await
    }

    /// Recalculate, or delete when empty, the summary a removed claim
    /// belonged to
    pub async fn on_claim_removed<T>(&self, tx: &mut T, claim: &InsuranceClaim) -> InsuranceResult<Option<ClaimSummary>>
    where
        T: ClaimTx + ?Sized,
    {
        match claim.summary_id {
            Some(summary_id) => self.refresh_summary(tx, summary_id).await,
            None => Ok(None),
        }
    }

    /// Delete an unpaid claim and update its summary
    ///
    /// # Errors
    ///
    /// `InvalidState` for a paid claim.
    pub async fn remove_claim<T>(&self, tx: &mut T, claim_id: Uuid) -> InsuranceResult<InsuranceClaim>
    where
        T: ClaimTx + ?Sized,
    {
        let claim = self.load(tx, claim_id).await?;
        if claim.status == ClaimStatus::Paid {
            return Err(InsuranceError::InvalidState {
                claim_number: claim.claim_number,
                status: claim.status,
                action: "removed",
            });
        }

        tx.delete_claim(claim.id).await?;
        self.on_claim_removed(tx, &claim).await?;

        info!(claim_number = %claim.claim_number, "Insurance claim removed");
        Ok(claim)
    }

    async fn refresh_summary<T>(&self, tx: &mut T, summary_id: Uuid) -> InsuranceResult<Option<ClaimSummary>>
    where
        T: ClaimTx + ?Sized,
    {
        match tx.lock_summary(summary_id).await? {
            Some(summary) => self.recalculate(tx, summary).await,
            None => Ok(None),
        }
    }

    async fn recalculate<T>(&self, tx: &mut T, mut summary: ClaimSummary) -> InsuranceResult<Option<ClaimSummary>>
    where
        T: ClaimTx + ?Sized,
    {
        let claims = tx.summary_claims(summary.id).await?;
        if claims.is_empty() {
            tx.delete_summary(summary.id).await?;
            debug!(summary_id = %summary.id, "Empty claim summary deleted");
            return Ok(None);
        }

        summary.recompute(claims.iter());
        tx.update_summary(&summary).await?;
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encounter_resolution_order() {
        let admission = Uuid::new_v4();
        let consultation = Uuid::new_v4();
        let links = EncounterLinks {
            admission_id: Some(admission),
            consultation_id: Some(consultation),
            surgery_id: None,
        };
        let drug = ClaimTarget::Drug(Uuid::new_v4());
        assert_eq!(resolve_encounter(&drug, Some(&links)), Some(Encounter::Admission(admission)));

        let outpatient = EncounterLinks {
            admission_id: None,
            ..links
        };
        assert_eq!(
            resolve_encounter(&drug, Some(&outpatient)),
            Some(Encounter::Consultation(consultation))
        );

        assert_eq!(resolve_encounter(&drug, Some(&EncounterLinks::default())), None);
        assert_eq!(resolve_encounter(&drug, None), None);
    }

    #[test]
    fn test_encounter_orders_are_their_own_encounter() {
        let surgery = Uuid::new_v4();
        assert_eq!(
            resolve_encounter(&ClaimTarget::Surgery(surgery), None),
            Some(Encounter::Surgery(surgery))
        );
    }
}
