use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::InsuranceResult;
use crate::models::{
    ClaimSummary, ClaimTarget, CoveragePlan, Encounter, EncounterLinks, InsuranceClaim, PatientInsurance,
    ServiceCategory,
};

/// Claim-side operations of one open storage transaction
///
/// Every call runs inside the caller's transaction; nothing is visible to
/// other transactions until the owner commits. `lock_*` and
/// `find_or_create_summary` take row locks held until commit or rollback.
#[async_trait]
pub trait ClaimTx: Send {
    /// The patient's policy that is valid on `on`, if any
    async fn active_insurance(&mut self, patient_id: Uuid, on: NaiveDate) -> InsuranceResult<Option<PatientInsurance>>;

    async fn coverage_plan(&mut self, plan_id: Uuid) -> InsuranceResult<Option<CoveragePlan>>;

    /// Sum of covered amounts of non-rejected claims of a policy in one
    /// category with a service date inside `from..=to`
    async fn covered_in_period(
        &mut self,
        patient_insurance_id: Uuid,
        category: ServiceCategory,
        from: NaiveDate,
        to: NaiveDate,
    ) -> InsuranceResult<Decimal>;

    async fn claim_for_target(&mut self, target: &ClaimTarget) -> InsuranceResult<Option<InsuranceClaim>>;

    /// Insert a new claim; fails with `DuplicateClaimNumber` on a number
    /// collision and leaves the transaction usable
    async fn insert_claim(&mut self, claim: &InsuranceClaim) -> InsuranceResult<()>;

    async fn lock_claim(&mut self, claim_id: Uuid) -> InsuranceResult<Option<InsuranceClaim>>;

    async fn update_claim(&mut self, claim: &InsuranceClaim) -> InsuranceResult<()>;

    async fn delete_claim(&mut self, claim_id: Uuid) -> InsuranceResult<()>;

    /// Encounter references of the order behind `target`; `None` when the
    /// order is unknown
    async fn encounter_links(&mut self, target: &ClaimTarget) -> InsuranceResult<Option<EncounterLinks>>;

    async fn find_or_create_summary(
        &mut self,
        encounter: &Encounter,
        patient_insurance_id: Uuid,
    ) -> InsuranceResult<ClaimSummary>;

    async fn lock_summary(&mut self, summary_id: Uuid) -> InsuranceResult<Option<ClaimSummary>>;

    async fn summary_claims(&mut self, summary_id: Uuid) -> InsuranceResult<Vec<InsuranceClaim>>;

    async fn update_summary(&mut self, summary: &ClaimSummary) -> InsuranceResult<()>;

    async fn delete_summary(&mut self, summary_id: Uuid) -> InsuranceResult<()>;
}
