use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InsuranceError, InsuranceResult};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Service category a coverage rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Consultation,
    Drug,
    Laboratory,
    Radiology,
    Surgery,
    Admission,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 6] = [
        Self::Consultation,
        Self::Drug,
        Self::Laboratory,
        Self::Radiology,
        Self::Surgery,
        Self::Admission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::Drug => "drug",
            Self::Laboratory => "laboratory",
            Self::Radiology => "radiology",
            Self::Surgery => "surgery",
            Self::Admission => "admission",
        }
    }
}

impl FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown service category: {s}"))
    }
}

/// Coverage mode for one service category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    All,
    None,
    IncludeSelected,
    ExcludeSelected,
}

impl CoverageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::None => "none",
            Self::IncludeSelected => "include_selected",
            Self::ExcludeSelected => "exclude_selected",
        }
    }
}

impl FromStr for CoverageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            "include_selected" => Ok(Self::IncludeSelected),
            "exclude_selected" => Ok(Self::ExcludeSelected),
            other => Err(format!("unknown coverage mode: {other}")),
        }
    }
}

/// Coverage rule of one category inside a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCoverage {
    pub mode: CoverageMode,
    /// Always within 0-100, see [`CategoryCoverage::new`]
    percentage: Decimal,
    pub annual_limit: Option<Decimal>,
    /// Drugs, lab test templates, scan templates or surgery types
    pub selected_items: BTreeSet<Uuid>,
}

impl CategoryCoverage {
    /// Create a rule, clamping the percentage to 0-100
    pub fn new(mode: CoverageMode, percentage: Decimal) -> Self {
        Self {
            mode,
            percentage: percentage.clamp(Decimal::ZERO, HUNDRED),
            annual_limit: None,
            selected_items: BTreeSet::new(),
        }
    }

    pub fn none() -> Self {
        Self::new(CoverageMode::None, Decimal::ZERO)
    }

    pub fn all(percentage: Decimal) -> Self {
        Self::new(CoverageMode::All, percentage)
    }

    pub fn include(percentage: Decimal, items: impl IntoIterator<Item = Uuid>) -> Self {
        Self::new(CoverageMode::IncludeSelected, percentage).with_items(items)
    }

    pub fn exclude(percentage: Decimal, items: impl IntoIterator<Item = Uuid>) -> Self {
        Self::new(CoverageMode::ExcludeSelected, percentage).with_items(items)
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = Uuid>) -> Self {
        self.selected_items.extend(items);
        self
    }

    pub fn with_annual_limit(mut self, limit: Decimal) -> Self {
        self.annual_limit = Some(limit.max(Decimal::ZERO));
        self
    }

    /// Effective percentage; zero when the mode is `none`
    pub fn percentage(&self) -> Decimal {
        match self.mode {
            CoverageMode::None => Decimal::ZERO,
            _ => self.percentage,
        }
    }
}

impl Default for CategoryCoverage {
    fn default() -> Self {
        Self::none()
    }
}

/// HMO coverage plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveragePlan {
    pub id: Uuid,
    pub hmo_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub consultation: CategoryCoverage,
    pub drug: CategoryCoverage,
    pub laboratory: CategoryCoverage,
    pub radiology: CategoryCoverage,
    pub surgery: CategoryCoverage,
    pub admission: CategoryCoverage,
}

impl CoveragePlan {
    /// New active plan that covers nothing until rules are set
    pub fn new(hmo_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            hmo_id,
            name: name.into(),
            is_active: true,
            consultation: CategoryCoverage::none(),
            drug: CategoryCoverage::none(),
            laboratory: CategoryCoverage::none(),
            radiology: CategoryCoverage::none(),
            surgery: CategoryCoverage::none(),
            admission: CategoryCoverage::none(),
        }
    }

    pub fn with_rule(mut self, category: ServiceCategory, rule: CategoryCoverage) -> Self {
        *self.rule_mut(category) = rule;
        self
    }

    pub fn rule(&self, category: ServiceCategory) -> &CategoryCoverage {
        match category {
            ServiceCategory::Consultation => &self.consultation,
            ServiceCategory::Drug => &self.drug,
            ServiceCategory::Laboratory => &self.laboratory,
            ServiceCategory::Radiology => &self.radiology,
            ServiceCategory::Surgery => &self.surgery,
            ServiceCategory::Admission => &self.admission,
        }
    }

    fn rule_mut(&mut self, category: ServiceCategory) -> &mut CategoryCoverage {
        match category {
            ServiceCategory::Consultation => &mut self.consultation,
            ServiceCategory::Drug => &mut self.drug,
            ServiceCategory::Laboratory => &mut self.laboratory,
            ServiceCategory::Radiology => &mut self.radiology,
            ServiceCategory::Surgery => &mut self.surgery,
            ServiceCategory::Admission => &mut self.admission,
        }
    }
}

/// A patient's enrolment with an HMO under one coverage plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInsurance {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub hmo_id: Uuid,
    pub coverage_plan_id: Uuid,
    pub policy_number: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub is_active: bool,
    pub is_verified: bool,
}

impl PatientInsurance {
    /// Active, verified and `date` inside the validity window (inclusive)
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.is_verified && self.valid_from <= date && date <= self.valid_to
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_on(Utc::now().date_naive())
    }
}

/// Kind of order a claim is raised against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Drug,
    Laboratory,
    Scan,
    Service,
    Surgery,
    Consultation,
    Admission,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drug => "drug",
            Self::Laboratory => "laboratory",
            Self::Scan => "scan",
            Self::Service => "service",
            Self::Surgery => "surgery",
            Self::Consultation => "consultation",
            Self::Admission => "admission",
        }
    }

    /// Plan category whose rule decides coverage for this claim type
    pub fn category(&self) -> ServiceCategory {
        match self {
            Self::Drug => ServiceCategory::Drug,
            Self::Laboratory => ServiceCategory::Laboratory,
            Self::Scan => ServiceCategory::Radiology,
            Self::Surgery => ServiceCategory::Surgery,
            Self::Service | Self::Consultation => ServiceCategory::Consultation,
            Self::Admission => ServiceCategory::Admission,
        }
    }

    /// Claim types billed under a plan category
    pub fn for_category(category: ServiceCategory) -> &'static [ClaimType] {
        match category {
            ServiceCategory::Consultation => &[Self::Service, Self::Consultation],
            ServiceCategory::Drug => &[Self::Drug],
            ServiceCategory::Laboratory => &[Self::Laboratory],
            ServiceCategory::Radiology => &[Self::Scan],
            ServiceCategory::Surgery => &[Self::Surgery],
            ServiceCategory::Admission => &[Self::Admission],
        }
    }
}

impl FromStr for ClaimType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drug" => Ok(Self::Drug),
            "laboratory" => Ok(Self::Laboratory),
            "scan" => Ok(Self::Scan),
            "service" => Ok(Self::Service),
            "surgery" => Ok(Self::Surgery),
            "consultation" => Ok(Self::Consultation),
            "admission" => Ok(Self::Admission),
            other => Err(format!("unknown claim type: {other}")),
        }
    }
}

/// The billable order a claim belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "claim_type", content = "order_id", rename_all = "snake_case")]
pub enum ClaimTarget {
    Drug(Uuid),
    Laboratory(Uuid),
    Scan(Uuid),
    Service(Uuid),
    Surgery(Uuid),
    Consultation(Uuid),
    Admission(Uuid),
}

impl ClaimTarget {
    pub fn new(claim_type: ClaimType, order_id: Uuid) -> Self {
        match claim_type {
            ClaimType::Drug => Self::Drug(order_id),
            ClaimType::Laboratory => Self::Laboratory(order_id),
            ClaimType::Scan => Self::Scan(order_id),
            ClaimType::Service => Self::Service(order_id),
            ClaimType::Surgery => Self::Surgery(order_id),
            ClaimType::Consultation => Self::Consultation(order_id),
            ClaimType::Admission => Self::Admission(order_id),
        }
    }

    pub fn claim_type(&self) -> ClaimType {
        match self {
            Self::Drug(_) => ClaimType::Drug,
            Self::Laboratory(_) => ClaimType::Laboratory,
            Self::Scan(_) => ClaimType::Scan,
            Self::Service(_) => ClaimType::Service,
            Self::Surgery(_) => ClaimType::Surgery,
            Self::Consultation(_) => ClaimType::Consultation,
            Self::Admission(_) => ClaimType::Admission,
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            Self::Drug(id)
            | Self::Laboratory(id)
            | Self::Scan(id)
            | Self::Service(id)
            | Self::Surgery(id)
            | Self::Consultation(id)
            | Self::Admission(id) => *id,
        }
    }

    pub fn category(&self) -> ServiceCategory {
        self.claim_type().category()
    }
}

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Processing,
    Approved,
    PartiallyApproved,
    Rejected,
    Paid,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::PartiallyApproved => "partially_approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    /// Still awaiting an adjudication decision
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "approved" => Ok(Self::Approved),
            "partially_approved" => Ok(Self::PartiallyApproved),
            "rejected" => Ok(Self::Rejected),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown claim status: {other}")),
        }
    }
}

/// Insurance claim against one billable order
///
/// `covered_amount + patient_amount == total_amount` holds after every
/// mutation below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceClaim {
    pub id: Uuid,
    pub claim_number: String,
    pub patient_id: Uuid,
    pub patient_insurance_id: Uuid,
    pub target: ClaimTarget,
    pub total_amount: Decimal,
    pub approved_amount: Option<Decimal>,
    pub covered_amount: Decimal,
    pub patient_amount: Decimal,
    pub status: ClaimStatus,
    pub service_date: NaiveDate,
    pub processed_date: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub paid_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub summary_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InsuranceClaim {
    pub fn is_balanced(&self) -> bool {
        self.covered_amount + self.patient_amount == self.total_amount
    }

    fn ensure_status(&self, allowed: &[ClaimStatus], action: &'static str) -> InsuranceResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(InsuranceError::InvalidState {
                claim_number: self.claim_number.clone(),
                status: self.status,
                action,
            })
        }
    }

    /// `pending -> processing`
    pub fn start_processing(&mut self, at: DateTime<Utc>) -> InsuranceResult<()> {
        self.ensure_status(&[ClaimStatus::Pending], "moved to processing")?;
        self.status = ClaimStatus::Processing;
        self.updated_at = at;
        Ok(())
    }

    /// Approve `approved_amount` of the total
    ///
    /// A reason together with an amount below the total records a partial
    /// approval.
    pub fn approve(
        &mut self,
        approved_amount: Decimal,
        by: Uuid,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> InsuranceResult<()> {
        self.ensure_status(&[ClaimStatus::Pending, ClaimStatus::Processing], "approved")?;
        if approved_amount.is_sign_negative() || approved_amount > self.total_amount {
            return Err(InsuranceError::InvalidAmount(format!(
                "approved amount {approved_amount} must be within 0-{}",
                self.total_amount
            )));
        }
        if approved_amount.round_dp(2) != approved_amount {
            return Err(InsuranceError::InvalidAmount(format!(
                "approved amount {approved_amount} has more than two decimal places"
            )));
        }

        self.status = if reason.is_some() && approved_amount < self.total_amount {
            ClaimStatus::PartiallyApproved
        } else {
            ClaimStatus::Approved
        };
        self.approved_amount = Some(approved_amount);
        self.covered_amount = approved_amount;
        self.patient_amount = self.total_amount - approved_amount;
        self.notes = reason;
        self.processed_date = Some(at);
        self.processed_by = Some(by);
        self.updated_at = at;
        Ok(())
    }

    /// Reject the claim; the patient carries the full total
    pub fn reject(&mut self, by: Uuid, reason: String, at: DateTime<Utc>) -> InsuranceResult<()> {
        self.ensure_status(&[ClaimStatus::Pending, ClaimStatus::Processing], "rejected")?;
        self.status = ClaimStatus::Rejected;
        self.approved_amount = Some(Decimal::ZERO);
        self.covered_amount = Decimal::ZERO;
        self.patient_amount = self.total_amount;
        self.rejection_reason = Some(reason);
        self.processed_date = Some(at);
        self.processed_by = Some(by);
        self.updated_at = at;
        Ok(())
    }

    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> InsuranceResult<()> {
        self.ensure_status(&[ClaimStatus::Approved, ClaimStatus::PartiallyApproved], "marked paid")?;
        self.status = ClaimStatus::Paid;
        self.paid_date = Some(at);
        self.updated_at = at;
        Ok(())
    }
}

/// Clinical encounter claims are grouped under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "encounter_type", content = "encounter_id", rename_all = "snake_case")]
pub enum Encounter {
    Consultation(Uuid),
    Admission(Uuid),
    Surgery(Uuid),
}

impl Encounter {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Consultation(_) => "consultation",
            Self::Admission(_) => "admission",
            Self::Surgery(_) => "surgery",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Consultation(id) | Self::Admission(id) | Self::Surgery(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "consultation" => Some(Self::Consultation(id)),
            "admission" => Some(Self::Admission(id)),
            "surgery" => Some(Self::Surgery(id)),
            _ => None,
        }
    }
}

/// Encounter references carried by an order row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterLinks {
    pub admission_id: Option<Uuid>,
    pub consultation_id: Option<Uuid>,
    pub surgery_id: Option<Uuid>,
}

/// Claims of one (encounter, policy) pair rolled up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub id: Uuid,
    pub encounter: Encounter,
    pub patient_insurance_id: Uuid,
    pub claim_count: u32,
    pub total_amount: Decimal,
    pub covered_amount: Decimal,
    pub patient_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimSummary {
    pub fn new(encounter: Encounter, patient_insurance_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            encounter,
            patient_insurance_id,
            claim_count: 0,
            total_amount: Decimal::ZERO,
            covered_amount: Decimal::ZERO,
            patient_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the totals with the sums over `claims`
    pub fn recompute<'a>(&mut self, claims: impl IntoIterator<Item = &'a InsuranceClaim>) {
        let mut count = 0u32;
        let (mut total, mut covered, mut patient) = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        for claim in claims {
            count = count.saturating_add(1);
            total += claim.total_amount;
            covered += claim.covered_amount;
            patient += claim.patient_amount;
        }
        self.claim_count = count;
        self.total_amount = total;
        self.covered_amount = covered;
        self.patient_amount = patient;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn claim(total: Decimal, covered: Decimal) -> InsuranceClaim {
        let now = Utc::now();
        InsuranceClaim {
            id: Uuid::new_v4(),
            claim_number: "CLM-0000ABCD".to_string(),
            patient_id: Uuid::new_v4(),
            patient_insurance_id: Uuid::new_v4(),
            target: ClaimTarget::Drug(Uuid::new_v4()),
            total_amount: total,
            approved_amount: None,
            covered_amount: covered,
            patient_amount: total - covered,
            status: ClaimStatus::Pending,
            service_date: now.date_naive(),
            processed_date: None,
            processed_by: None,
            paid_date: None,
            rejection_reason: None,
            notes: None,
            summary_id: None,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_is_clamped() {
        assert_eq!(CategoryCoverage::all(dec!(140)).percentage(), dec!(100));
        assert_eq!(CategoryCoverage::all(dec!(-5)).percentage(), dec!(0));
        assert_eq!(CategoryCoverage::new(CoverageMode::None, dec!(80)).percentage(), dec!(0));
    }

    #[test]
    fn test_insurance_validity_window() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let mut insurance = PatientInsurance {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            hmo_id: Uuid::new_v4(),
            coverage_plan_id: Uuid::new_v4(),
            policy_number: "POL-1".to_string(),
            valid_from: from,
            valid_to: to,
            is_active: true,
            is_verified: true,
        };
        assert!(insurance.is_valid_on(from));
        assert!(insurance.is_valid_on(to));
        assert!(!insurance.is_valid_on(to.succ_opt().unwrap()));

        insurance.is_verified = false;
        assert!(!insurance.is_valid_on(from));
    }

    #[test]
    fn test_rejection_moves_everything_to_patient() {
        let mut claim = claim(dec!(100.00), dec!(70.00));
        claim.reject(Uuid::new_v4(), "not medically necessary".to_string(), Utc::now()).unwrap();
        assert_eq!(claim.status, ClaimStatus::Rejected);
        assert_eq!(claim.covered_amount, dec!(0.00));
        assert_eq!(claim.patient_amount, dec!(100.00));
        assert!(claim.is_balanced());
    }

    #[test]
    fn test_partial_approval_requires_reason() {
        let mut with_reason = claim(dec!(100.00), dec!(70.00));
        with_reason
            .approve(dec!(60.00), Uuid::new_v4(), Some("tariff cap".to_string()), Utc::now())
            .unwrap();
        assert_eq!(with_reason.status, ClaimStatus::PartiallyApproved);
        assert_eq!(with_reason.patient_amount, dec!(40.00));
        assert!(with_reason.is_balanced());

        let mut without_reason = claim(dec!(100.00), dec!(70.00));
        without_reason.approve(dec!(60.00), Uuid::new_v4(), None, Utc::now()).unwrap();
        assert_eq!(without_reason.status, ClaimStatus::Approved);
        assert_eq!(without_reason.approved_amount, Some(dec!(60.00)));
    }

    #[test]
    fn test_approval_rejects_out_of_range_amounts() {
        let mut claim = claim(dec!(100.00), dec!(70.00));
        let by = Uuid::new_v4();
        assert!(matches!(
            claim.approve(dec!(100.01), by, None, Utc::now()),
            Err(InsuranceError::InvalidAmount(_))
        ));
        assert!(matches!(
            claim.approve(dec!(-1), by, None, Utc::now()),
            Err(InsuranceError::InvalidAmount(_))
        ));
        assert!(matches!(
            claim.approve(dec!(10.005), by, None, Utc::now()),
            Err(InsuranceError::InvalidAmount(_))
        ));
        assert_eq!(claim.status, ClaimStatus::Pending);
    }

    #[test]
    fn test_state_machine_is_one_way() {
        let by = Uuid::new_v4();
        let mut claim = claim(dec!(50.00), dec!(25.00));

        assert!(matches!(claim.mark_paid(Utc::now()), Err(InsuranceError::InvalidState { .. })));

        claim.start_processing(Utc::now()).unwrap();
        claim.approve(dec!(50.00), by, None, Utc::now()).unwrap();
        assert!(claim.reject(by, "late".to_string(), Utc::now()).is_err());
        assert!(claim.start_processing(Utc::now()).is_err());

        claim.mark_paid(Utc::now()).unwrap();
        assert_eq!(claim.status, ClaimStatus::Paid);
        match claim.mark_paid(Utc::now()) {
            Err(InsuranceError::InvalidState { status, .. }) => assert_eq!(status, ClaimStatus::Paid),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn test_claim_type_round_trips_through_target() {
        let order_id = Uuid::new_v4();
        let target = ClaimTarget::new(ClaimType::Scan, order_id);
        assert_eq!(target, ClaimTarget::Scan(order_id));
        assert_eq!(target.category(), ServiceCategory::Radiology);
        assert_eq!("scan".parse::<ClaimType>(), Ok(ClaimType::Scan));
    }

    #[test]
    fn test_summary_recompute() {
        let claims = [claim(dec!(200.00), dec!(120.00)), claim(dec!(50.00), dec!(0))];
        let mut summary = ClaimSummary::new(Encounter::Admission(Uuid::new_v4()), Uuid::new_v4());
        summary.recompute(claims.iter());
        assert_eq!(summary.claim_count, 2);
        assert_eq!(summary.total_amount, dec!(250.00));
        assert_eq!(summary.covered_amount, dec!(120.00));
        assert_eq!(summary.patient_amount, dec!(130.00));
    }
}
