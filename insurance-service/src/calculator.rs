use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{InsuranceError, InsuranceResult};

const MONEY_DP: u32 = 2;

/// Round half-up to two decimal places
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Covered / patient split of a billed total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSplit {
    pub total: Decimal,
    pub covered: Decimal,
    pub patient: Decimal,
}

/// Computes the insurer's share of a total
pub trait CoverageFormula: Send + Sync {
    fn covered_amount(&self, total: Decimal) -> Decimal;
}

/// Flat percentage of the total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percentage(pub Decimal);

impl CoverageFormula for Percentage {
    fn covered_amount(&self, total: Decimal) -> Decimal {
        round_money(total * self.0 / Decimal::ONE_HUNDRED)
    }
}

/// Inner formula capped at a remaining allowance (annual category limits)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capped<F> {
    pub inner: F,
    pub cap: Decimal,
}

impl<F: CoverageFormula> CoverageFormula for Capped<F> {
    fn covered_amount(&self, total: Decimal) -> Decimal {
        self.inner
            .covered_amount(total)
            .min(round_money(self.cap).max(Decimal::ZERO))
    }
}

/// Splits billed totals between insurer and patient
///
/// The patient share is always `total - covered`; it is never rounded on
/// its own, so the two shares add up to the total exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimCalculator;

impl ClaimCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn split(&self, total: Decimal, coverage_percentage: Decimal) -> InsuranceResult<CoverageSplit> {
        if coverage_percentage < Decimal::ZERO || coverage_percentage > Decimal::ONE_HUNDRED {
            return Err(InsuranceError::InvalidPercentage(coverage_percentage));
        }
        self.split_with(total, &Percentage(coverage_percentage))
    }

    /// Split using a plan-provided formula
    ///
    /// A formula that yields a covered amount outside `0..=total` is an
    /// error, not something to clamp.
    pub fn split_with(&self, total: Decimal, formula: &dyn CoverageFormula) -> InsuranceResult<CoverageSplit> {
        Self::validate_total(total)?;

        let covered = formula.covered_amount(total);
        if covered.is_sign_negative() || covered > total {
            return Err(InsuranceError::InvalidAmount(format!(
                "coverage formula returned {covered} for a total of {total}"
            )));
        }

        Ok(CoverageSplit {
            total,
            covered,
            patient: total - covered,
        })
    }

    fn validate_total(total: Decimal) -> InsuranceResult<()> {
        if total <= Decimal::ZERO {
            return Err(InsuranceError::InvalidAmount(format!("total {total} must be positive")));
        }
        if total.round_dp(MONEY_DP) != total {
            return Err(InsuranceError::InvalidAmount(format!(
                "total {total} has more than two decimal places"
            )));
        }
        Ok(())
    }
}
