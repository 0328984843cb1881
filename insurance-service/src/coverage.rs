use config_engine::ItemlessCoverage;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{CoverageMode, CoveragePlan, ServiceCategory};

/// Decides whether a plan covers a billed item and at what percentage
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageResolver {
    itemless: ItemlessCoverage,
}

impl CoverageResolver {
    pub fn new(itemless: ItemlessCoverage) -> Self {
        Self { itemless }
    }

    /// Whether `item` is covered under the plan's rule for `category`
    ///
    /// `item` is `None` for orders without a selectable item (general
    /// services, admission fees); those follow the configured
    /// [`ItemlessCoverage`] policy, identically for every order of the
    /// category.
    pub fn is_covered(&self, plan: &CoveragePlan, category: ServiceCategory, item: Option<Uuid>) -> bool {
        if !plan.is_active {
            return false;
        }
        let rule = plan.rule(category);
        match (rule.mode, item) {
            (CoverageMode::All, _) => true,
            (CoverageMode::None, _) => false,
            (CoverageMode::IncludeSelected, Some(item)) => rule.selected_items.contains(&item),
            (CoverageMode::ExcludeSelected, Some(item)) => !rule.selected_items.contains(&item),
            (CoverageMode::IncludeSelected, None) => self.itemless == ItemlessCoverage::FollowCategoryRule,
            (CoverageMode::ExcludeSelected, None) => true,
        }
    }

    /// Coverage percentage in 0-100; zero for `none`
    pub fn coverage_percentage(&self, plan: &CoveragePlan, category: ServiceCategory) -> Decimal {
        plan.rule(category).percentage()
    }
}
