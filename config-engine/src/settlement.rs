use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};

/// How an order without a selectable item (a generic service, an admission
/// fee) is judged under `include_selected` / `exclude_selected` plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemlessCoverage {
    /// The missing item is a member of no selected set: covered under
    /// `exclude_selected`, not covered under `include_selected`
    #[default]
    TreatAsUnlisted,
    /// Any category rule other than `none` covers the order
    FollowCategoryRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/rustcare".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

/// Settlement core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Prefix of generated claim numbers (`CLM-3FA94C1B`)
    pub claim_number_prefix: String,
    /// Attempts at a fresh claim number before giving up on collisions
    pub claim_number_attempts: u32,
    /// Wallet settlements may leave part of the patient share as debt
    pub wallet_debt_allowed: bool,
    /// Admission settlements may leave part of the patient share as debt
    pub admission_debt_allowed: bool,
    pub itemless_coverage: ItemlessCoverage,
    pub database: DatabaseSettings,
    pub logging: LoggerConfig,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            claim_number_prefix: "CLM".to_string(),
            claim_number_attempts: 5,
            wallet_debt_allowed: false,
            admission_debt_allowed: true,
            itemless_coverage: ItemlessCoverage::default(),
            database: DatabaseSettings::default(),
            logging: LoggerConfig::default(),
        }
    }
}
