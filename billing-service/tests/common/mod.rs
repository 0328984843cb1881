#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use billing_service::{AdjudicationService, Admission, MemorySettlementStore, SettlementEngine, Wallet};
use chrono::NaiveDate;
use config_engine::SettlementConfig;
use insurance_service::{
    CategoryCoverage, ClaimLedger, ClaimNumberGenerator, CoveragePlan, PatientInsurance, ServiceCategory,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct Fixture {
    pub store: MemorySettlementStore,
    pub engine: SettlementEngine<MemorySettlementStore>,
    pub adjudication: AdjudicationService<MemorySettlementStore>,
    pub config: SettlementConfig,
    pub patient: Uuid,
    pub actor: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(SettlementConfig::default())
    }

    pub fn with_config(config: SettlementConfig) -> Self {
        let store = MemorySettlementStore::new();
        Self {
            engine: SettlementEngine::new(store.clone(), &config),
            adjudication: AdjudicationService::new(store.clone(), &config),
            store,
            config,
            patient: Uuid::new_v4(),
            actor: Uuid::new_v4(),
        }
    }

    /// Enrol the fixture patient on `plan` with a valid, verified policy
    pub async fn insure(&self, plan: CoveragePlan) -> PatientInsurance {
        let insurance = policy(self.patient, &plan);
        self.store.add_coverage_plan(plan).await;
        self.store.add_patient_insurance(insurance.clone()).await;
        insurance
    }

    pub async fn admit(&self, deposit: Decimal) -> Admission {
        let admission = Admission::new(self.patient).with_deposit(deposit);
        self.store.add_admission(admission.clone()).await;
        admission
    }

    pub async fn fund_wallet(&self, balance: Decimal) {
        self.store.add_wallet(Wallet::new(self.patient, balance)).await;
    }
}

pub fn policy(patient_id: Uuid, plan: &CoveragePlan) -> PatientInsurance {
    PatientInsurance {
        id: Uuid::new_v4(),
        patient_id,
        hmo_id: plan.hmo_id,
        coverage_plan_id: plan.id,
        policy_number: format!("HMO-{}", &Uuid::new_v4().simple().to_string()[..10]),
        valid_from: date(2020, 1, 1),
        valid_to: date(2099, 12, 31),
        is_active: true,
        is_verified: true,
    }
}

pub fn plan_with(category: ServiceCategory, rule: CategoryCoverage) -> CoveragePlan {
    CoveragePlan::new(Uuid::new_v4(), "Standard").with_rule(category, rule)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Hands out a fixed list of claim numbers, repeating the last one
pub struct ScriptedNumbers {
    numbers: Mutex<VecDeque<String>>,
}

impl ScriptedNumbers {
    pub fn new(numbers: &[&str]) -> Self {
        Self {
            numbers: Mutex::new(numbers.iter().map(|n| n.to_string()).collect()),
        }
    }
}

impl ClaimNumberGenerator for ScriptedNumbers {
    fn next_claim_number(&self) -> String {
        let mut numbers = self.numbers.lock().unwrap();
        if numbers.len() > 1 {
            numbers.pop_front().unwrap()
        } else {
            numbers.front().cloned().unwrap()
        }
    }
}

pub fn scripted_engine(
    store: &MemorySettlementStore,
    config: &SettlementConfig,
    numbers: &[&str],
) -> SettlementEngine<MemorySettlementStore, ScriptedNumbers> {
    let ledger = ClaimLedger::with_generator(config, ScriptedNumbers::new(numbers));
    SettlementEngine::with_ledger(store.clone(), ledger, config)
}
