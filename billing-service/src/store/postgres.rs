use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use config_engine::DatabaseSettings;
use database_layer::{DatabaseError, DatabasePool, TransactionManager};
use insurance_service::{
    CategoryCoverage, ClaimSummary, ClaimTarget, ClaimTx, ClaimType, CoverageMode, CoveragePlan, Encounter,
    EncounterLinks, InsuranceClaim, InsuranceError, InsuranceResult, PatientInsurance, ServiceCategory,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Connection, Postgres, Row, Transaction};
use tracing::info;
use uuid::Uuid;

use super::{SettlementStore, SettlementTx};
use crate::error::{BillingError, BillingResult};
use crate::models::{Admission, Order, OrderRef, OrderStatus, PaymentStamp, TransactionRecord, Wallet};

const SCHEMA: &str = include_str!("../../migrations/0001_settlement_core.sql");

const CLAIM_NUMBER_KEY: &str = "insurance_claims_claim_number_key";
const CLAIM_TARGET_KEY: &str = "insurance_claims_target_key";
const ORDER_KEY: &str = "orders_pkey";

const CLAIM_COLUMNS: &str = "id, claim_number, patient_id, patient_insurance_id, claim_type, order_id, \
     total_amount, approved_amount, covered_amount, patient_amount, status, service_date, processed_date, \
     processed_by, paid_date, rejection_reason, notes, summary_id, created_by, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "id, encounter_type, encounter_id, patient_insurance_id, claim_count, \
     total_amount, covered_amount, patient_amount, created_at, updated_at";

const ORDER_COLUMNS: &str = "order_type, id, patient_id, admission_id, consultation_id, surgery_id, billed_item, \
     total_amount, ordered_at, sequence, status, paid_at, paid_by, transaction_id, claim_id, covered_amount, \
     amount_paid, debt_added";

/// PostgreSQL-backed store
///
/// Balances, orders, claims and summaries are locked with `SELECT ... FOR
/// UPDATE` (or an upsert) before they are modified, which serializes
/// settlements that touch the same admission or wallet.
#[derive(Clone, Debug)]
pub struct PgSettlementStore {
    manager: TransactionManager,
}

impl PgSettlementStore {
    pub fn new(manager: TransactionManager) -> Self {
        Self { manager }
    }

    pub async fn connect(settings: &DatabaseSettings) -> BillingResult<Self> {
        let pool = DatabasePool::connect(settings).await?;
        Ok(Self::new(TransactionManager::new(pool)))
    }

    /// Apply the bundled schema; safe to run repeatedly
    pub async fn migrate(&self) -> BillingResult<()> {
        self.manager.execute_script(SCHEMA).await?;
        info!("Settlement schema applied");
        Ok(())
    }
}

#[async_trait]
impl SettlementStore for PgSettlementStore {
    type Tx = PgSettlementTx;

    async fn begin(&self) -> BillingResult<PgSettlementTx> {
        let tx = self.manager.begin().await?;
        Ok(PgSettlementTx { tx })
    }

    async fn commit(&self, tx: PgSettlementTx) -> BillingResult<()> {
        tx.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}

/// Open PostgreSQL transaction
pub struct PgSettlementTx {
    tx: Transaction<'static, Postgres>,
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))
}

fn target_from_row(row: &PgRow, type_column: &str, id_column: &str) -> Result<ClaimTarget, sqlx::Error> {
    let claim_type: ClaimType = parse_column(row, type_column)?;
    Ok(ClaimTarget::new(claim_type, row.try_get(id_column)?))
}

fn insurance_from_row(row: &PgRow) -> Result<PatientInsurance, sqlx::Error> {
    Ok(PatientInsurance {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        hmo_id: row.try_get("hmo_id")?,
        coverage_plan_id: row.try_get("coverage_plan_id")?,
        policy_number: row.try_get("policy_number")?,
        valid_from: row.try_get("valid_from")?,
        valid_to: row.try_get("valid_to")?,
        is_active: row.try_get("is_active")?,
        is_verified: row.try_get("is_verified")?,
    })
}

fn claim_from_row(row: &PgRow) -> Result<InsuranceClaim, sqlx::Error> {
    Ok(InsuranceClaim {
        id: row.try_get("id")?,
        claim_number: row.try_get("claim_number")?,
        patient_id: row.try_get("patient_id")?,
        patient_insurance_id: row.try_get("patient_insurance_id")?,
        target: target_from_row(row, "claim_type", "order_id")?,
        total_amount: row.try_get("total_amount")?,
        approved_amount: row.try_get("approved_amount")?,
        covered_amount: row.try_get("covered_amount")?,
        patient_amount: row.try_get("patient_amount")?,
        status: parse_column(row, "status")?,
        service_date: row.try_get("service_date")?,
        processed_date: row.try_get("processed_date")?,
        processed_by: row.try_get("processed_by")?,
        paid_date: row.try_get("paid_date")?,
        rejection_reason: row.try_get("rejection_reason")?,
        notes: row.try_get("notes")?,
        summary_id: row.try_get("summary_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn summary_from_row(row: &PgRow) -> Result<ClaimSummary, sqlx::Error> {
    let kind: String = row.try_get("encounter_type")?;
    let encounter = Encounter::from_parts(&kind, row.try_get("encounter_id")?)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown encounter type: {kind}").into()))?;
    let claim_count: i32 = row.try_get("claim_count")?;

    Ok(ClaimSummary {
        id: row.try_get("id")?,
        encounter,
        patient_insurance_id: row.try_get("patient_insurance_id")?,
        claim_count: u32::try_from(claim_count).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        total_amount: row.try_get("total_amount")?,
        covered_amount: row.try_get("covered_amount")?,
        patient_amount: row.try_get("patient_amount")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
    let transaction_id: Option<Uuid> = row.try_get("transaction_id")?;
    let payment = match transaction_id {
        Some(transaction_id) => Some(PaymentStamp {
            paid_at: row.try_get("paid_at")?,
            paid_by: row.try_get("paid_by")?,
            transaction_id,
            claim_id: row.try_get("claim_id")?,
            covered_amount: row.try_get("covered_amount")?,
            amount_paid: row.try_get("amount_paid")?,
            debt_added: row.try_get("debt_added")?,
        }),
        None => None,
    };

    Ok(Order {
        order: OrderRef {
            target: target_from_row(row, "order_type", "id")?,
            patient_id: row.try_get("patient_id")?,
            links: EncounterLinks {
                admission_id: row.try_get("admission_id")?,
                consultation_id: row.try_get("consultation_id")?,
                surgery_id: row.try_get("surgery_id")?,
            },
            billed_item: row.try_get("billed_item")?,
            total_amount: row.try_get("total_amount")?,
            ordered_at: row.try_get("ordered_at")?,
        },
        sequence: row.try_get("sequence")?,
        status: parse_column::<OrderStatus>(row, "status")?,
        payment,
    })
}

fn admission_from_row(row: &PgRow) -> Result<Admission, sqlx::Error> {
    Ok(Admission {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        deposit_balance: row.try_get("deposit_balance")?,
        total_charges: row.try_get("total_charges")?,
        outstanding_debt: row.try_get("outstanding_debt")?,
    })
}

fn wallet_from_row(row: &PgRow) -> Result<Wallet, sqlx::Error> {
    Ok(Wallet {
        patient_id: row.try_get("patient_id")?,
        balance: row.try_get("balance")?,
        outstanding_debt: row.try_get("outstanding_debt")?,
    })
}

fn to_db_count(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[async_trait]
impl ClaimTx for PgSettlementTx {
    async fn active_insurance(&mut self, patient_id: Uuid, on: NaiveDate) -> InsuranceResult<Option<PatientInsurance>> {
        let row = sqlx::query(
            "SELECT id, patient_id, hmo_id, coverage_plan_id, policy_number, valid_from, valid_to, \
             is_active, is_verified \
             FROM patient_insurances \
             WHERE patient_id = $1 AND is_active AND is_verified AND valid_from <= $2 AND valid_to >= $2 \
             ORDER BY valid_from DESC LIMIT 1",
        )
        .bind(patient_id)
        .bind(on)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row
            .map(|r| insurance_from_row(&r))
            .transpose()
            .map_err(DatabaseError::from)?)
    }

    async fn coverage_plan(&mut self, plan_id: Uuid) -> InsuranceResult<Option<CoveragePlan>> {
        let Some(row) = sqlx::query("SELECT id, hmo_id, name, is_active FROM coverage_plans WHERE id = $1")
            .bind(plan_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?
        else {
            return Ok(None);
        };

        let mut plan = CoveragePlan::new(
            row.try_get("hmo_id").map_err(DatabaseError::from)?,
            row.try_get::<String, _>("name").map_err(DatabaseError::from)?,
        );
        plan.id = plan_id;
        plan.is_active = row.try_get("is_active").map_err(DatabaseError::from)?;

        let item_rows = sqlx::query("SELECT category, item_id FROM coverage_plan_items WHERE plan_id = $1")
            .bind(plan_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        let mut items: HashMap<ServiceCategory, Vec<Uuid>> = HashMap::new();
        for row in &item_rows {
            let category: ServiceCategory = parse_column(row, "category").map_err(DatabaseError::from)?;
            let item: Uuid = row.try_get("item_id").map_err(DatabaseError::from)?;
            items.entry(category).or_default().push(item);
        }

        let rule_rows = sqlx::query(
            "SELECT category, mode, percentage, annual_limit FROM coverage_plan_rules WHERE plan_id = $1",
        )
        .bind(plan_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        for row in &rule_rows {
            let category: ServiceCategory = parse_column(row, "category").map_err(DatabaseError::from)?;
            let mode: CoverageMode = parse_column(row, "mode").map_err(DatabaseError::from)?;
            let percentage: Decimal = row.try_get("percentage").map_err(DatabaseError::from)?;
            let annual_limit: Option<Decimal> = row.try_get("annual_limit").map_err(DatabaseError::from)?;

            let mut rule = CategoryCoverage::new(mode, percentage).with_items(items.remove(&category).unwrap_or_default());
            if let Some(limit) = annual_limit {
                rule = rule.with_annual_limit(limit);
            }
            plan = plan.with_rule(category, rule);
        }

        Ok(Some(plan))
    }

    async fn covered_in_period(
        &mut self,
        patient_insurance_id: Uuid,
        category: ServiceCategory,
        from: NaiveDate,
        to: NaiveDate,
    ) -> InsuranceResult<Decimal> {
        let claim_types: Vec<String> = ClaimType::for_category(category)
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();

        let covered: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(covered_amount), 0) FROM insurance_claims \
             WHERE patient_insurance_id = $1 AND claim_type = ANY($2) AND status <> 'rejected' \
             AND service_date BETWEEN $3 AND $4",
        )
        .bind(patient_insurance_id)
        .bind(claim_types)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        Ok(covered)
    }

    async fn claim_for_target(&mut self, target: &ClaimTarget) -> InsuranceResult<Option<InsuranceClaim>> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM insurance_claims WHERE claim_type = $1 AND order_id = $2");
        let row = sqlx::query(&sql)
            .bind(target.claim_type().as_str())
            .bind(target.order_id())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(row.map(|r| claim_from_row(&r)).transpose().map_err(DatabaseError::from)?)
    }

    async fn insert_claim(&mut self, claim: &InsuranceClaim) -> InsuranceResult<()> {
        // A failed statement aborts the whole transaction unless it ran
        // inside a savepoint.
        let mut savepoint = Connection::begin(&mut *self.tx).await.map_err(DatabaseError::from)?;

        let sql = format!(
            "INSERT INTO insurance_claims ({CLAIM_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)"
        );
        let result = sqlx::query(&sql)
            .bind(claim.id)
            .bind(&claim.claim_number)
            .bind(claim.patient_id)
            .bind(claim.patient_insurance_id)
            .bind(claim.target.claim_type().as_str())
            .bind(claim.target.order_id())
            .bind(claim.total_amount)
            .bind(claim.approved_amount)
            .bind(claim.covered_amount)
            .bind(claim.patient_amount)
            .bind(claim.status.as_str())
            .bind(claim.service_date)
            .bind(claim.processed_date)
            .bind(claim.processed_by)
            .bind(claim.paid_date)
            .bind(&claim.rejection_reason)
            .bind(&claim.notes)
            .bind(claim.summary_id)
            .bind(claim.created_by)
            .bind(claim.created_at)
            .bind(claim.updated_at)
            .execute(&mut *savepoint)
            .await;

        match result {
            Ok(_) => {
                savepoint.commit().await.map_err(DatabaseError::from)?;
                Ok(())
            }
            Err(e) => {
                savepoint.rollback().await.map_err(DatabaseError::from)?;
                let err = DatabaseError::from(e);
                match err.unique_violation().as_deref() {
                    Some(CLAIM_NUMBER_KEY) => Err(InsuranceError::DuplicateClaimNumber(claim.claim_number.clone())),
                    Some(CLAIM_TARGET_KEY) => {
                        let claim_number = self
                            .claim_for_target(&claim.target)
                            .await?
                            .map_or_else(|| claim.claim_number.clone(), |c| c.claim_number);
                        Err(InsuranceError::DuplicateClaim { claim_number })
                    }
                    _ => Err(err.into()),
                }
            }
        }
    }

    async fn lock_claim(&mut self, claim_id: Uuid) -> InsuranceResult<Option<InsuranceClaim>> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM insurance_claims WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(claim_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(row.map(|r| claim_from_row(&r)).transpose().map_err(DatabaseError::from)?)
    }

    async fn update_claim(&mut self, claim: &InsuranceClaim) -> InsuranceResult<()> {
        let result = sqlx::query(
            "UPDATE insurance_claims SET approved_amount = $2, covered_amount = $3, patient_amount = $4, \
             status = $5, processed_date = $6, processed_by = $7, paid_date = $8, rejection_reason = $9, \
             notes = $10, summary_id = $11, updated_at = $12 \
             WHERE id = $1",
        )
        .bind(claim.id)
        .bind(claim.approved_amount)
        .bind(claim.covered_amount)
        .bind(claim.patient_amount)
        .bind(claim.status.as_str())
        .bind(claim.processed_date)
        .bind(claim.processed_by)
        .bind(claim.paid_date)
        .bind(&claim.rejection_reason)
        .bind(&claim.notes)
        .bind(claim.summary_id)
        .bind(claim.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(InsuranceError::ClaimNotFound(claim.id));
        }
        Ok(())
    }

    async fn delete_claim(&mut self, claim_id: Uuid) -> InsuranceResult<()> {
        sqlx::query("DELETE FROM insurance_claims WHERE id = $1")
            .bind(claim_id)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn encounter_links(&mut self, target: &ClaimTarget) -> InsuranceResult<Option<EncounterLinks>> {
        let row = sqlx::query(
            "SELECT admission_id, consultation_id, surgery_id FROM orders WHERE order_type = $1 AND id = $2",
        )
        .bind(target.claim_type().as_str())
        .bind(target.order_id())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let links = EncounterLinks {
            admission_id: row.try_get("admission_id").map_err(DatabaseError::from)?,
            consultation_id: row.try_get("consultation_id").map_err(DatabaseError::from)?,
            surgery_id: row.try_get("surgery_id").map_err(DatabaseError::from)?,
        };
        Ok(Some(links))
    }

    async fn find_or_create_summary(
        &mut self,
        encounter: &Encounter,
        patient_insurance_id: Uuid,
    ) -> InsuranceResult<ClaimSummary> {
        let fresh = ClaimSummary::new(*encounter, patient_insurance_id);
        let sql = format!(
            "INSERT INTO claim_summaries (id, encounter_type, encounter_id, patient_insurance_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             ON CONFLICT ON CONSTRAINT claim_summaries_encounter_policy_key \
             DO UPDATE SET updated_at = claim_summaries.updated_at \
             RETURNING {SUMMARY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(fresh.id)
            .bind(encounter.kind())
            .bind(encounter.id())
            .bind(patient_insurance_id)
            .bind(fresh.created_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(summary_from_row(&row).map_err(DatabaseError::from)?)
    }

    async fn lock_summary(&mut self, summary_id: Uuid) -> InsuranceResult<Option<ClaimSummary>> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM claim_summaries WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(summary_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(row.map(|r| summary_from_row(&r)).transpose().map_err(DatabaseError::from)?)
    }

    async fn summary_claims(&mut self, summary_id: Uuid) -> InsuranceResult<Vec<InsuranceClaim>> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM insurance_claims WHERE summary_id = $1 ORDER BY created_at");
        let rows = sqlx::query(&sql)
            .bind(summary_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(rows
            .iter()
            .map(claim_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)?)
    }

    async fn update_summary(&mut self, summary: &ClaimSummary) -> InsuranceResult<()> {
        sqlx::query(
            "UPDATE claim_summaries SET claim_count = $2, total_amount = $3, covered_amount = $4, \
             patient_amount = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(summary.id)
        .bind(to_db_count(summary.claim_count))
        .bind(summary.total_amount)
        .bind(summary.covered_amount)
        .bind(summary.patient_amount)
        .bind(summary.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn delete_summary(&mut self, summary_id: Uuid) -> InsuranceResult<()> {
        sqlx::query("DELETE FROM claim_summaries WHERE id = $1")
            .bind(summary_id)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

#[async_trait]
impl SettlementTx for PgSettlementTx {
    async fn insert_order(&mut self, order: &OrderRef) -> BillingResult<Order> {
        let sequence = sqlx::query_scalar::<_, i64>(
            "INSERT INTO orders (order_type, id, patient_id, admission_id, consultation_id, surgery_id, \
             billed_item, total_amount, ordered_at, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending') \
             RETURNING sequence",
        )
        .bind(order.target.claim_type().as_str())
        .bind(order.id())
        .bind(order.patient_id)
        .bind(order.links.admission_id)
        .bind(order.links.consultation_id)
        .bind(order.links.surgery_id)
        .bind(order.billed_item)
        .bind(order.total_amount)
        .bind(order.ordered_at)
        .fetch_one(&mut *self.tx)
        .await;

        match sequence {
            Ok(sequence) => Ok(Order::pending(order.clone(), sequence)),
            Err(e) => {
                let err = DatabaseError::from(e);
                if err.unique_violation().as_deref() == Some(ORDER_KEY) {
                    Err(BillingError::DuplicateOrder(order.id()))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    async fn find_order(&mut self, target: &ClaimTarget) -> BillingResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_type = $1 AND id = $2");
        let row = sqlx::query(&sql)
            .bind(target.claim_type().as_str())
            .bind(target.order_id())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(row.map(|r| order_from_row(&r)).transpose().map_err(DatabaseError::from)?)
    }

    async fn lock_order(&mut self, target: &ClaimTarget) -> BillingResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_type = $1 AND id = $2 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(target.claim_type().as_str())
            .bind(target.order_id())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(row.map(|r| order_from_row(&r)).transpose().map_err(DatabaseError::from)?)
    }

    async fn update_order(&mut self, order: &Order) -> BillingResult<()> {
        let payment = order.payment.as_ref();
        sqlx::query(
            "UPDATE orders SET status = $3, paid_at = $4, paid_by = $5, transaction_id = $6, claim_id = $7, \
             covered_amount = $8, amount_paid = $9, debt_added = $10 \
             WHERE order_type = $1 AND id = $2",
        )
        .bind(order.order.target.claim_type().as_str())
        .bind(order.id())
        .bind(order.status.as_str())
        .bind(payment.map(|p| p.paid_at))
        .bind(payment.map(|p| p.paid_by))
        .bind(payment.map(|p| p.transaction_id))
        .bind(payment.and_then(|p| p.claim_id))
        .bind(payment.map(|p| p.covered_amount))
        .bind(payment.map(|p| p.amount_paid))
        .bind(payment.map(|p| p.debt_added))
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn pending_admission_orders(&mut self, admission_id: Uuid) -> BillingResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE admission_id = $1 AND status = 'pending' \
             ORDER BY ordered_at, sequence FOR UPDATE"
        );
        let rows = sqlx::query(&sql)
            .bind(admission_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)?)
    }

    async fn lock_admission(&mut self, admission_id: Uuid) -> BillingResult<Option<Admission>> {
        let row = sqlx::query(
            "SELECT id, patient_id, deposit_balance, total_charges, outstanding_debt \
             FROM admissions WHERE id = $1 FOR UPDATE",
        )
        .bind(admission_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.map(|r| admission_from_row(&r)).transpose().map_err(DatabaseError::from)?)
    }

    async fn update_admission(&mut self, admission: &Admission) -> BillingResult<()> {
        sqlx::query(
            "UPDATE admissions SET deposit_balance = $2, total_charges = $3, outstanding_debt = $4 WHERE id = $1",
        )
        .bind(admission.id)
        .bind(admission.deposit_balance)
        .bind(admission.total_charges)
        .bind(admission.outstanding_debt)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn lock_wallet(&mut self, patient_id: Uuid) -> BillingResult<Wallet> {
        let row = sqlx::query(
            "INSERT INTO wallets (patient_id) VALUES ($1) \
             ON CONFLICT (patient_id) DO UPDATE SET balance = wallets.balance \
             RETURNING patient_id, balance, outstanding_debt",
        )
        .bind(patient_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        Ok(wallet_from_row(&row).map_err(DatabaseError::from)?)
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> BillingResult<()> {
        sqlx::query("UPDATE wallets SET balance = $2, outstanding_debt = $3 WHERE patient_id = $1")
            .bind(wallet.patient_id)
            .bind(wallet.balance)
            .bind(wallet.outstanding_debt)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn insert_transaction(&mut self, record: &TransactionRecord) -> BillingResult<()> {
        sqlx::query(
            "INSERT INTO transactions (id, patient_id, admission_id, order_type, order_id, kind, direction, \
             amount, drawn_amount, debt_amount, covered_amount, claim_id, actor, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(record.id)
        .bind(record.patient_id)
        .bind(record.admission_id)
        .bind(record.order.map(|t| t.claim_type().as_str()))
        .bind(record.order.map(|t| t.order_id()))
        .bind(record.kind.as_str())
        .bind(record.direction.as_str())
        .bind(record.amount)
        .bind(record.drawn_amount)
        .bind(record.debt_amount)
        .bind(record.covered_amount)
        .bind(record.claim_id)
        .bind(record.actor)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }
}
