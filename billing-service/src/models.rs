use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use insurance_service::{ClaimTarget, ClaimType, EncounterLinks};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of a billable order handed over by the module that owns it
/// (pharmacy, laboratory, radiology, services, theatre, wards)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    pub target: ClaimTarget,
    pub patient_id: Uuid,
    pub links: EncounterLinks,
    /// Drug, test template, scan template or surgery type being billed
    pub billed_item: Option<Uuid>,
    pub total_amount: Decimal,
    pub ordered_at: DateTime<Utc>,
}

impl OrderRef {
    pub fn new(claim_type: ClaimType, patient_id: Uuid, total_amount: Decimal) -> Self {
        Self {
            target: ClaimTarget::new(claim_type, Uuid::new_v4()),
            patient_id,
            links: EncounterLinks::default(),
            billed_item: None,
            total_amount,
            ordered_at: Utc::now(),
        }
    }

    pub fn with_item(mut self, item: Uuid) -> Self {
        self.billed_item = Some(item);
        self
    }

    pub fn in_admission(mut self, admission_id: Uuid) -> Self {
        self.links.admission_id = Some(admission_id);
        self
    }

    pub fn in_consultation(mut self, consultation_id: Uuid) -> Self {
        self.links.consultation_id = Some(consultation_id);
        self
    }

    pub fn in_surgery(mut self, surgery_id: Uuid) -> Self {
        self.links.surgery_id = Some(surgery_id);
        self
    }

    pub fn ordered_at(mut self, at: DateTime<Utc>) -> Self {
        self.ordered_at = at;
        self
    }

    pub fn id(&self) -> Uuid {
        self.target.order_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Payment metadata stamped on an order when it settles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStamp {
    pub paid_at: DateTime<Utc>,
    pub paid_by: Uuid,
    pub transaction_id: Uuid,
    pub claim_id: Option<Uuid>,
    pub covered_amount: Decimal,
    pub amount_paid: Decimal,
    pub debt_added: Decimal,
}

/// Stored order
///
/// `sequence` is assigned on registration and breaks ties between orders
/// with the same `ordered_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    pub order: OrderRef,
    pub sequence: i64,
    pub status: OrderStatus,
    pub payment: Option<PaymentStamp>,
}

impl Order {
    pub fn pending(order: OrderRef, sequence: i64) -> Self {
        Self {
            order,
            sequence,
            status: OrderStatus::Pending,
            payment: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.order.id()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// FIFO key used by deposit drawdown
    pub fn arrival_key(&self) -> (DateTime<Utc>, i64) {
        (self.order.ordered_at, self.sequence)
    }
}

/// Source of funds for the patient share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "payer", content = "id", rename_all = "snake_case")]
pub enum PayerContext {
    /// Draw from the admission deposit
    Admission(Uuid),
    /// Draw from the patient's wallet
    Wallet(Uuid),
}

impl PayerContext {
    /// Admission-scoped orders pay from the deposit, everything else from
    /// the wallet
    pub fn for_order(order: &OrderRef) -> Self {
        match order.links.admission_id {
            Some(admission_id) => Self::Admission(admission_id),
            None => Self::Wallet(order.patient_id),
        }
    }
}

/// Inpatient admission balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub deposit_balance: Decimal,
    pub total_charges: Decimal,
    pub outstanding_debt: Decimal,
}

impl Admission {
    pub fn new(patient_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            deposit_balance: Decimal::ZERO,
            total_charges: Decimal::ZERO,
            outstanding_debt: Decimal::ZERO,
        }
    }

    pub fn with_deposit(mut self, deposit: Decimal) -> Self {
        self.deposit_balance = deposit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub patient_id: Uuid,
    pub balance: Decimal,
    pub outstanding_debt: Decimal,
}

impl Wallet {
    pub fn new(patient_id: Uuid, balance: Decimal) -> Self {
        Self {
            patient_id,
            balance,
            outstanding_debt: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDirection {
    Debit,
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Settlement,
    Deposit,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($ty))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(TransactionDirection { Debit => "debit", Credit => "credit" });
str_enum!(TransactionKind { Settlement => "settlement", Deposit => "deposit" });

/// Immutable financial record of one settlement or deposit
///
/// For settlements `amount == drawn_amount + debt_amount` is the patient
/// share; `covered_amount` is what insurance was claimed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub admission_id: Option<Uuid>,
    pub order: Option<ClaimTarget>,
    pub kind: TransactionKind,
    pub direction: TransactionDirection,
    pub amount: Decimal,
    pub drawn_amount: Decimal,
    pub debt_amount: Decimal,
    pub covered_amount: Decimal,
    pub claim_id: Option<Uuid>,
    pub actor: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Claim raised during a settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRef {
    pub id: Uuid,
    pub claim_number: String,
}

/// Outcome of settling one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub order: ClaimTarget,
    pub total_amount: Decimal,
    pub covered_amount: Decimal,
    pub patient_amount: Decimal,
    /// Drawn from the deposit or wallet
    pub patient_paid: Decimal,
    pub debt_added: Decimal,
    pub claim: Option<ClaimRef>,
    pub transaction_id: Uuid,
}

impl SettlementResult {
    pub fn claim_created(&self) -> bool {
        self.claim.is_some()
    }
}

/// Outcome of applying a deposit to an admission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawdownResult {
    pub orders_cleared: usize,
    /// Sum of the totals of the cleared orders
    pub amount_used: Decimal,
    pub deposit_balance: Decimal,
    pub settlements: Vec<SettlementResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payer_follows_admission_link() {
        let patient = Uuid::new_v4();
        let admission = Uuid::new_v4();

        let outpatient = OrderRef::new(ClaimType::Drug, patient, dec!(10.00));
        assert_eq!(PayerContext::for_order(&outpatient), PayerContext::Wallet(patient));

        let inpatient = outpatient.in_admission(admission);
        assert_eq!(PayerContext::for_order(&inpatient), PayerContext::Admission(admission));
    }

    #[test]
    fn test_order_serializes_target_as_tagged_reference() {
        let order = Order::pending(OrderRef::new(ClaimType::Scan, Uuid::new_v4(), dec!(45.50)), 1);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["target"]["claim_type"], "scan");
        assert_eq!(json["target"]["order_id"], order.id().to_string());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["total_amount"], "45.50");
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!(TransactionKind::Deposit.as_str(), "deposit");
        assert_eq!("credit".parse::<TransactionDirection>(), Ok(TransactionDirection::Credit));
        assert!("refund".parse::<TransactionKind>().is_err());
        assert_eq!("paid".parse::<OrderStatus>(), Ok(OrderStatus::Paid));
    }
}
