use database_layer::DatabaseError;
use error_common::{codes, RustCareError};
use insurance_service::InsuranceError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::PayerContext;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Order total must be positive, got {0}")]
    InvalidOrderAmount(Decimal),

    #[error("Insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Order {0} is already settled")]
    OrderAlreadySettled(Uuid),

    #[error("Admission not found: {0}")]
    AdmissionNotFound(Uuid),

    #[error("Deposit amount must be positive, got {0}")]
    InvalidDepositAmount(Decimal),

    #[error("Order {0} is already recorded")]
    DuplicateOrder(Uuid),

    #[error("Order {order_id} cannot be paid from {payer:?}")]
    PayerMismatch { order_id: Uuid, payer: PayerContext },

    #[error(transparent)]
    Insurance(#[from] InsuranceError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl BillingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidOrderAmount(_) => codes::billing::INVALID_ORDER_AMOUNT,
            Self::InsufficientFunds { .. } => codes::billing::INSUFFICIENT_FUNDS,
            Self::OrderNotFound(_) => codes::billing::ORDER_NOT_FOUND,
            Self::OrderAlreadySettled(_) => codes::billing::ORDER_ALREADY_SETTLED,
            Self::AdmissionNotFound(_) => codes::billing::ADMISSION_NOT_FOUND,
            Self::InvalidDepositAmount(_) => codes::billing::INVALID_DEPOSIT_AMOUNT,
            Self::DuplicateOrder(_) => codes::billing::DUPLICATE_ORDER,
            Self::PayerMismatch { .. } => codes::billing::PAYER_MISMATCH,
            Self::Insurance(e) => e.code(),
            Self::Database(e) => e.code(),
        }
    }
}

impl From<BillingError> for RustCareError {
    fn from(err: BillingError) -> Self {
        let code = err.code();
        match err {
            BillingError::InvalidOrderAmount(_)
            | BillingError::InvalidDepositAmount(_)
            | BillingError::PayerMismatch { .. } => {
                RustCareError::validation(code, err.to_string())
            }
            BillingError::OrderNotFound(_) | BillingError::AdmissionNotFound(_) => {
                RustCareError::not_found(code, err.to_string())
            }
            BillingError::Insurance(e) => e.into(),
            BillingError::Database(e) => e.into(),
            _ => RustCareError::business(code, err.to_string()),
        }
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
