use crate::models::ClaimStatus;
use database_layer::DatabaseError;
use error_common::{codes, RustCareError};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum InsuranceError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Coverage percentage {0} is outside 0-100")]
    InvalidPercentage(Decimal),

    #[error("Claim {claim_number} is {status} and cannot be {action}")]
    InvalidState {
        claim_number: String,
        status: ClaimStatus,
        action: &'static str,
    },

    #[error("Claim number {0} is already taken")]
    DuplicateClaimNumber(String),

    #[error("No free claim number after {0} attempts")]
    ClaimNumberExhausted(u32),

    #[error("Claim not found: {0}")]
    ClaimNotFound(Uuid),

    #[error("Order already has claim {claim_number}")]
    DuplicateClaim { claim_number: String },

    #[error("Coverage plan not found: {0}")]
    CoveragePlanNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl InsuranceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => codes::insurance::INVALID_AMOUNT,
            Self::InvalidPercentage(_) => codes::insurance::INVALID_PERCENTAGE,
            Self::InvalidState { .. } => codes::insurance::INVALID_STATE,
            Self::DuplicateClaimNumber(_) => codes::insurance::DUPLICATE_CLAIM_NUMBER,
            Self::ClaimNumberExhausted(_) => codes::insurance::CLAIM_NUMBER_EXHAUSTED,
            Self::ClaimNotFound(_) => codes::insurance::CLAIM_NOT_FOUND,
            Self::DuplicateClaim { .. } => codes::insurance::DUPLICATE_CLAIM,
            Self::CoveragePlanNotFound(_) => codes::insurance::COVERAGE_PLAN_NOT_FOUND,
            Self::Database(e) => e.code(),
        }
    }
}

impl From<InsuranceError> for RustCareError {
    fn from(err: InsuranceError) -> Self {
        let code = err.code();
        match err {
            InsuranceError::InvalidAmount(_) | InsuranceError::InvalidPercentage(_) => {
                RustCareError::validation(code, err.to_string())
            }
            InsuranceError::ClaimNotFound(_) | InsuranceError::CoveragePlanNotFound(_) => {
                RustCareError::not_found(code, err.to_string())
            }
            InsuranceError::Database(db) => db.into(),
            _ => RustCareError::business(code, err.to_string()),
        }
    }
}

pub type InsuranceResult<T> = Result<T, InsuranceError>;
