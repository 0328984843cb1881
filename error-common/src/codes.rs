// Error codes implementation
// This module contains standardized error codes for the settlement core

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const INVALID_CONFIGURATION: &str = "VALIDATION_1002";
}

pub mod database {
    pub const CONNECTION_FAILED: &str = "DB_4001";
    pub const QUERY_FAILED: &str = "DB_4002";
    pub const CONSTRAINT_VIOLATION: &str = "DB_4003";
}

pub mod billing {
    pub const INVALID_ORDER_AMOUNT: &str = "BILLING_5001";
    pub const INSUFFICIENT_FUNDS: &str = "BILLING_5002";
    pub const ORDER_NOT_FOUND: &str = "BILLING_5003";
    pub const ORDER_ALREADY_SETTLED: &str = "BILLING_5004";
    pub const ADMISSION_NOT_FOUND: &str = "BILLING_5005";
    pub const INVALID_DEPOSIT_AMOUNT: &str = "BILLING_5006";
    pub const DUPLICATE_ORDER: &str = "BILLING_5007";
    pub const PAYER_MISMATCH: &str = "BILLING_5008";
}

pub mod insurance {
    pub const INVALID_AMOUNT: &str = "INSURANCE_6001";
    pub const INVALID_PERCENTAGE: &str = "INSURANCE_6002";
    pub const INVALID_STATE: &str = "INSURANCE_6003";
    pub const DUPLICATE_CLAIM_NUMBER: &str = "INSURANCE_6004";
    pub const CLAIM_NUMBER_EXHAUSTED: &str = "INSURANCE_6005";
    pub const CLAIM_NOT_FOUND: &str = "INSURANCE_6006";
    pub const DUPLICATE_CLAIM: &str = "INSURANCE_6007";
    pub const COVERAGE_PLAN_NOT_FOUND: &str = "INSURANCE_6008";
}
