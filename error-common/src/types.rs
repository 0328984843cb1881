use serde::Serialize;
use thiserror::Error;

/// Broad class of a failure, used by outer layers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Database,
    Internal,
}

/// Error envelope handed to callers outside the service crates
#[derive(Error, Debug)]
pub enum RustCareError {
    /// Input rejected before any state changed
    #[error("Validation error [{code}]: {message}")]
    ValidationError { code: &'static str, message: String },

    /// Business rule violation against current state
    #[error("Business logic error [{code}]: {message}")]
    BusinessError { code: &'static str, message: String },

    /// Referenced record does not exist
    #[error("Not found [{code}]: {message}")]
    NotFound { code: &'static str, message: String },

    /// Database operation errors
    #[error("Database error [{code}]: {message}")]
    DatabaseError { code: &'static str, message: String },

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RustCareError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError { code, message: message.into() }
    }

    pub fn business(code: &'static str, message: impl Into<String>) -> Self {
        Self::BusinessError { code, message: message.into() }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound { code, message: message.into() }
    }

    pub fn database(code: &'static str, message: impl Into<String>) -> Self {
        Self::DatabaseError { code, message: message.into() }
    }

    /// Stable error code, `INTERNAL` for wrapped foreign errors
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError { code, .. }
            | Self::BusinessError { code, .. }
            | Self::NotFound { code, .. }
            | Self::DatabaseError { code, .. } => code,
            Self::Other(_) => "INTERNAL",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError { .. } => ErrorKind::Validation,
            Self::BusinessError { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DatabaseError { .. } => ErrorKind::Database,
            Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Emit the error as a structured tracing event
    pub fn log(&self, context: &str) {
        tracing::error!(
            context = context,
            error_code = self.code(),
            error_kind = ?self.kind(),
            error = %self,
            "RustCare error occurred"
        );
    }
}

/// Result type alias for RustCare operations
pub type Result<T> = std::result::Result<T, RustCareError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn test_code_and_kind() {
        let err = RustCareError::business(codes::insurance::INVALID_STATE, "claim already paid");
        assert_eq!(err.code(), "INSURANCE_6003");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("claim already paid"));
    }

    #[test]
    fn test_wrapped_error_is_internal() {
        let err: RustCareError = anyhow::anyhow!("socket closed").into();
        assert_eq!(err.code(), "INTERNAL");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
