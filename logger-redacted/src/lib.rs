//! Logging for the settlement core with PII redaction
//!
//! Services log through plain `tracing` macros with structured fields.
//! Values that can identify a patient (policy numbers, free-text reasons
//! typed by staff) go through [`PiiRedactor`] first, so log sinks never see
//! them in the clear.
//!
//! ```rust
//! use logger_redacted::PiiRedactor;
//!
//! let redactor = PiiRedactor::default();
//! assert_eq!(redactor.mask_policy_number("HMO-2024-88120"), "**********8120");
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `config.level` when set.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| LoggerError::InvalidFilter(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(fmt::layer().with_target(false).with_ansi(false).json())
            .try_init()
            .map_err(|e| LoggerError::AlreadyInstalled(e.to_string()))
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()
            .map_err(|e| LoggerError::AlreadyInstalled(e.to_string()))
    }
}
