//! Configuration for the RustCare settlement core
//!
//! Settings are loaded once at startup into a [`SettlementConfig`] and passed
//! by value to the services that need them. Nothing in the core reads
//! configuration lazily or from a global.
//!
//! # Sources
//!
//! Lowest to highest precedence:
//!
//! - **Defaults**: `SettlementConfig::default()`
//! - **File**: optional TOML or YAML file, picked by extension
//! - **Environment**: `RUSTCARE_*`, nested keys split on `__`
//!   (`RUSTCARE_DATABASE__URL`)
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::ConfigLoader;
//!
//! // Loads the layered settings and installs tracing from `[logging]`
//! let config = ConfigLoader::new()
//!     .with_file("settlement.toml")
//!     .init()
//!     .expect("valid settlement configuration");
//! tracing::info!(claim_prefix = %config.claim_number_prefix, "Settlement core starting");
//! ```

pub mod error;
pub mod providers;
pub mod settlement;
pub mod validation;

pub use error::*;
pub use providers::*;
pub use settlement::*;
