//! PostgreSQL access for the settlement core
//!
//! Thin wrapper over `sqlx`: a configured pool, a transaction manager whose
//! transactions own their connection (`Transaction<'static, Postgres>`) so
//! they can live inside a service-level unit of work, and a shared error
//! type that recognises unique violations.
//!
//! ```rust,no_run
//! use config_engine::DatabaseSettings;
//! use database_layer::{DatabasePool, TransactionManager};
//!
//! # async fn run() -> database_layer::DatabaseResult<()> {
//! let pool = DatabasePool::connect(&DatabaseSettings::default()).await?;
//! let manager = TransactionManager::new(pool).with_lock_timeout_ms(5_000);
//! let tx = manager.begin().await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod transaction;

pub use connection::*;
pub use error::*;
pub use transaction::*;
