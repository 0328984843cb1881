// Transaction management
use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{Executor, Postgres, Transaction};
use tracing::debug;

/// Opens pool-owned transactions for unit-of-work style services
#[derive(Clone, Debug)]
pub struct TransactionManager {
    pool: DatabasePool,
    lock_timeout_ms: Option<u64>,
}

impl TransactionManager {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            lock_timeout_ms: None,
        }
    }

    /// Bound how long a statement waits on a row lock before failing
    pub fn with_lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Begin a new transaction
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        debug!("Beginning transaction");

        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to begin transaction: {}", e)))?;

        if let Some(timeout_ms) = self.lock_timeout_ms {
            let sql = format!("SET LOCAL lock_timeout = '{timeout_ms}ms'");
            (&mut *tx)
                .execute(sql.as_str())
                .await
                .map_err(|e| DatabaseError::QueryFailed(format!("Failed to apply lock timeout: {}", e)))?;
        }

        Ok(tx)
    }

    /// Run a multi-statement SQL script, e.g. a bundled schema
    pub async fn execute_script(&self, script: &str) -> DatabaseResult<()> {
        self.pool.pool().execute(script).await?;
        Ok(())
    }
}
