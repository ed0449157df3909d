use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Transaction isolation level requested by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        };
        f.write_str(s)
    }
}

/// The controller's data-access collaborator.
///
/// Only the transaction bracket is consumed by the engine; everything else
/// about the storage layer is the collaborator's business.
pub trait DataAccess: Send + Sync {
    /// Open a transaction. `None` means the store's default isolation.
    fn start_transaction(&self, isolation: Option<IsolationLevel>) -> anyhow::Result<()>;

    fn commit(&self) -> anyhow::Result<()>;

    fn rollback(&self) -> anyhow::Result<()>;
}

/// Scope guard for one open transaction.
///
/// Consumed by [`commit`](Self::commit) or [`rollback`](Self::rollback). A
/// guard dropped while still open rolls back, so every exit path out of the
/// executing state releases the transaction exactly once.
#[must_use = "an unfinished transaction is rolled back on drop"]
pub struct TransactionGuard {
    data_access: Arc<dyn DataAccess>,
    action: Arc<str>,
    open: bool,
}

impl TransactionGuard {
    /// Start a transaction on `data_access`.
    ///
    /// # Errors
    ///
    /// The collaborator's error when the transaction cannot be opened.
    pub fn begin(
        data_access: Arc<dyn DataAccess>,
        action: Arc<str>,
        isolation: Option<IsolationLevel>,
    ) -> anyhow::Result<Self> {
        data_access.start_transaction(isolation)?;
        debug!(action = %action, isolation = ?isolation, "Transaction started");
        Ok(Self {
            data_access,
            action,
            open: true,
        })
    }

    /// Commit and close.
    ///
    /// # Errors
    ///
    /// The collaborator's commit error. The guard is closed either way.
    pub fn commit(mut self) -> anyhow::Result<()> {
        self.open = false;
        self.data_access.commit()?;
        debug!(action = %self.action, "Transaction committed");
        Ok(())
    }

    /// Roll back and close.
    ///
    /// # Errors
    ///
    /// The collaborator's rollback error. The guard is closed either way.
    pub fn rollback(mut self) -> anyhow::Result<()> {
        self.open = false;
        self.data_access.rollback()?;
        debug!(action = %self.action, "Transaction rolled back");
        Ok(())
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        match self.data_access.rollback() {
            Ok(()) => debug!(action = %self.action, "Unfinished transaction rolled back"),
            Err(e) => error!(action = %self.action, error = %e, "Rollback of unfinished transaction failed"),
        }
    }
}
