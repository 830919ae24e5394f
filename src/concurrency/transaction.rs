//! Transaction lifecycle.

use std::fmt;

use crate::common::{Error, Result, TransactionId};

/// Where a transaction is in its lifecycle.
///
/// ```text
/// Active ──commit──▶ Committing ──┐
///    │                            ├──▶ Completed
///    └────abort───▶ Aborting ─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committing,
    Aborting,
    Completed,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionState::Active => "active",
            TransactionState::Committing => "committing",
            TransactionState::Aborting => "aborting",
            TransactionState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A transaction handle owned by the caller.
///
/// The buffer pool only ever sees the [`TransactionId`]; the state lives
/// here so that a finished transaction cannot be completed twice.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
}

impl Transaction {
    /// Start a transaction. Nothing is registered anywhere until it
    /// first touches a page.
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Active,
        }
    }

    #[inline]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Move from `Active` to `Committing` or `Aborting`.
    ///
    /// # Errors
    /// `Error::TransactionCompleted` from any other state.
    pub(crate) fn begin_completion(&mut self, commit: bool) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::TransactionCompleted(self.id));
        }
        self.state = if commit {
            TransactionState::Committing
        } else {
            TransactionState::Aborting
        };
        Ok(())
    }

    pub(crate) fn finish(&mut self) {
        debug_assert!(matches!(
            self.state,
            TransactionState::Committing | TransactionState::Aborting
        ));
        self.state = TransactionState::Completed;
    }
}
