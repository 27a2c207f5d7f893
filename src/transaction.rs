//! Batch lifecycle
//!
//! ```text
//! Pending -> Applying -> Committed
//!                    \-> RolledBack
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchState {
    Pending,
    Applying,
    Committed,
    RolledBack,
}

impl BatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchState::Committed | BatchState::RolledBack)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Batch {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: BatchState,
        to: BatchState,
    },
}

pub type TransactionResult<T> = Result<T, TransactionError>;

/// State of one batch execution
#[derive(Debug, Clone)]
pub struct Transaction {
    id: Uuid,
    state: BatchState,
    statements: usize,
}

impl Transaction {
    pub fn new(statements: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: BatchState::Pending,
            statements,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn statements(&self) -> usize {
        self.statements
    }

    pub fn begin(&mut self) -> TransactionResult<()> {
        self.transition(BatchState::Pending, BatchState::Applying)
    }

    pub fn commit(&mut self) -> TransactionResult<()> {
        self.transition(BatchState::Applying, BatchState::Committed)
    }

    pub fn rollback(&mut self) -> TransactionResult<()> {
        self.transition(BatchState::Applying, BatchState::RolledBack)
    }

    fn transition(&mut self, from: BatchState, to: BatchState) -> TransactionResult<()> {
        if self.state != from {
            return Err(TransactionError::InvalidTransition {
                id: self.id,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
