//! Explicit transaction facade plus the internal RAII guard every
//! multi-statement operation uses.
//!
//! The public API (`Database::begin_transaction`/`commit`/`rollback`) and
//! the internal [`TransactionGuard`] share one `Cell<bool>` flag. A guard
//! constructed while a transaction is already open becomes a no-op on
//! `commit`/drop — it defers entirely to the outer, caller-managed
//! transaction.

use std::cell::Cell;

use duckdb::Connection;

use crate::error::{Error, Result};

/// Shared state between the public transaction facade and every internal
/// guard. Lives on [`crate::database::Database`].
#[derive(Default)]
pub struct TransactionState {
    active: Cell<bool>,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn begin(&self, conn: &Connection) -> Result<()> {
        if self.active.get() {
            return Err(Error::invalid_argument("a transaction is already open"));
        }
        conn.execute_batch("BEGIN TRANSACTION")?;
        self.active.set(true);
        Ok(())
    }

    pub fn commit(&self, conn: &Connection) -> Result<()> {
        if !self.active.get() {
            return Err(Error::invalid_argument("no transaction is open"));
        }
        conn.execute_batch("COMMIT")?;
        self.active.set(false);
        Ok(())
    }

    pub fn rollback(&self, conn: &Connection) -> Result<()> {
        if !self.active.get() {
            return Err(Error::invalid_argument("no transaction is open"));
        }
        conn.execute_batch("ROLLBACK")?;
        self.active.set(false);
        Ok(())
    }
}

/// A scoped guard tied to the dynamic extent of one internal operation.
///
/// Construction begins a transaction, unless one is already open (in which
/// case the guard becomes a pass-through no-op). `commit()` disarms it;
/// any other exit path — an early `?` return, a panic — rolls back via
/// `Drop`.
pub struct TransactionGuard<'a> {
    conn: &'a Connection,
    state: &'a TransactionState,
    owns_transaction: bool,
    committed: bool,
}

impl<'a> TransactionGuard<'a> {
    pub fn begin(conn: &'a Connection, state: &'a TransactionState) -> Result<Self> {
        let owns_transaction = !state.is_active();
        if owns_transaction {
            conn.execute_batch("BEGIN TRANSACTION")?;
            state.active.set(true);
        }
        Ok(Self {
            conn,
            state,
            owns_transaction,
            committed: false,
        })
    }

    pub fn conn(&self) -> &Connection {
        self.conn
    }

    pub fn commit(mut self) -> Result<()> {
        if self.owns_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.state.active.set(false);
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.committed || !self.owns_transaction {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            tracing::error!(error = %err, "rollback failed while unwinding transaction guard");
        }
        self.state.active.set(false);
    }
}
