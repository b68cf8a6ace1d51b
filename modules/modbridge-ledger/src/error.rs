use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The item was already recorded. Callers check before inserting, so
    /// hitting this means two writers or a caller bug.
    #[error("item already recorded: {item_id}")]
    Duplicate { item_id: String },

    /// A row violated the root/reply exclusivity constraint.
    #[error("ledger constraint violated: {0}")]
    Constraint(String),

    #[error("ledger database error: {0}")]
    Database(#[from] sqlx::Error),
}
