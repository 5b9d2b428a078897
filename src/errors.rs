//! Unified error type for the consignment ledger.
//!
//! Validation failures (`InvalidAmount`, `NoteNotFound`, `SellerNotFound`, ...) are raised
//! before any write happens. `Database` wraps every persistence failure and is propagated
//! as-is: nothing is retried and earlier committed steps are not rolled back.

use thiserror::Error;

/// Errors produced by the consignment ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Input rejected before touching the store
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },

    /// Underlying store call failed (connection, constraint, permission)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Amount is zero, negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// No exit note with this id
    #[error("Exit note not found: {id}")]
    NoteNotFound {
        /// The requested note id
        id: i64,
    },

    /// No seller with this id
    #[error("Seller not found: {id}")]
    SellerNotFound {
        /// The requested seller id
        id: i64,
    },

    /// No payment record with this id
    #[error("Payment record not found: {id}")]
    PaymentRecordNotFound {
        /// The requested payment record id
        id: i64,
    },

    /// A status change that the lifecycle does not allow
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// The exit note already received payments and cannot be reverted
    #[error("Exit note {id} has payments and cannot be deleted")]
    NoteHasPayments {
        /// The note id
        id: i64,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
