//! Core business logic - framework-agnostic seller, exit note, payment and balance operations.

/// Oldest-first payment allocation across exit notes
pub mod allocation;
/// Seller balance calculation
pub mod balance;
/// Time source used to stamp dates
pub mod clock;
/// Exit note store
pub mod exit_note;
/// Payment record store
pub mod payment_record;
/// Seller statements and formatting
pub mod report;
/// Seller directory and slug generation
pub mod seller;
/// Persisted sequence numbers for notes and payment records
pub mod sequence;
