//! Seller balance calculation.
//!
//! A balance is never stored. It is recomputed from the stores on every call:
//! historic debt is the sum of delivered or received note totals, total payments is the
//! sum of approved payment records, and current debt is their difference. Current debt
//! may be negative when a seller has paid more than they owe (credit).

use crate::{
    core::{exit_note::get_exit_notes_for_seller, payment_record::get_payments_for_seller},
    entities::{exit_note, payment_record, payment_record::RecordStatus, seller},
    errors::Result,
};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::Serialize;

/// Debt position of one seller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SellerBalance {
    /// Sum of `total_price` over delivered/received notes
    pub historic_debt: f64,
    /// Sum of `amount` over approved payment records
    pub total_payments: f64,
    /// `historic_debt - total_payments`, negative when the seller has credit
    pub current_debt: f64,
}

impl SellerBalance {
    /// Computes a balance from a seller's notes and payment records.
    ///
    /// Notes that are not delivered/received and records that are not approved are ignored.
    #[must_use]
    pub fn from_parts(notes: &[exit_note::Model], payments: &[payment_record::Model]) -> Self {
        let historic_debt = notes
            .iter()
            .filter(|note| note.status.counts_as_debt())
            .map(|note| note.total_price)
            .sum::<f64>();

        let total_payments = payments
            .iter()
            .filter(|record| record.status == RecordStatus::Approved)
            .map(|record| record.amount)
            .sum::<f64>();

        Self {
            historic_debt,
            total_payments,
            current_debt: historic_debt - total_payments,
        }
    }

    /// Whether the seller has paid more than they owe.
    #[must_use]
    pub fn has_credit(&self) -> bool {
        self.current_debt < 0.0
    }
}

/// Computes the balance of one seller, reading through to the stores.
///
/// An unknown seller id has no notes and no payments, so it yields a zero balance.
pub async fn compute_balance<C>(db: &C, seller_id: i64) -> Result<SellerBalance>
where
    C: ConnectionTrait,
{
    let notes = get_exit_notes_for_seller(db, seller_id).await?;
    let payments = get_payments_for_seller(db, seller_id).await?;

    Ok(SellerBalance::from_parts(&notes, &payments))
}

/// Computes the balance of every seller, ordered by seller name.
pub async fn compute_all_balances(
    db: &DatabaseConnection,
) -> Result<Vec<(seller::Model, SellerBalance)>> {
    let sellers = crate::core::seller::get_all_sellers(db).await?;

    let mut balances = Vec::with_capacity(sellers.len());
    for seller in sellers {
        let balance = compute_balance(db, seller.id).await?;
        balances.push((seller, balance));
    }

    Ok(balances)
}
