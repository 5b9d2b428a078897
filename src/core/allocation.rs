//! Payment allocation - Applies seller payments to exit notes.
//!
//! Two entry points:
//!
//! * [`pay_note`] pays an amount against one note. The amount is not capped at what the
//!   note still owes.
//! * [`pay_global`] spreads a lump sum across the seller's outstanding notes, oldest note
//!   first, until the money runs out or every note is paid. Whatever is left over is
//!   returned as `remainder` (seller credit).
//!
//! A note's `amount_paid` is raised with an atomic `amount_paid = amount_paid + x`
//! statement and its payment status is then re-derived, so two admins paying the same note
//! at once cannot lose an update. All note updates of one call run in one database
//! transaction. The payment record written afterwards is an audit trail only: if it fails,
//! the note updates stand and the failure is logged as a warning.

use crate::{
    core::{
        clock::Clock,
        exit_note::{get_exit_note_by_id, get_outstanding_notes_for_seller},
        payment_record::{NewPaymentRecord, Payer, create_payment_record, validate_amount},
    },
    entities::{
        ExitNote, exit_note,
        exit_note::PaymentStatus,
        payment_record,
        payment_record::{PaymentMethod, RecordStatus},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument, warn};

/// Currency rounding tolerance: a note is paid once it owes less than one cent.
pub const PAYMENT_EPSILON: f64 = 0.01;

/// Derives a note's payment status from what was paid and what it costs.
#[must_use]
pub fn payment_status_for(amount_paid: f64, total_price: f64) -> PaymentStatus {
    if amount_paid >= total_price - PAYMENT_EPSILON {
        PaymentStatus::Paid
    } else if amount_paid > 0.0 {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    }
}

/// The part of an exit note the allocator needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutstandingNote {
    /// Note id
    pub note_id: i64,
    /// Note number, breaks ties between notes with the same date
    pub number: i64,
    /// Shipment date
    pub date: DateTime<Utc>,
    /// `total_price - amount_paid`
    pub pending: f64,
}

impl From<&exit_note::Model> for OutstandingNote {
    fn from(note: &exit_note::Model) -> Self {
        Self {
            note_id: note.id,
            number: note.number,
            date: note.date,
            pending: note.total_price - note.amount_paid,
        }
    }
}

/// Money assigned to one note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteAllocation {
    /// Note id
    pub note_id: i64,
    /// Note number
    pub number: i64,
    /// Amount applied to this note
    pub amount: f64,
}

/// Result of splitting a lump sum across notes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationPlan {
    /// One entry per note that receives money, oldest first
    pub allocations: Vec<NoteAllocation>,
    /// Money left after every note was paid or the sum ran out
    pub remainder: f64,
}

/// Splits `amount` across `notes`, oldest first.
///
/// Each note gets `min(pending, remaining)`. Allocation stops once what remains is at most
/// [`PAYMENT_EPSILON`]. Notes with nothing pending are skipped.
#[must_use]
pub fn plan_allocation(notes: &[OutstandingNote], amount: f64) -> AllocationPlan {
    let mut ordered = notes.to_vec();
    ordered.sort_by_key(|note| (note.date, note.number));

    let mut remaining = amount;
    let mut allocations = Vec::new();

    for note in ordered {
        if remaining <= PAYMENT_EPSILON {
            break;
        }

        let to_pay = note.pending.min(remaining);
        if to_pay > 0.0 {
            allocations.push(NoteAllocation {
                note_id: note.note_id,
                number: note.number,
                amount: to_pay,
            });
            remaining -= to_pay;
        }
    }

    AllocationPlan {
        allocations,
        remainder: remaining,
    }
}

/// Outcome of [`pay_note`].
#[derive(Debug, Clone, PartialEq)]
pub struct PayNoteOutcome {
    /// The note after the payment
    pub note: exit_note::Model,
    /// What the note still owed before this payment (display hint)
    pub pending_before: f64,
    /// The audit record, None if it could not be written
    pub payment_record: Option<payment_record::Model>,
}

/// Outcome of [`pay_global`].
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPaymentOutcome {
    /// Number of notes that received any money
    pub notes_paid_count: usize,
    /// Money not applied to any note (seller credit)
    pub remainder: f64,
    /// Per-note breakdown, oldest first
    pub allocations: Vec<NoteAllocation>,
    /// The audit record, None if it could not be written
    pub payment_record: Option<payment_record::Model>,
}

/// Atomically adds `amount` to a note's `amount_paid` and re-derives its payment status.
///
/// Run it inside a transaction so the increment and the status write land together.
/// The increment is the first statement, so the transaction holds the write lock before
/// it reads the note back.
pub async fn apply_note_payment<C>(db: &C, note_id: i64, amount: f64) -> Result<exit_note::Model>
where
    C: ConnectionTrait,
{
    // amount_paid = amount_paid + amount
    let result = ExitNote::update_many()
        .col_expr(
            exit_note::Column::AmountPaid,
            Expr::col(exit_note::Column::AmountPaid).add(amount),
        )
        .filter(exit_note::Column::Id.eq(note_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NoteNotFound { id: note_id });
    }

    let note = get_exit_note_by_id(db, note_id)
        .await?
        .ok_or(Error::NoteNotFound { id: note_id })?;

    let status = payment_status_for(note.amount_paid, note.total_price);
    if status == note.payment_status {
        return Ok(note);
    }

    let mut active_model: exit_note::ActiveModel = note.into();
    active_model.payment_status = Set(status);
    active_model.update(db).await.map_err(Into::into)
}

/// Writes the audit record for a payment. Failures are logged and swallowed.
async fn record_payment_best_effort(
    db: &DatabaseConnection,
    clock: &impl Clock,
    record: NewPaymentRecord,
) -> Option<payment_record::Model> {
    match create_payment_record(db, clock, record).await {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(error = %e, "Payment applied but its audit record was not written");
            None
        }
    }
}

/// Pays `amount` against one exit note.
///
/// The amount must be positive; it may be more or less than what the note still owes.
/// The note becomes `paid` once `amount_paid >= total_price - 0.01`, otherwise `partial`.
/// An approved payment record linked to the note is written afterwards, best-effort.
#[instrument(skip(db, clock))]
pub async fn pay_note(
    db: &DatabaseConnection,
    clock: &impl Clock,
    note_id: i64,
    amount: f64,
    method: PaymentMethod,
) -> Result<PayNoteOutcome> {
    validate_amount(amount)?;

    let txn = db.begin().await?;
    let note = apply_note_payment(&txn, note_id, amount).await?;
    txn.commit().await?;

    let pending_before = note.total_price - (note.amount_paid - amount);

    info!(
        note_id,
        number = note.number,
        amount,
        amount_paid = note.amount_paid,
        payment_status = %note.payment_status,
        "Exit note payment applied"
    );

    let payment_record = record_payment_best_effort(
        db,
        clock,
        NewPaymentRecord {
            payer: Payer::Seller(note.seller_id),
            note_id: Some(note.id),
            amount,
            method,
            status: RecordStatus::Approved,
            reference: None,
            notes: Some(format!("Payment for exit note #{}", note.number)),
        },
    )
    .await;

    Ok(PayNoteOutcome {
        note,
        pending_before,
        payment_record,
    })
}

/// Spreads a lump payment across a seller's outstanding notes, oldest first.
///
/// One global payment record with the full `amount` is written afterwards, best-effort,
/// also when no note needed money. The unapplied part is returned as `remainder`.
#[instrument(skip(db, clock))]
pub async fn pay_global(
    db: &DatabaseConnection,
    clock: &impl Clock,
    seller_id: i64,
    amount: f64,
    method: PaymentMethod,
) -> Result<GlobalPaymentOutcome> {
    validate_amount(amount)?;

    crate::core::seller::get_seller_by_id(db, seller_id)
        .await?
        .ok_or(Error::SellerNotFound { id: seller_id })?;

    let txn = db.begin().await?;

    let outstanding: Vec<OutstandingNote> = get_outstanding_notes_for_seller(&txn, seller_id)
        .await?
        .iter()
        .map(OutstandingNote::from)
        .collect();
    let plan = plan_allocation(&outstanding, amount);

    for allocation in &plan.allocations {
        let note = apply_note_payment(&txn, allocation.note_id, allocation.amount).await?;
        debug!(
            note_id = note.id,
            number = note.number,
            applied = allocation.amount,
            payment_status = %note.payment_status,
            "Lump payment applied to note"
        );
    }

    txn.commit().await?;

    let notes_paid_count = plan.allocations.len();
    info!(
        seller_id,
        amount,
        notes_paid_count,
        remainder = plan.remainder,
        "Global payment allocated"
    );

    let payment_record = record_payment_best_effort(
        db,
        clock,
        NewPaymentRecord {
            payer: Payer::Seller(seller_id),
            note_id: None,
            amount,
            method,
            status: RecordStatus::Approved,
            reference: None,
            notes: Some(format!(
                "Global payment applied to {notes_paid_count} exit notes"
            )),
        },
    )
    .await;

    Ok(GlobalPaymentOutcome {
        notes_paid_count,
        remainder: plan.remainder,
        allocations: plan.allocations,
        payment_record,
    })
}
