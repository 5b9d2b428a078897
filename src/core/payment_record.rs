//! Payment record business logic - The audit trail of money received.
//!
//! Records are created either by the allocator (seller debt payments, auto-approved) or by
//! other flows (bank deposits reported by sellers, walk-in customer payments). Only
//! approved records count toward a seller's total payments. A pending record can be
//! approved or rejected once; approved and rejected records are final.

use crate::{
    core::{clock::Clock, sequence},
    entities::{
        PaymentRecord, payment_record,
        payment_record::{PaymentMethod, RecordStatus, SourceType},
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Who a payment comes from. A record always has exactly one payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payer {
    /// A consignment seller, by seller id
    Seller(i64),
    /// A walk-in customer, by customer id
    Customer(String),
}

/// A payment record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentRecord {
    /// Seller or customer paying
    pub payer: Payer,
    /// Exit note the payment is made against, None for global payments
    pub note_id: Option<i64>,
    /// Amount received, must be positive
    pub amount: f64,
    /// Cash or bank
    pub method: PaymentMethod,
    /// Initial review status
    pub status: RecordStatus,
    /// External reference (receipt or transfer number)
    pub reference: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
}

/// Rejects amounts that are zero, negative, NaN or infinite.
pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Persists a payment record with the next payment number.
///
/// The number and the record are written in their own transaction (a savepoint when `db`
/// is already a transaction). `approved_at` is stamped when the record is created already
/// approved.
pub async fn create_payment_record<C>(
    db: &C,
    clock: &impl Clock,
    record: NewPaymentRecord,
) -> Result<payment_record::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_amount(record.amount)?;

    let (source_type, seller_id, customer_id) = match record.payer {
        Payer::Seller(id) => (SourceType::Seller, Some(id), None),
        Payer::Customer(id) => {
            if id.trim().is_empty() {
                return Err(Error::Validation {
                    message: "Customer id cannot be empty".to_string(),
                });
            }
            (SourceType::Customer, None, Some(id))
        }
    };

    let now = clock.now();
    let txn = db.begin().await?;
    let number = sequence::next_value(&txn, sequence::PAYMENT_SEQUENCE).await?;
    let approved_at = (record.status == RecordStatus::Approved).then_some(now);

    let model = payment_record::ActiveModel {
        number: Set(sequence::format_payment_number(number)),
        source_type: Set(source_type),
        seller_id: Set(seller_id),
        customer_id: Set(customer_id),
        note_id: Set(record.note_id),
        amount: Set(record.amount),
        method: Set(record.method),
        status: Set(record.status),
        created_at: Set(now),
        approved_at: Set(approved_at),
        reference: Set(record.reference),
        notes: Set(record.notes),
        ..Default::default()
    };

    let inserted = model.insert(&txn).await?;
    txn.commit().await?;

    Ok(inserted)
}

/// Records a walk-in customer payment. Customer payments are approved on creation.
#[instrument(skip(db, clock))]
pub async fn record_customer_payment(
    db: &DatabaseConnection,
    clock: &impl Clock,
    customer_id: &str,
    amount: f64,
    method: PaymentMethod,
    reference: Option<String>,
) -> Result<payment_record::Model> {
    let record = create_payment_record(
        db,
        clock,
        NewPaymentRecord {
            payer: Payer::Customer(customer_id.trim().to_string()),
            note_id: None,
            amount,
            method,
            status: RecordStatus::Approved,
            reference,
            notes: None,
        },
    )
    .await?;

    info!(number = %record.number, amount, "Customer payment recorded");
    Ok(record)
}

/// Retrieves a payment record by its unique ID.
pub async fn get_payment_record_by_id(
    db: &DatabaseConnection,
    record_id: i64,
) -> Result<Option<payment_record::Model>> {
    PaymentRecord::find_by_id(record_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all payment records of a seller, in any status, newest first.
///
/// Unknown sellers simply have no records.
pub async fn get_payments_for_seller<C>(db: &C, seller_id: i64) -> Result<Vec<payment_record::Model>>
where
    C: ConnectionTrait,
{
    PaymentRecord::find()
        .filter(payment_record::Column::SellerId.eq(seller_id))
        .order_by_desc(payment_record::Column::CreatedAt)
        .order_by_desc(payment_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the payment records linked to one exit note, oldest first.
pub async fn get_payments_for_note(
    db: &DatabaseConnection,
    note_id: i64,
) -> Result<Vec<payment_record::Model>> {
    PaymentRecord::find()
        .filter(payment_record::Column::NoteId.eq(note_id))
        .order_by_asc(payment_record::Column::CreatedAt)
        .order_by_asc(payment_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Approves or rejects a pending payment record.
///
/// Re-applying the current status is a no-op. Any other change to an approved or rejected
/// record, or moving a record back to pending, fails with
/// [`Error::InvalidStatusTransition`].
#[instrument(skip(db, clock))]
pub async fn update_payment_status(
    db: &DatabaseConnection,
    clock: &impl Clock,
    record_id: i64,
    status: RecordStatus,
) -> Result<payment_record::Model> {
    let record = get_payment_record_by_id(db, record_id)
        .await?
        .ok_or(Error::PaymentRecordNotFound { id: record_id })?;

    if record.status == status {
        return Ok(record);
    }

    if record.status != RecordStatus::Pending || status == RecordStatus::Pending {
        return Err(Error::InvalidStatusTransition {
            from: record.status.to_string(),
            to: status.to_string(),
        });
    }

    let mut active_model: payment_record::ActiveModel = record.into();
    active_model.status = Set(status);
    if status == RecordStatus::Approved {
        active_model.approved_at = Set(Some(clock.now()));
    }
    let updated = active_model.update(db).await?;

    info!(record_id, number = %updated.number, %status, "Payment record reviewed");
    Ok(updated)
}
