//! Persisted sequence numbers.
//!
//! Exit notes get sequential numbers (1, 2, 3, ...) and payment records get generated
//! numbers (`PAY-000001`, ...). The next value of each sequence lives in the
//! `system_state` table. Rows are created once by [`ensure_sequences`] and afterwards only
//! advanced with an atomic `value = value + 1`, so concurrent sessions never hand out the
//! same number.

use crate::{
    entities::{SystemState, system_state},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    Set,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

/// Key of the exit note number sequence
pub const EXIT_NOTE_SEQUENCE: &str = "next_exit_note_number";
/// Key of the payment record number sequence
pub const PAYMENT_SEQUENCE: &str = "next_payment_number";

/// Creates the sequence rows that do not exist yet, starting at 1.
///
/// Existing counters are left untouched, so this is safe to run on every start.
pub async fn ensure_sequences<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let rows = [EXIT_NOTE_SEQUENCE, PAYMENT_SEQUENCE].map(|key| system_state::ActiveModel {
        key: Set(key.to_string()),
        value: Set(1),
        updated_at: Set(now),
        ..Default::default()
    });

    let inserted = SystemState::insert_many(rows)
        .on_conflict(
            OnConflict::column(system_state::Column::Key)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    debug!(inserted, "Sequences ensured");
    Ok(())
}

/// Returns the next value of the `key` sequence and advances it.
///
/// Run it inside a transaction: the increment takes the write lock, and the re-read then
/// sees this session's value.
pub async fn next_value<C>(db: &C, key: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    let not_initialised = || Error::Config {
        message: format!("Sequence '{key}' is not initialised"),
    };

    // value = value + 1
    let result = SystemState::update_many()
        .col_expr(
            system_state::Column::Value,
            Expr::col(system_state::Column::Value).add(1),
        )
        .col_expr(
            system_state::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(system_state::Column::Key.eq(key))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(not_initialised());
    }

    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?
        .ok_or_else(not_initialised)?;

    Ok(state.value - 1)
}

/// Formats a payment record number from its sequence value.
#[must_use]
pub fn format_payment_number(value: i64) -> String {
    format!("PAY-{value:06}")
}
