//! Report generation business logic.
//!
//! This module turns balances and store contents into presentation-ready data: a seller
//! statement (chronological debits and credits with a running balance), money formatting
//! and one-line balance summaries. All functions are framework-agnostic; rendering to PDF
//! or UI tables is left to the caller.

use crate::{
    core::{
        balance::{SellerBalance, compute_all_balances},
        exit_note::get_exit_notes_for_seller,
        payment_record::get_payments_for_seller,
    },
    entities::{exit_note, payment_record, payment_record::RecordStatus, seller},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Kind of statement movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// A delivered or received exit note (debit)
    ExitNote,
    /// An approved payment (credit)
    Payment,
}

/// One line of a seller statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movement {
    /// Note date or payment creation time
    pub date: DateTime<Utc>,
    /// Debit or credit
    pub kind: MovementKind,
    /// Human-readable label
    pub description: String,
    /// Amount added to the debt
    pub debit: f64,
    /// Amount removed from the debt
    pub credit: f64,
    /// Debt after this movement
    pub running_balance: f64,
}

/// Full movement history of one seller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerStatement {
    /// The seller
    pub seller: seller::Model,
    /// Balance computed from the same data as the movements
    pub balance: SellerBalance,
    /// Movements, oldest first
    pub movements: Vec<Movement>,
}

/// Builds the statement movements from a seller's notes and payment records.
///
/// Only notes that count as debt and approved records are included, matching
/// [`SellerBalance::from_parts`]. Movements on the same instant keep notes before payments,
/// and payments on the same instant keep the order they were recorded in.
#[must_use]
pub fn build_movements(
    notes: &[exit_note::Model],
    payments: &[payment_record::Model],
) -> Vec<Movement> {
    let debits = notes
        .iter()
        .filter(|note| note.status.counts_as_debt())
        .map(|note| Movement {
            date: note.date,
            kind: MovementKind::ExitNote,
            description: format!("Exit note #{}", note.number),
            debit: note.total_price,
            credit: 0.0,
            running_balance: 0.0,
        });

    let mut approved: Vec<&payment_record::Model> = payments
        .iter()
        .filter(|record| record.status == RecordStatus::Approved)
        .collect();
    approved.sort_by_key(|record| (record.created_at, record.id));

    let credits = approved.into_iter().map(|record| Movement {
        date: record.created_at,
        kind: MovementKind::Payment,
        description: record
            .notes
            .clone()
            .unwrap_or_else(|| format!("Payment {}", record.number)),
        debit: 0.0,
        credit: record.amount,
        running_balance: 0.0,
    });

    let mut movements: Vec<Movement> = debits.chain(credits).collect();
    movements.sort_by_key(|movement| movement.date);

    let mut running = 0.0;
    for movement in &mut movements {
        running += movement.debit - movement.credit;
        movement.running_balance = running;
    }

    movements
}

/// Generates the statement of one seller.
pub async fn seller_statement(db: &DatabaseConnection, seller_id: i64) -> Result<SellerStatement> {
    let seller = crate::core::seller::get_seller_by_id(db, seller_id)
        .await?
        .ok_or(Error::SellerNotFound { id: seller_id })?;

    let notes = get_exit_notes_for_seller(db, seller_id).await?;
    let payments = get_payments_for_seller(db, seller_id).await?;

    Ok(SellerStatement {
        seller,
        balance: SellerBalance::from_parts(&notes, &payments),
        movements: build_movements(&notes, &payments),
    })
}

/// Formats a dollar amount with thousands separators, e.g. `$1,234.50` or `-$12.00`.
#[must_use]
pub fn format_money(amount: f64) -> String {
    // Cast safety: display only, amounts are far below u64::MAX cents.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

/// One-line summary of a seller's balance. A negative debt is shown as credit.
#[must_use]
pub fn format_balance_summary(seller: &seller::Model, balance: &SellerBalance) -> String {
    let position = if balance.has_credit() {
        format!("credit {}", format_money(-balance.current_debt))
    } else {
        format!("owes {}", format_money(balance.current_debt))
    };

    format!(
        "{} (@{}): {position} | delivered {} | paid {}",
        seller.name,
        seller.slug,
        format_money(balance.historic_debt),
        format_money(balance.total_payments)
    )
}

/// One statement line, e.g. `2025-01-01 | Exit note #3 | +$120.00 | balance $120.00`.
#[must_use]
pub fn format_statement_line(movement: &Movement) -> String {
    let amount = match movement.kind {
        MovementKind::ExitNote => format!("+{}", format_money(movement.debit)),
        MovementKind::Payment => format!("-{}", format_money(movement.credit)),
    };

    format!(
        "{} | {} | {amount} | balance {}",
        movement.date.format("%Y-%m-%d"),
        movement.description,
        format_money(movement.running_balance)
    )
}

/// One summary line per seller, ordered by seller name.
pub async fn debt_summary(db: &DatabaseConnection) -> Result<Vec<String>> {
    Ok(compute_all_balances(db)
        .await?
        .iter()
        .map(|(seller, balance)| format_balance_summary(seller, balance))
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::allocation::{pay_global, pay_note};
    use crate::entities::payment_record::PaymentMethod;
    use crate::test_utils::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(5.5), "$5.50");
        assert_eq!(format_money(999.999), "$1,000.00");
        assert_eq!(format_money(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_money(-12.0), "-$12.00");
        assert_eq!(format_money(-0.001), "$0.00");
    }

    #[test]
    fn test_format_balance_summary() {
        let seller = seller::Model {
            id: 1,
            name: "Ana Morales".to_string(),
            email: "ana@example.com".to_string(),
            slug: "ana".to_string(),
            created_at: date(2025, 1, 1),
        };

        let owes = SellerBalance {
            historic_debt: 200.0,
            total_payments: 50.0,
            current_debt: 150.0,
        };
        assert_eq!(
            format_balance_summary(&seller, &owes),
            "Ana Morales (@ana): owes $150.00 | delivered $200.00 | paid $50.00"
        );

        let credit = SellerBalance {
            historic_debt: 40.0,
            total_payments: 100.0,
            current_debt: -60.0,
        };
        assert_eq!(
            format_balance_summary(&seller, &credit),
            "Ana Morales (@ana): credit $60.00 | delivered $40.00 | paid $100.00"
        );
    }

    #[test]
    fn test_build_movements_orders_same_instant_payments_by_id() {
        let paid_at = date(2025, 3, 1);
        let payment = |id: i64, amount: f64| payment_record::Model {
            id,
            number: format!("PAY-{id:06}"),
            source_type: payment_record::SourceType::Seller,
            seller_id: Some(1),
            customer_id: None,
            note_id: None,
            amount,
            method: PaymentMethod::Cash,
            status: RecordStatus::Approved,
            created_at: paid_at,
            approved_at: Some(paid_at),
            reference: None,
            notes: None,
        };

        // Newest first, as the store returns them
        let movements = build_movements(&[], &[payment(2, 30.0), payment(1, 10.0)]);
        let credits: Vec<f64> = movements.iter().map(|m| m.credit).collect();
        assert_eq!(credits, vec![10.0, 30.0]);
        assert_eq!(movements[0].description, "Payment PAY-000001");
        assert_eq!(movements[1].running_balance, -40.0);
    }

    #[test]
    fn test_format_statement_line() {
        let movement = Movement {
            date: date(2025, 1, 1),
            kind: MovementKind::ExitNote,
            description: "Exit note #3".to_string(),
            debit: 120.0,
            credit: 0.0,
            running_balance: 120.0,
        };
        assert_eq!(
            format_statement_line(&movement),
            "2025-01-01 | Exit note #3 | +$120.00 | balance $120.00"
        );
    }

    #[tokio::test]
    async fn test_seller_statement_integration() -> Result<()> {
        let (db, seller) = setup_with_seller().await?;
        let clock = test_clock();

        let n1 = create_delivered_note(&db, seller.id, date(2025, 1, 1), 120.0).await?;
        create_delivered_note(&db, seller.id, date(2025, 2, 1), 80.0).await?;
        // Not delivered yet, not part of the statement
        create_test_note(&db, seller.id, date(2025, 3, 1), 500.0).await?;

        pay_note(&db, &clock, n1.id, 20.0, PaymentMethod::Cash).await?;
        pay_global(&db, &clock, seller.id, 100.0, PaymentMethod::Bank).await?;

        let statement = seller_statement(&db, seller.id).await?;
        assert_eq!(statement.seller.id, seller.id);
        assert_eq!(statement.movements.len(), 4);

        let kinds: Vec<MovementKind> = statement.movements.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MovementKind::ExitNote,
                MovementKind::ExitNote,
                MovementKind::Payment,
                MovementKind::Payment
            ]
        );

        // Both payments share the clock instant and stay in recording order
        let running: Vec<f64> = statement.movements.iter().map(|m| m.running_balance).collect();
        assert_eq!(running, vec![120.0, 200.0, 180.0, 80.0]);
        assert_eq!(statement.movements[2].credit, 20.0);
        assert_eq!(statement.movements[3].credit, 100.0);

        let last = statement.movements.last().unwrap();
        assert_eq!(last.running_balance, statement.balance.current_debt);
        assert_eq!(statement.balance.current_debt, 80.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_seller_statement_unknown_seller() -> Result<()> {
        let db = setup_test_db().await?;

        let result = seller_statement(&db, 31).await;
        assert!(matches!(result.unwrap_err(), Error::SellerNotFound { id: 31 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_debt_summary() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_seller(&db, "Ana Morales").await?;
        create_delivered_note(&db, ana.id, date(2025, 1, 1), 1_250.0).await?;

        let lines = debt_summary(&db).await?;
        assert_eq!(
            lines,
            vec!["Ana Morales (@ana): owes $1,250.00 | delivered $1,250.00 | paid $0.00".to_string()]
        );

        Ok(())
    }
}
