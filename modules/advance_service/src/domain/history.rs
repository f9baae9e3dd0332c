//! Grouping of ledger entries into calendar months

use crate::contract::{MonthlyRepayments, RepaymentEntry};
use chrono::Datelike;
use rust_decimal::Decimal;

/// Group entries by the month of their payment date
///
/// Input order is preserved, both for months and for the entries within a month.
pub fn group_by_month(entries: Vec<RepaymentEntry>) -> Vec<MonthlyRepayments> {
    let mut months: Vec<MonthlyRepayments> = Vec::new();

    for entry in entries {
        let key = format!(
            "{:04}-{:02}",
            entry.payment_date.year(),
            entry.payment_date.month()
        );
        match months.iter_mut().find(|m| m.month == key) {
            Some(month) => {
                month.total_amount += entry.amount;
                month.payments.push(entry);
            }
            None => months.push(MonthlyRepayments {
                month: key,
                label: entry.payment_date.format("%B %Y").to_string(),
                total_amount: entry.amount,
                payments: vec![entry],
            }),
        }
    }

    months
}
