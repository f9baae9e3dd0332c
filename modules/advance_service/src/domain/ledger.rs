//! Repayment ledger arithmetic
//!
//! The ledger sum is the only source of truth for how much of an advance has
//! been repaid. Every read path derives balances through this module.

use crate::contract::{Advance, AdvanceSummary, AdvancesError, RepaymentEntry};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Largest amount a `NUMERIC(14, 2)` money column holds: `999999999999.99`
pub const MAX_MONEY: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Overflow-checked total of money values
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
}

/// [`checked_sum`] for aggregates over stored rows; overflow means corrupt data
pub fn money_total(
    what: &str,
    values: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, AdvancesError> {
    checked_sum(values).ok_or_else(|| {
        tracing::error!(total = what, "money total overflowed");
        AdvancesError::Internal
    })
}

/// An advance together with the sum of its active ledger entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPosition {
    pub advance: Advance,
    pub repaid: Decimal,
}

impl LedgerPosition {
    /// Build a position from the advance and its ledger entries (reversed entries are skipped)
    pub fn from_entries<'a>(
        advance: Advance,
        entries: impl IntoIterator<Item = &'a RepaymentEntry>,
    ) -> Self {
        let repaid = repaid_total(entries);
        Self { advance, repaid }
    }

    pub fn remaining(&self) -> Decimal {
        remaining_balance(self.advance.amount, self.repaid)
    }

    pub fn estimated_months(&self) -> Option<u32> {
        estimated_months(self.remaining(), self.advance.monthly_deduction)
    }

    pub fn summary(&self) -> AdvanceSummary {
        AdvanceSummary {
            advance: self.advance.clone(),
            repaid_amount: self.repaid,
            remaining_balance: self.remaining(),
            estimated_months: self.estimated_months(),
        }
    }
}

/// Sum of the active entries
pub fn repaid_total<'a>(entries: impl IntoIterator<Item = &'a RepaymentEntry>) -> Decimal {
    entries
        .into_iter()
        .filter(|entry| entry.is_active())
        .map(|entry| entry.amount)
        .fold(Decimal::ZERO, |total, amount| total.saturating_add(amount))
}

/// `max(0, amount - repaid)`
pub fn remaining_balance(amount: Decimal, repaid: Decimal) -> Decimal {
    amount.saturating_sub(repaid).max(Decimal::ZERO)
}

/// Months needed to clear `remaining` at `monthly_deduction` per month
///
/// Returns `None` when no positive deduction is set, so callers never divide by zero.
pub fn estimated_months(remaining: Decimal, monthly_deduction: Option<Decimal>) -> Option<u32> {
    let deduction = monthly_deduction.filter(|d| *d > Decimal::ZERO)?;
    if remaining <= Decimal::ZERO {
        return Some(0);
    }
    (remaining / deduction).ceil().to_u32()
}

/// Share of a repayment booked against one advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub advance_id: Uuid,
    pub amount: Decimal,
}

/// Distribute `amount` over open positions, smallest remaining balance first
///
/// Ties are broken by request time (oldest first). Positions without an open
/// balance are skipped. Any part of `amount` exceeding the total balance is
/// left unallocated; callers validate the amount beforehand.
pub fn allocate(amount: Decimal, positions: &[LedgerPosition]) -> Vec<Allocation> {
    let mut open: Vec<&LedgerPosition> = positions
        .iter()
        .filter(|p| p.remaining() > Decimal::ZERO)
        .collect();
    open.sort_by(|a, b| {
        a.remaining()
            .cmp(&b.remaining())
            .then(a.advance.created_at.cmp(&b.advance.created_at))
    });

    let mut left = amount;
    let mut allocations = Vec::new();
    for position in open {
        if left <= Decimal::ZERO {
            break;
        }
        let share = left.min(position.remaining());
        allocations.push(Allocation {
            advance_id: position.advance.id,
            amount: share,
        });
        left -= share;
    }
    allocations
}
