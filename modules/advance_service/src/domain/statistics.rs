//! Aggregate figures over a set of advances

use super::ledger::{money_total, LedgerPosition};
use crate::contract::{AdvanceStatistics, AdvanceStatus, AdvancesError};
use rust_decimal::Decimal;

/// Summarise `positions`
///
/// "Approved" covers every advance that passed approval (approved, paid and
/// repaid ones). The approval rate is the percentage of decided requests
/// that were approved, `0` when nothing has been decided yet.
pub fn summarize(positions: &[LedgerPosition]) -> Result<AdvanceStatistics, AdvancesError> {
    let count = |status: AdvanceStatus| {
        positions
            .iter()
            .filter(|p| p.advance.status == status)
            .count() as u64
    };
    let passed_approval =
        |p: &&LedgerPosition| !matches!(p.advance.status, AdvanceStatus::Pending | AdvanceStatus::Rejected);

    let total_requests = positions.len() as u64;
    let rejected_requests = count(AdvanceStatus::Rejected);
    let approved_total = positions.iter().filter(passed_approval).count() as u64;

    let total_amount_requested = money_total(
        "total_amount_requested",
        positions.iter().map(|p| p.advance.amount),
    )?;
    let total_amount_approved = money_total(
        "total_amount_approved",
        positions
            .iter()
            .filter(passed_approval)
            .map(|p| p.advance.amount),
    )?;
    let total_amount_repaid =
        money_total("total_amount_repaid", positions.iter().map(|p| p.repaid))?;
    let total_outstanding = money_total(
        "total_outstanding",
        positions
            .iter()
            .filter(|p| p.advance.status.is_active())
            .map(|p| p.remaining()),
    )?;

    let average_amount = (total_requests > 0)
        .then(|| (total_amount_requested / Decimal::from(total_requests)).round_dp(2));

    let decided = approved_total + rejected_requests;
    let approval_rate = if decided == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(approved_total) * Decimal::ONE_HUNDRED / Decimal::from(decided)).round_dp(2)
    };

    Ok(AdvanceStatistics {
        total_requests,
        pending_requests: count(AdvanceStatus::Pending),
        approved_requests: count(AdvanceStatus::Approved),
        rejected_requests,
        paid_requests: count(AdvanceStatus::Paid),
        partially_repaid_requests: count(AdvanceStatus::PartiallyRepaid),
        fully_repaid_requests: count(AdvanceStatus::FullyRepaid),
        total_amount_requested,
        total_amount_approved,
        total_amount_repaid,
        total_outstanding,
        average_amount,
        approval_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Advance;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn position(amount: i64, status: AdvanceStatus, repaid: i64) -> LedgerPosition {
        let now = Utc::now();
        LedgerPosition {
            advance: Advance {
                id: Uuid::new_v4(),
                employee_id: Uuid::new_v4(),
                amount: Decimal::from(amount),
                reason: "school fees".to_string(),
                status,
                payment_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                monthly_deduction: None,
                repayment_date: None,
                approved_by: None,
                approved_at: None,
                rejected_by: None,
                rejected_at: None,
                rejection_reason: None,
                paid_by: None,
                paid_at: None,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
            repaid: Decimal::from(repaid),
        }
    }

    #[test]
    fn test_empty_set() {
        let stats = summarize(&[]).unwrap();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.average_amount, None);
        assert_eq!(stats.approval_rate, Decimal::ZERO);
    }

    #[test]
    fn test_mixed_set() {
        let stats = summarize(&[
            position(1000, AdvanceStatus::Pending, 0),
            position(2000, AdvanceStatus::Rejected, 0),
            position(1500, AdvanceStatus::PartiallyRepaid, 500),
            position(500, AdvanceStatus::FullyRepaid, 500),
        ])
        .unwrap();

        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.pending_requests, 1);
        assert_eq!(stats.rejected_requests, 1);
        assert_eq!(stats.partially_repaid_requests, 1);
        assert_eq!(stats.fully_repaid_requests, 1);
        assert_eq!(stats.total_amount_requested, Decimal::from(5000));
        assert_eq!(stats.total_amount_approved, Decimal::from(2000));
        assert_eq!(stats.total_amount_repaid, Decimal::from(1000));
        assert_eq!(stats.total_outstanding, Decimal::from(1000));
        assert_eq!(stats.average_amount, Some(Decimal::from(1250)));
        // 2 of 3 decided requests were approved
        assert_eq!(stats.approval_rate.to_string(), "66.67");
    }

    #[test]
    fn test_overflowing_totals_are_an_error() {
        let mut huge = position(0, AdvanceStatus::Paid, 0);
        huge.advance.amount = Decimal::MAX;
        assert!(matches!(
            summarize(&[huge.clone(), huge]),
            Err(AdvancesError::Internal)
        ));
    }
}
