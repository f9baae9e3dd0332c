//! Advance status state machine
//!
//! ```text
//! pending ──approve──▶ approved ──disburse──▶ paid
//!    │                    │                    │
//!  reject              repay                 repay
//!    ▼                    ▼                    ▼
//! rejected        partially_repaid ◀──────────┘
//!                    │        ▲
//!                  repay   reverse
//!                    ▼        │
//!                  fully_repaid
//! ```
//!
//! Reversing the last active repayment returns the advance to `paid` when it
//! was disbursed and to `approved` otherwise.

use crate::contract::{AdvanceStatus, AdvancesError};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Event applied to an advance status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject,
    Disburse,
    /// A repayment was booked; `outstanding` is the balance after booking it
    Repay { outstanding: Decimal },
    /// A repayment was reversed; figures are after the reversal
    Reverse {
        repaid: Decimal,
        outstanding: Decimal,
        disbursed: bool,
    },
}

impl Transition {
    fn action(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Disburse => "disburse",
            Self::Repay { .. } => "record a repayment against",
            Self::Reverse { .. } => "reverse a repayment of",
        }
    }
}

impl AdvanceStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [AdvanceStatus; 6] = [
        AdvanceStatus::Pending,
        AdvanceStatus::Approved,
        AdvanceStatus::Rejected,
        AdvanceStatus::Paid,
        AdvanceStatus::PartiallyRepaid,
        AdvanceStatus::FullyRepaid,
    ];

    /// Apply a transition, rejecting moves the lifecycle does not allow
    pub fn apply(self, transition: Transition) -> Result<AdvanceStatus, AdvancesError> {
        use AdvanceStatus::*;

        let next = match (self, transition) {
            (Pending, Transition::Approve) => Some(Approved),
            (Pending, Transition::Reject) => Some(Rejected),
            (Approved, Transition::Disburse) => Some(Paid),
            (Approved | Paid | PartiallyRepaid, Transition::Repay { outstanding }) => {
                if outstanding <= Decimal::ZERO {
                    Some(FullyRepaid)
                } else {
                    Some(PartiallyRepaid)
                }
            }
            (
                PartiallyRepaid | FullyRepaid,
                Transition::Reverse {
                    repaid,
                    outstanding,
                    disbursed,
                },
            ) => {
                if repaid <= Decimal::ZERO {
                    Some(if disbursed { Paid } else { Approved })
                } else if outstanding <= Decimal::ZERO {
                    Some(FullyRepaid)
                } else {
                    Some(PartiallyRepaid)
                }
            }
            _ => None,
        };

        next.ok_or_else(|| AdvancesError::InvalidTransition {
            status: self,
            action: transition.action().to_string(),
        })
    }

    /// Approved and not yet fully repaid
    pub fn is_active(self) -> bool {
        matches!(
            self,
            AdvanceStatus::Approved | AdvanceStatus::Paid | AdvanceStatus::PartiallyRepaid
        )
    }

    /// Whether new repayments may be booked
    pub fn accepts_repayment(self) -> bool {
        self.is_active()
    }

    /// Whether the lifecycle has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, AdvanceStatus::Rejected | AdvanceStatus::FullyRepaid)
    }

    /// Wire and storage representation
    pub fn as_str(self) -> &'static str {
        match self {
            AdvanceStatus::Pending => "pending",
            AdvanceStatus::Approved => "approved",
            AdvanceStatus::Rejected => "rejected",
            AdvanceStatus::Paid => "paid",
            AdvanceStatus::PartiallyRepaid => "partially_repaid",
            AdvanceStatus::FullyRepaid => "fully_repaid",
        }
    }
}

impl fmt::Display for AdvanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvanceStatus {
    type Err = AdvancesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdvanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AdvancesError::invalid("status", format!("unknown status '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AdvanceStatus::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_pending_can_be_approved_or_rejected() {
        assert_eq!(Pending.apply(Transition::Approve).unwrap(), Approved);
        assert_eq!(Pending.apply(Transition::Reject).unwrap(), Rejected);
    }

    #[test]
    fn test_decisions_happen_once() {
        for status in [Approved, Rejected, Paid, PartiallyRepaid, FullyRepaid] {
            assert!(status.apply(Transition::Approve).is_err(), "{status} approved");
            assert!(status.apply(Transition::Reject).is_err(), "{status} rejected");
        }
    }

    #[test]
    fn test_rejected_cannot_be_reapproved() {
        let err = Rejected.apply(Transition::Approve).unwrap_err();
        assert_eq!(
            err,
            AdvancesError::InvalidTransition {
                status: Rejected,
                action: "approve".to_string(),
            }
        );
    }

    #[test]
    fn test_only_approved_can_be_disbursed() {
        assert_eq!(Approved.apply(Transition::Disburse).unwrap(), Paid);
        for status in [Pending, Rejected, Paid, PartiallyRepaid, FullyRepaid] {
            assert!(status.apply(Transition::Disburse).is_err());
        }
    }

    #[test]
    fn test_repayment_moves_to_partial_or_full() {
        let partial = Transition::Repay { outstanding: dec(700) };
        let full = Transition::Repay { outstanding: dec(0) };

        assert_eq!(Approved.apply(partial).unwrap(), PartiallyRepaid);
        assert_eq!(Paid.apply(partial).unwrap(), PartiallyRepaid);
        assert_eq!(PartiallyRepaid.apply(partial).unwrap(), PartiallyRepaid);
        assert_eq!(PartiallyRepaid.apply(full).unwrap(), FullyRepaid);
        assert_eq!(Approved.apply(full).unwrap(), FullyRepaid);
    }

    #[test]
    fn test_repayment_rejected_outside_active_states() {
        let repay = Transition::Repay { outstanding: dec(100) };
        for status in [Pending, Rejected, FullyRepaid] {
            assert!(matches!(
                status.apply(repay),
                Err(AdvancesError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_reversal_restores_pre_repayment_status() {
        let to_zero = |disbursed| Transition::Reverse {
            repaid: dec(0),
            outstanding: dec(1000),
            disbursed,
        };
        assert_eq!(PartiallyRepaid.apply(to_zero(false)).unwrap(), Approved);
        assert_eq!(FullyRepaid.apply(to_zero(true)).unwrap(), Paid);

        let partial = Transition::Reverse {
            repaid: dec(300),
            outstanding: dec(700),
            disbursed: false,
        };
        assert_eq!(FullyRepaid.apply(partial).unwrap(), PartiallyRepaid);
        assert!(Approved.apply(partial).is_err());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in AdvanceStatus::ALL {
            assert_eq!(status.as_str().parse::<AdvanceStatus>().unwrap(), status);
        }
        assert!("active".parse::<AdvanceStatus>().is_err());
    }

    #[test]
    fn test_active_and_terminal_sets() {
        assert!(Approved.is_active());
        assert!(Paid.accepts_repayment());
        assert!(!Pending.is_active());
        assert!(Rejected.is_terminal());
        assert!(FullyRepaid.is_terminal());
        assert!(!PartiallyRepaid.is_terminal());
    }
}
