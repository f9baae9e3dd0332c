//! Contract models for advance service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Employee referenced by advances (owned by the employee directory)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: Uuid,
    /// Business code printed on payslips and receipts (e.g. "EMP-0042")
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub designation: Option<String>,
    /// Monthly basic salary, used for advance eligibility checks
    pub basic_salary: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Display name used on receipts and audit lines
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Employee registration input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub designation: Option<String>,
    pub basic_salary: Option<Decimal>,
}

/// Lifecycle status of an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvanceStatus {
    /// Requested, waiting for a decision
    Pending,
    /// Approved, not yet disbursed
    Approved,
    /// Rejected by an approver (terminal)
    Rejected,
    /// Approved and disbursed to the employee
    Paid,
    /// At least one repayment recorded, balance outstanding
    PartiallyRepaid,
    /// Ledger covers the full amount (terminal)
    FullyRepaid,
}

/// Salary advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
    pub status: AdvanceStatus,
    /// Date the advance is (or was) handed out
    pub payment_date: NaiveDate,
    /// Amount withheld from each salary run
    pub monthly_deduction: Option<Decimal>,
    /// Date by which the advance is expected to be repaid
    pub repayment_date: Option<NaiveDate>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub paid_by: Option<Uuid>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Advance request input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdvance {
    pub amount: Decimal,
    pub reason: String,
    pub payment_date: NaiveDate,
    pub monthly_deduction: Option<Decimal>,
    pub repayment_date: Option<NaiveDate>,
}

/// Partial update of advance terms; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceUpdate {
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub monthly_deduction: Option<Decimal>,
    pub repayment_date: Option<NaiveDate>,
}

/// One repayment recorded against an advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentEntry {
    pub id: Uuid,
    pub advance_id: Uuid,
    pub employee_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub reversed_by: Option<Uuid>,
    pub reversed_at: Option<DateTime<Utc>>,
    pub reversal_reason: Option<String>,
}

impl RepaymentEntry {
    /// Whether the entry still counts towards the ledger sum
    pub fn is_active(&self) -> bool {
        self.reversed_at.is_none()
    }
}

/// Repayment input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepayment {
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
}

/// Advance together with its ledger-derived balances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceSummary {
    pub advance: Advance,
    pub repaid_amount: Decimal,
    pub remaining_balance: Decimal,
    /// `None` when no positive monthly deduction is configured
    pub estimated_months: Option<u32>,
}

/// Result of a repayment against a single advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRepayment {
    pub entry: RepaymentEntry,
    pub advance: AdvanceSummary,
}

/// Result of a repayment distributed over all active advances of an employee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRepayment {
    pub entries: Vec<RepaymentEntry>,
    pub balance: EmployeeBalance,
}

/// Outstanding advance position of one employee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeBalance {
    pub employee_id: Uuid,
    pub active_advances: Vec<AdvanceSummary>,
    pub total_remaining: Decimal,
    pub total_monthly_deduction: Decimal,
    pub estimated_months: Option<u32>,
    /// Amount a final settlement has to withhold for open advances
    pub settlement_deduction: Decimal,
}

/// Repayments of one calendar month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRepayments {
    /// `YYYY-MM`
    pub month: String,
    /// Human readable label, e.g. "March 2024"
    pub label: String,
    pub total_amount: Decimal,
    pub payments: Vec<RepaymentEntry>,
}

/// One page of an employee's repayment history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub months: Vec<MonthlyRepayments>,
    pub page: u64,
    pub per_page: u64,
    pub total_entries: u64,
}

/// Filter for advance listings and statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceFilter {
    pub employee_id: Option<Uuid>,
    pub status: Option<AdvanceStatus>,
    /// Inclusive lower bound on the request date
    pub created_from: Option<NaiveDate>,
    /// Inclusive upper bound on the request date
    pub created_to: Option<NaiveDate>,
}

/// Aggregate figures over a set of advances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceStatistics {
    pub total_requests: u64,
    pub pending_requests: u64,
    pub approved_requests: u64,
    pub rejected_requests: u64,
    pub paid_requests: u64,
    pub partially_repaid_requests: u64,
    pub fully_repaid_requests: u64,
    pub total_amount_requested: Decimal,
    pub total_amount_approved: Decimal,
    pub total_amount_repaid: Decimal,
    pub total_outstanding: Decimal,
    pub average_amount: Option<Decimal>,
    /// Percentage of decided requests that were approved
    pub approval_rate: Decimal,
}

/// Company block printed on receipts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// Authenticated caller, supplied by the outer authentication layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    /// Admins may edit or delete advances past `pending` and reverse repayments
    pub is_admin: bool,
}

impl Caller {
    /// Create a regular (non-admin) caller
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// Create an admin caller
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}
