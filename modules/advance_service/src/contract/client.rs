//! Native client trait for inter-module communication
//!
//! Payroll and final settlement use this API to read outstanding balances
//! and to record salary deductions as repayments. NO HTTP - direct function calls.

use super::{
    error::AdvancesError,
    model::{AdvanceSummary, Caller, EmployeeBalance, NewRepayment, RecordedRepayment},
};
use async_trait::async_trait;
use uuid::Uuid;

/// Advance service API for inter-module communication
#[async_trait]
pub trait AdvancesApi: Send + Sync {
    /// Get an advance with its ledger-derived balances
    async fn get_advance(
        &self,
        employee_id: Uuid,
        advance_id: Uuid,
    ) -> Result<AdvanceSummary, AdvancesError>;

    /// List advances of an employee, optionally only those still being repaid
    async fn list_employee_advances(
        &self,
        employee_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<AdvanceSummary>, AdvancesError>;

    /// Outstanding position of an employee (payroll deductions, final settlement)
    async fn employee_balance(&self, employee_id: Uuid) -> Result<EmployeeBalance, AdvancesError>;

    /// Record a salary deduction against a specific advance
    async fn record_repayment(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
        repayment: NewRepayment,
    ) -> Result<RecordedRepayment, AdvancesError>;
}
