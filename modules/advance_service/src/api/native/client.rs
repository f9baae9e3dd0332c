//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    AdvanceSummary, AdvancesApi, AdvancesError, Caller, EmployeeBalance, NewRepayment,
    RecordedRepayment,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Native client implementation that directly calls the domain service
///
/// Payroll runs and final settlement use this client to read balances and
/// book salary deductions without going through HTTP.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AdvancesApi for NativeClient {
    async fn get_advance(
        &self,
        employee_id: Uuid,
        advance_id: Uuid,
    ) -> Result<AdvanceSummary, AdvancesError> {
        self.service.get_advance(employee_id, advance_id).await
    }

    async fn list_employee_advances(
        &self,
        employee_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<AdvanceSummary>, AdvancesError> {
        self.service
            .list_employee_advances(employee_id, active_only)
            .await
    }

    async fn employee_balance(&self, employee_id: Uuid) -> Result<EmployeeBalance, AdvancesError> {
        self.service.employee_balance(employee_id).await
    }

    async fn record_repayment(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
        repayment: NewRepayment,
    ) -> Result<RecordedRepayment, AdvancesError> {
        self.service
            .record_repayment(caller, employee_id, advance_id, repayment)
            .await
    }
}
