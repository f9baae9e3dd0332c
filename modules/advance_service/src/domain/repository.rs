//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs
//!
//! Mutating advance operations take a decision closure. The repository opens a
//! transaction, locks the affected advance rows, recomputes the ledger sum and
//! hands the locked state to the closure. When the closure returns an
//! [`AdvancesError`] the transaction is rolled back and the error is returned
//! inside the `anyhow::Error`.

use super::ledger::LedgerPosition;
use crate::contract::{Advance, AdvanceFilter, AdvancesError, Employee, RepaymentEntry};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Decision applied to one locked advance; returns the advance to store
pub type AdvanceMutation<'a> =
    &'a (dyn Fn(&LedgerPosition) -> Result<Advance, AdvancesError> + Send + Sync);

/// Decision applied to every locked advance of an employee; returns the advances to store
pub type BatchMutation<'a> =
    &'a (dyn Fn(&[LedgerPosition]) -> Result<Vec<Advance>, AdvancesError> + Send + Sync);

/// Plans ledger entries for the locked advances of a [`RepaymentScope`]
pub type RepaymentPlanner<'a> =
    &'a (dyn Fn(&[LedgerPosition]) -> Result<Vec<LedgerChange>, AdvancesError> + Send + Sync);

/// Plans the reversal of a locked entry given its advance position before the reversal
pub type ReversalPlanner<'a> = &'a (dyn Fn(&RepaymentEntry, &LedgerPosition) -> Result<LedgerChange, AdvancesError>
    + Send
    + Sync);

/// Vetoes a deletion; receives the locked advance and its number of active entries
pub type DeletionGuard<'a> =
    &'a (dyn Fn(&LedgerPosition, u64) -> Result<(), AdvancesError> + Send + Sync);

/// Advances locked for a repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaymentScope {
    /// A single advance
    Advance(Uuid),
    /// Every non-deleted advance of an employee
    Employee(Uuid),
}

/// A ledger entry to write together with the resulting advance position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerChange {
    pub entry: RepaymentEntry,
    pub position: LedgerPosition,
}

/// Repository for employees
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Create a new employee
    async fn create(&self, employee: &Employee) -> Result<Employee>;

    /// Find an employee by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>>;

    /// Find an employee by business code
    async fn find_by_code(&self, employee_code: &str) -> Result<Option<Employee>>;
}

/// Repository for advances; every method ignores soft-deleted rows
#[async_trait]
pub trait AdvanceRepository: Send + Sync {
    /// Insert a new advance
    async fn insert(&self, advance: &Advance) -> Result<Advance>;

    /// Load an advance with its ledger sum
    async fn find_position(&self, id: Uuid) -> Result<Option<LedgerPosition>>;

    /// Load advances matching `filter`, newest first
    async fn list_positions(&self, filter: &AdvanceFilter) -> Result<Vec<LedgerPosition>>;

    /// Lock an advance, apply `mutation` and store its result
    ///
    /// Returns `None` when the advance does not exist.
    async fn modify(
        &self,
        id: Uuid,
        mutation: AdvanceMutation<'_>,
    ) -> Result<Option<LedgerPosition>>;

    /// Lock every advance of an employee, apply `batch` and store all of its results
    ///
    /// Nothing is written when `batch` fails.
    async fn modify_employee_advances(
        &self,
        employee_id: Uuid,
        batch: BatchMutation<'_>,
    ) -> Result<Vec<LedgerPosition>>;

    /// Lock the advances in `scope`, plan entries with `planner` and write them
    async fn record_repayments(
        &self,
        scope: RepaymentScope,
        planner: RepaymentPlanner<'_>,
    ) -> Result<Vec<LedgerChange>>;

    /// Lock an entry and its advance, plan the reversal and write it
    ///
    /// Returns `None` when the entry does not exist.
    async fn reverse_repayment(
        &self,
        entry_id: Uuid,
        planner: ReversalPlanner<'_>,
    ) -> Result<Option<LedgerChange>>;

    /// Soft delete an advance unless `guard` objects
    ///
    /// Returns `None` when the advance does not exist.
    async fn soft_delete(&self, id: Uuid, guard: DeletionGuard<'_>) -> Result<Option<Advance>>;
}

/// Read access to the repayment ledger
#[async_trait]
pub trait RepaymentRepository: Send + Sync {
    /// Find an entry by id (reversed entries included)
    async fn find_entry(&self, id: Uuid) -> Result<Option<RepaymentEntry>>;

    /// All entries of an advance in booking order (reversed entries included)
    async fn entries_for_advance(&self, advance_id: Uuid) -> Result<Vec<RepaymentEntry>>;

    /// Active entries of an employee, newest payment first, with the total count
    async fn entries_for_employee(
        &self,
        employee_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<RepaymentEntry>, u64)>;
}
