//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::AdvancesApi;
pub use error::{AdvancesError, FieldViolation};
pub use model::{
    Advance, AdvanceFilter, AdvanceStatistics, AdvanceStatus, AdvanceSummary, AdvanceUpdate,
    Caller, CompanyProfile, Employee, EmployeeBalance, EmployeeRepayment, HistoryPage,
    MonthlyRepayments, NewAdvance, NewEmployee, NewRepayment, RecordedRepayment, RepaymentEntry,
};
