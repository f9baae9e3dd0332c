//! Advance Service Module
//!
//! Salary advances for employees: request, approval workflow, disbursement
//! and an append-only repayment ledger from which every balance is derived.

// Public exports
pub mod contract;
pub use contract::{
    client::AdvancesApi, error::AdvancesError, Advance, AdvanceStatus, AdvanceSummary, Caller,
    Employee, EmployeeBalance, NewRepayment, RepaymentEntry,
};

pub mod config;
pub use config::Config;

pub mod module;
pub use module::AdvancesModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
