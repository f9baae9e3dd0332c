//! Domain layer - business logic and services

pub mod events;
pub mod history;
pub mod ledger;
pub mod receipt;
pub mod repository;
pub mod service;
pub mod statistics;
pub mod status;
pub mod validation;

pub use events::{AdvanceEvent, EventPublisher, NoOpEventPublisher, TracingEventPublisher};
pub use ledger::LedgerPosition;
pub use receipt::Receipt;
pub use repository::{AdvanceRepository, EmployeeRepository, RepaymentRepository};
pub use service::{Service, ServiceOptions};
pub use status::Transition;
