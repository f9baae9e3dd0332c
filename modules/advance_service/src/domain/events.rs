/// Domain events for advance service
///
/// Every successful mutation produces one event. Events feed the audit
/// trail and downstream notifications; publishing never fails the operation.

use crate::contract::{Advance, AdvanceStatus, RepaymentEntry};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event types for advances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AdvanceEvent {
    AdvanceRequested(AdvanceChangedEvent),
    AdvanceApproved(AdvanceChangedEvent),
    AdvanceRejected(AdvanceChangedEvent),
    AdvanceDisbursed(AdvanceChangedEvent),
    AdvanceUpdated(AdvanceChangedEvent),
    AdvanceDeleted(AdvanceChangedEvent),
    RepaymentRecorded(RepaymentEvent),
    RepaymentReversed(RepaymentEvent),
}

/// Event data for advance lifecycle changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceChangedEvent {
    pub advance_id: Uuid,
    pub employee_id: Uuid,
    pub amount: Decimal,
    /// Status after the change
    pub status: String,
    /// User who performed the action
    pub actor_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Event data for ledger changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentEvent {
    pub entry_id: Uuid,
    pub advance_id: Uuid,
    pub employee_id: Uuid,
    pub amount: Decimal,
    /// Balance of the advance after the change
    pub remaining_balance: Decimal,
    /// Status of the advance after the change
    pub status: String,
    pub actor_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Event publisher trait for publishing domain events
///
/// Implementations should handle delivery, retries and routing to
/// audit/notification sinks.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: AdvanceEvent) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: AdvanceEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes every event as a structured audit log line
pub struct TracingEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: AdvanceEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&event)?;
        tracing::info!(target: "advance_service::audit", event = %payload, "{}", event.kind());
        Ok(())
    }
}

fn changed(advance: &Advance, actor_id: Uuid) -> AdvanceChangedEvent {
    AdvanceChangedEvent {
        advance_id: advance.id,
        employee_id: advance.employee_id,
        amount: advance.amount,
        status: advance.status.as_str().to_string(),
        actor_id,
        timestamp: Utc::now(),
    }
}

fn ledger(
    entry: &RepaymentEntry,
    remaining_balance: Decimal,
    status: AdvanceStatus,
    actor_id: Uuid,
) -> RepaymentEvent {
    RepaymentEvent {
        entry_id: entry.id,
        advance_id: entry.advance_id,
        employee_id: entry.employee_id,
        amount: entry.amount,
        remaining_balance,
        status: status.as_str().to_string(),
        actor_id,
        timestamp: Utc::now(),
    }
}

impl AdvanceEvent {
    pub fn requested(advance: &Advance, actor_id: Uuid) -> Self {
        Self::AdvanceRequested(changed(advance, actor_id))
    }

    pub fn approved(advance: &Advance, actor_id: Uuid) -> Self {
        Self::AdvanceApproved(changed(advance, actor_id))
    }

    pub fn rejected(advance: &Advance, actor_id: Uuid) -> Self {
        Self::AdvanceRejected(changed(advance, actor_id))
    }

    pub fn disbursed(advance: &Advance, actor_id: Uuid) -> Self {
        Self::AdvanceDisbursed(changed(advance, actor_id))
    }

    pub fn updated(advance: &Advance, actor_id: Uuid) -> Self {
        Self::AdvanceUpdated(changed(advance, actor_id))
    }

    pub fn deleted(advance: &Advance, actor_id: Uuid) -> Self {
        Self::AdvanceDeleted(changed(advance, actor_id))
    }

    pub fn repayment_recorded(
        entry: &RepaymentEntry,
        remaining_balance: Decimal,
        status: AdvanceStatus,
        actor_id: Uuid,
    ) -> Self {
        Self::RepaymentRecorded(ledger(entry, remaining_balance, status, actor_id))
    }

    pub fn repayment_reversed(
        entry: &RepaymentEntry,
        remaining_balance: Decimal,
        status: AdvanceStatus,
        actor_id: Uuid,
    ) -> Self {
        Self::RepaymentReversed(ledger(entry, remaining_balance, status, actor_id))
    }

    /// Event name as used in the serialized `event_type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdvanceRequested(_) => "advance_requested",
            Self::AdvanceApproved(_) => "advance_approved",
            Self::AdvanceRejected(_) => "advance_rejected",
            Self::AdvanceDisbursed(_) => "advance_disbursed",
            Self::AdvanceUpdated(_) => "advance_updated",
            Self::AdvanceDeleted(_) => "advance_deleted",
            Self::RepaymentRecorded(_) => "repayment_recorded",
            Self::RepaymentReversed(_) => "repayment_reversed",
        }
    }
}
