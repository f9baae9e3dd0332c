//! Common test utilities: in-memory repositories and fixtures
#![allow(dead_code)]

use advance_service::contract::*;
use advance_service::domain::events::{AdvanceEvent, EventPublisher};
use advance_service::domain::ledger::LedgerPosition;
use advance_service::domain::repository::{
    AdvanceMutation, AdvanceRepository, BatchMutation, DeletionGuard, EmployeeRepository, LedgerChange,
    RepaymentPlanner, RepaymentRepository, RepaymentScope, ReversalPlanner,
};
use advance_service::domain::{Service, ServiceOptions};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub fn print_test_header(test_name: &str, purpose: &str) {
    println!("\n🧪 TEST: {}", test_name);
    println!("📋 PURPOSE: {}", purpose);
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ===== In-memory storage =====

#[derive(Default)]
struct Store {
    employees: HashMap<Uuid, Employee>,
    advances: HashMap<Uuid, Advance>,
    entries: Vec<RepaymentEntry>,
    /// Committed advance mutations (single or batch)
    commits: usize,
}

impl Store {
    fn live_advance(&self, id: Uuid) -> Option<&Advance> {
        self.advances.get(&id).filter(|a| a.deleted_at.is_none())
    }

    fn position(&self, advance: &Advance) -> LedgerPosition {
        LedgerPosition::from_entries(
            advance.clone(),
            self.entries.iter().filter(|e| e.advance_id == advance.id),
        )
    }
}

/// One lock over all tables, so every repository call is atomic like a transaction
#[derive(Clone, Default)]
pub struct MockDb {
    store: Arc<Mutex<Store>>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_count(&self) -> usize {
        self.store.lock().commits
    }

    pub fn entry_count(&self) -> usize {
        self.store.lock().entries.len()
    }

    /// Raw advance row, soft-deleted rows included
    pub fn raw_advance(&self, id: Uuid) -> Option<Advance> {
        self.store.lock().advances.get(&id).cloned()
    }

    /// Shift the request timestamp of an advance (for date filters)
    pub fn backdate(&self, id: Uuid, created_at: chrono::DateTime<Utc>) {
        if let Some(advance) = self.store.lock().advances.get_mut(&id) {
            advance.created_at = created_at;
        }
    }
}

#[async_trait]
impl EmployeeRepository for MockDb {
    async fn create(&self, employee: &Employee) -> anyhow::Result<Employee> {
        self.store
            .lock()
            .employees
            .insert(employee.id, employee.clone());
        Ok(employee.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Employee>> {
        Ok(self.store.lock().employees.get(&id).cloned())
    }

    async fn find_by_code(&self, employee_code: &str) -> anyhow::Result<Option<Employee>> {
        Ok(self
            .store
            .lock()
            .employees
            .values()
            .find(|e| e.employee_code == employee_code)
            .cloned())
    }
}

#[async_trait]
impl AdvanceRepository for MockDb {
    async fn insert(&self, advance: &Advance) -> anyhow::Result<Advance> {
        self.store
            .lock()
            .advances
            .insert(advance.id, advance.clone());
        Ok(advance.clone())
    }

    async fn find_position(&self, id: Uuid) -> anyhow::Result<Option<LedgerPosition>> {
        let store = self.store.lock();
        Ok(store.live_advance(id).map(|a| store.position(a)))
    }

    async fn list_positions(&self, filter: &AdvanceFilter) -> anyhow::Result<Vec<LedgerPosition>> {
        let store = self.store.lock();
        let mut advances: Vec<&Advance> = store
            .advances
            .values()
            .filter(|a| a.deleted_at.is_none())
            .filter(|a| filter.employee_id.map_or(true, |id| a.employee_id == id))
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .filter(|a| {
                filter
                    .created_from
                    .map_or(true, |from| a.created_at.date_naive() >= from)
            })
            .filter(|a| {
                filter
                    .created_to
                    .map_or(true, |to| a.created_at.date_naive() <= to)
            })
            .collect();
        advances.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(advances.into_iter().map(|a| store.position(a)).collect())
    }

    async fn modify(
        &self,
        id: Uuid,
        mutation: AdvanceMutation<'_>,
    ) -> anyhow::Result<Option<LedgerPosition>> {
        let mut store = self.store.lock();
        let Some(position) = store.live_advance(id).map(|a| store.position(a)) else {
            return Ok(None);
        };

        let advance = mutation(&position)?;
        store.advances.insert(advance.id, advance.clone());
        store.commits += 1;
        Ok(Some(LedgerPosition {
            advance,
            repaid: position.repaid,
        }))
    }

    async fn modify_employee_advances(
        &self,
        employee_id: Uuid,
        batch: BatchMutation<'_>,
    ) -> anyhow::Result<Vec<LedgerPosition>> {
        let mut store = self.store.lock();
        let mut advances: Vec<&Advance> = store
            .advances
            .values()
            .filter(|a| a.deleted_at.is_none() && a.employee_id == employee_id)
            .collect();
        advances.sort_by_key(|a| a.created_at);
        let positions: Vec<LedgerPosition> =
            advances.into_iter().map(|a| store.position(a)).collect();

        let changed = batch(&positions)?;
        let mut updated = Vec::with_capacity(changed.len());
        for advance in changed {
            let Some(locked) = positions.iter().find(|p| p.advance.id == advance.id) else {
                anyhow::bail!("advance {} is not locked for employee {}", advance.id, employee_id);
            };
            updated.push(LedgerPosition {
                advance,
                repaid: locked.repaid,
            });
        }
        for position in &updated {
            store
                .advances
                .insert(position.advance.id, position.advance.clone());
        }
        store.commits += 1;
        Ok(updated)
    }

    async fn record_repayments(
        &self,
        scope: RepaymentScope,
        planner: RepaymentPlanner<'_>,
    ) -> anyhow::Result<Vec<LedgerChange>> {
        let mut store = self.store.lock();
        let positions: Vec<LedgerPosition> = match scope {
            RepaymentScope::Advance(id) => store
                .live_advance(id)
                .map(|a| store.position(a))
                .into_iter()
                .collect(),
            RepaymentScope::Employee(employee_id) => {
                let mut advances: Vec<&Advance> = store
                    .advances
                    .values()
                    .filter(|a| a.deleted_at.is_none() && a.employee_id == employee_id)
                    .collect();
                advances.sort_by_key(|a| a.created_at);
                advances.into_iter().map(|a| store.position(a)).collect()
            }
        };

        let changes = planner(&positions)?;
        for change in &changes {
            store.entries.push(change.entry.clone());
            store
                .advances
                .insert(change.position.advance.id, change.position.advance.clone());
        }
        Ok(changes)
    }

    async fn reverse_repayment(
        &self,
        entry_id: Uuid,
        planner: ReversalPlanner<'_>,
    ) -> anyhow::Result<Option<LedgerChange>> {
        let mut store = self.store.lock();
        let Some(entry) = store.entries.iter().find(|e| e.id == entry_id).cloned() else {
            return Ok(None);
        };
        let Some(position) = store
            .live_advance(entry.advance_id)
            .map(|a| store.position(a))
        else {
            return Ok(None);
        };

        let change = planner(&entry, &position)?;
        if let Some(slot) = store.entries.iter_mut().find(|e| e.id == entry_id) {
            *slot = change.entry.clone();
        }
        store
            .advances
            .insert(change.position.advance.id, change.position.advance.clone());
        Ok(Some(change))
    }

    async fn soft_delete(
        &self,
        id: Uuid,
        guard: DeletionGuard<'_>,
    ) -> anyhow::Result<Option<Advance>> {
        let mut store = self.store.lock();
        let Some(position) = store.live_advance(id).map(|a| store.position(a)) else {
            return Ok(None);
        };
        let active_entries = store
            .entries
            .iter()
            .filter(|e| e.advance_id == id && e.is_active())
            .count() as u64;
        guard(&position, active_entries)?;

        let now = Utc::now();
        let mut advance = position.advance;
        advance.deleted_at = Some(now);
        advance.updated_at = now;
        store.advances.insert(id, advance.clone());
        Ok(Some(advance))
    }
}

#[async_trait]
impl RepaymentRepository for MockDb {
    async fn find_entry(&self, id: Uuid) -> anyhow::Result<Option<RepaymentEntry>> {
        Ok(self
            .store
            .lock()
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn entries_for_advance(&self, advance_id: Uuid) -> anyhow::Result<Vec<RepaymentEntry>> {
        let mut entries: Vec<RepaymentEntry> = self
            .store
            .lock()
            .entries
            .iter()
            .filter(|e| e.advance_id == advance_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    async fn entries_for_employee(
        &self,
        employee_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<(Vec<RepaymentEntry>, u64)> {
        let mut entries: Vec<RepaymentEntry> = self
            .store
            .lock()
            .entries
            .iter()
            .filter(|e| e.employee_id == employee_id && e.is_active())
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.payment_date
                .cmp(&a.payment_date)
                .then(b.created_at.cmp(&a.created_at))
        });

        let total = entries.len() as u64;
        let page = entries
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }
}

// ===== Event capture =====

/// Collects published events; can be told to fail every publish
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AdvanceEvent>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(AdvanceEvent::kind).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: AdvanceEvent) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("event bus unavailable");
        }
        self.events.lock().push(event);
        Ok(())
    }
}

// ===== Service fixtures =====

pub struct TestEnv {
    pub service: Arc<Service>,
    pub db: MockDb,
    pub events: Arc<RecordingPublisher>,
    pub clerk: Caller,
    pub manager: Caller,
    pub admin: Caller,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_options(ServiceOptions::default())
    }

    pub fn with_options(options: ServiceOptions) -> Self {
        Self::build(options, Arc::new(RecordingPublisher::default()))
    }

    pub fn build(options: ServiceOptions, events: Arc<RecordingPublisher>) -> Self {
        let db = MockDb::new();
        let service = Arc::new(Service::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            events.clone(),
            options,
        ));
        Self {
            service,
            db,
            events,
            clerk: Caller::user(Uuid::new_v4()),
            manager: Caller::user(Uuid::new_v4()),
            admin: Caller::admin(Uuid::new_v4()),
        }
    }

    /// Register an employee with the given monthly salary
    pub async fn employee(&self, code: &str, salary: Option<&str>) -> Employee {
        self.service
            .register_employee(NewEmployee {
                employee_code: code.to_string(),
                first_name: "Omar".to_string(),
                last_name: "Haddad".to_string(),
                designation: Some("Storekeeper".to_string()),
                basic_salary: salary.map(dec),
            })
            .await
            .unwrap()
    }

    pub async fn request(
        &self,
        employee_id: Uuid,
        amount: &str,
        deduction: Option<&str>,
    ) -> AdvanceSummary {
        self.service
            .request_advance(self.clerk, employee_id, new_advance(amount, deduction))
            .await
            .unwrap()
    }

    /// Request, approve and disburse an advance
    pub async fn disbursed(
        &self,
        employee_id: Uuid,
        amount: &str,
        deduction: Option<&str>,
    ) -> AdvanceSummary {
        let advance = self.request(employee_id, amount, deduction).await;
        self.service
            .approve_advance(self.manager, employee_id, advance.advance.id)
            .await
            .unwrap();
        self.service
            .disburse_advance(self.manager, employee_id, advance.advance.id)
            .await
            .unwrap()
    }

    pub async fn repay(
        &self,
        employee_id: Uuid,
        advance_id: Uuid,
        amount: &str,
    ) -> Result<RecordedRepayment, AdvancesError> {
        self.service
            .record_repayment(
                self.clerk,
                employee_id,
                advance_id,
                repayment(amount, date(2024, 3, 15)),
            )
            .await
    }
}

pub fn new_advance(amount: &str, deduction: Option<&str>) -> NewAdvance {
    NewAdvance {
        amount: dec(amount),
        reason: "Family emergency".to_string(),
        payment_date: date(2024, 3, 1),
        monthly_deduction: deduction.map(dec),
        repayment_date: None,
    }
}

pub fn repayment(amount: &str, payment_date: NaiveDate) -> NewRepayment {
    NewRepayment {
        amount: dec(amount),
        payment_date,
        notes: None,
    }
}
