//! SeaORM repository implementations
//!
//! Advance mutations run in one transaction that locks the advance rows with
//! `SELECT ... FOR UPDATE` before the ledger sum is read. SQLite ignores the
//! lock clause, so on SQLite the repository also holds a writer mutex for the
//! whole transaction.

use crate::contract::{Advance, AdvanceFilter, Employee, RepaymentEntry};
use crate::domain::ledger::LedgerPosition;
use crate::domain::repository::{
    AdvanceMutation, AdvanceRepository, BatchMutation, DeletionGuard, EmployeeRepository, LedgerChange,
    RepaymentPlanner, RepaymentRepository, RepaymentScope, ReversalPlanner,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::entity;
use super::entity::{employee, repayment};

// ===== Employee Repository =====

pub struct SeaOrmEmployeeRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmEmployeeRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EmployeeRepository for SeaOrmEmployeeRepository {
    async fn create(&self, employee: &Employee) -> Result<Employee> {
        let active: employee::ActiveModel = employee.into();
        employee::Entity::insert(active).exec(&*self.db).await?;
        Ok(employee.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>> {
        let result = employee::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Employee::from))
    }

    async fn find_by_code(&self, employee_code: &str) -> Result<Option<Employee>> {
        let result = employee::Entity::find()
            .filter(employee::Column::EmployeeCode.eq(employee_code))
            .one(&*self.db)
            .await?;
        Ok(result.map(Employee::from))
    }
}

// ===== Advance Repository =====

pub struct SeaOrmAdvanceRepository {
    db: Arc<DatabaseConnection>,
    writer: Mutex<()>,
}

impl SeaOrmAdvanceRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            writer: Mutex::new(()),
        }
    }

    /// Held for the whole write transaction on SQLite
    ///
    /// Two deferred SQLite transactions that both read before writing fail with
    /// `SQLITE_BUSY` instead of waiting.
    async fn writer(&self) -> Option<MutexGuard<'_, ()>> {
        match self.db.get_database_backend() {
            DbBackend::Sqlite => Some(self.writer.lock().await),
            _ => None,
        }
    }
}

/// Attach the active ledger sum to each advance row
async fn with_ledger<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<entity::Model>,
) -> Result<Vec<LedgerPosition>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let entries = repayment::Entity::find()
        .filter(repayment::Column::AdvanceId.is_in(ids))
        .filter(repayment::Column::ReversedAt.is_null())
        .all(conn)
        .await?;

    let mut by_advance: HashMap<Uuid, Vec<RepaymentEntry>> = HashMap::new();
    for entry in entries {
        by_advance
            .entry(entry.advance_id)
            .or_default()
            .push(entry.into());
    }

    rows.into_iter()
        .map(|row| {
            let advance = Advance::try_from(row)?;
            let entries = by_advance.remove(&advance.id).unwrap_or_default();
            Ok(LedgerPosition::from_entries(advance, &entries))
        })
        .collect()
}

/// Lock one live advance and read its ledger sum
async fn lock_position(txn: &DatabaseTransaction, id: Uuid) -> Result<Option<LedgerPosition>> {
    let row = entity::Entity::find_by_id(id)
        .filter(entity::Column::DeletedAt.is_null())
        .lock_exclusive()
        .one(txn)
        .await?;

    match row {
        Some(row) => Ok(with_ledger(txn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Lock every live advance of an employee, oldest first
async fn lock_employee_positions(
    txn: &DatabaseTransaction,
    employee_id: Uuid,
) -> Result<Vec<LedgerPosition>> {
    let rows = entity::Entity::find()
        .filter(entity::Column::EmployeeId.eq(employee_id))
        .filter(entity::Column::DeletedAt.is_null())
        .order_by_asc(entity::Column::CreatedAt)
        .lock_exclusive()
        .all(txn)
        .await?;

    with_ledger(txn, rows).await
}

async fn store_advance(txn: &DatabaseTransaction, advance: &Advance) -> Result<()> {
    let active: entity::ActiveModel = advance.into();
    entity::Entity::update(active).exec(txn).await?;
    Ok(())
}

#[async_trait]
impl AdvanceRepository for SeaOrmAdvanceRepository {
    async fn insert(&self, advance: &Advance) -> Result<Advance> {
        let _writer = self.writer().await;
        let active: entity::ActiveModel = advance.into();
        entity::Entity::insert(active).exec(&*self.db).await?;
        Ok(advance.clone())
    }

    async fn find_position(&self, id: Uuid) -> Result<Option<LedgerPosition>> {
        let row = entity::Entity::find_by_id(id)
            .filter(entity::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?;

        match row {
            Some(row) => Ok(with_ledger(&*self.db, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_positions(&self, filter: &AdvanceFilter) -> Result<Vec<LedgerPosition>> {
        let mut query = entity::Entity::find().filter(entity::Column::DeletedAt.is_null());

        if let Some(employee_id) = filter.employee_id {
            query = query.filter(entity::Column::EmployeeId.eq(employee_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(entity::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.created_from {
            let start = from.and_time(NaiveTime::MIN).and_utc();
            query = query.filter(entity::Column::CreatedAt.gte(start));
        }
        if let Some(to) = filter.created_to {
            let end = to.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
            query = query.filter(entity::Column::CreatedAt.lt(end));
        }

        let rows = query
            .order_by_desc(entity::Column::CreatedAt)
            .order_by_asc(entity::Column::Id)
            .all(&*self.db)
            .await?;

        with_ledger(&*self.db, rows).await
    }

    async fn modify(
        &self,
        id: Uuid,
        mutation: AdvanceMutation<'_>,
    ) -> Result<Option<LedgerPosition>> {
        let _writer = self.writer().await;
        let txn = self.db.begin().await?;
        let Some(position) = lock_position(&txn, id).await? else {
            return Ok(None);
        };

        let advance = mutation(&position)?;
        store_advance(&txn, &advance).await?;
        txn.commit().await?;

        Ok(Some(LedgerPosition {
            advance,
            repaid: position.repaid,
        }))
    }

    async fn modify_employee_advances(
        &self,
        employee_id: Uuid,
        batch: BatchMutation<'_>,
    ) -> Result<Vec<LedgerPosition>> {
        let _writer = self.writer().await;
        let txn = self.db.begin().await?;
        let positions = lock_employee_positions(&txn, employee_id).await?;

        let advances = batch(&positions)?;
        let mut stored = HashSet::with_capacity(advances.len());
        let mut updated = Vec::with_capacity(advances.len());
        for advance in advances {
            let locked = positions
                .iter()
                .find(|p| p.advance.id == advance.id && p.advance.employee_id == employee_id);
            let Some(locked) = locked else {
                anyhow::bail!("advance {} is not locked for employee {}", advance.id, employee_id);
            };
            anyhow::ensure!(stored.insert(advance.id), "advance {} changed twice", advance.id);

            store_advance(&txn, &advance).await?;
            updated.push(LedgerPosition {
                advance,
                repaid: locked.repaid,
            });
        }
        txn.commit().await?;

        Ok(updated)
    }

    async fn record_repayments(
        &self,
        scope: RepaymentScope,
        planner: RepaymentPlanner<'_>,
    ) -> Result<Vec<LedgerChange>> {
        let _writer = self.writer().await;
        let txn = self.db.begin().await?;
        let positions: Vec<LedgerPosition> = match scope {
            RepaymentScope::Advance(id) => lock_position(&txn, id).await?.into_iter().collect(),
            RepaymentScope::Employee(employee_id) => {
                lock_employee_positions(&txn, employee_id).await?
            }
        };

        let changes = planner(&positions)?;
        for change in &changes {
            let parent = positions
                .iter()
                .find(|p| p.advance.id == change.entry.advance_id);
            anyhow::ensure!(
                parent.is_some_and(|p| p.advance.employee_id == change.entry.employee_id),
                "repayment {} does not match a locked advance",
                change.entry.id
            );

            let active: repayment::ActiveModel = (&change.entry).into();
            repayment::Entity::insert(active).exec(&txn).await?;
            store_advance(&txn, &change.position.advance).await?;
        }
        txn.commit().await?;

        Ok(changes)
    }

    async fn reverse_repayment(
        &self,
        entry_id: Uuid,
        planner: ReversalPlanner<'_>,
    ) -> Result<Option<LedgerChange>> {
        let _writer = self.writer().await;
        let txn = self.db.begin().await?;
        let Some(row) = repayment::Entity::find_by_id(entry_id).one(&txn).await? else {
            return Ok(None);
        };

        // Advance row first, same order as every other mutation
        let Some(position) = lock_position(&txn, row.advance_id).await? else {
            return Ok(None);
        };
        let Some(row) = repayment::Entity::find_by_id(entry_id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let change = planner(&RepaymentEntry::from(row), &position)?;
        let active: repayment::ActiveModel = (&change.entry).into();
        repayment::Entity::update(active).exec(&txn).await?;
        store_advance(&txn, &change.position.advance).await?;
        txn.commit().await?;

        Ok(Some(change))
    }

    async fn soft_delete(&self, id: Uuid, guard: DeletionGuard<'_>) -> Result<Option<Advance>> {
        let _writer = self.writer().await;
        let txn = self.db.begin().await?;
        let Some(position) = lock_position(&txn, id).await? else {
            return Ok(None);
        };

        let active_entries = repayment::Entity::find()
            .filter(repayment::Column::AdvanceId.eq(id))
            .filter(repayment::Column::ReversedAt.is_null())
            .count(&txn)
            .await?;
        guard(&position, active_entries)?;

        let now = Utc::now();
        let mut advance = position.advance;
        advance.deleted_at = Some(now);
        advance.updated_at = now;
        store_advance(&txn, &advance).await?;
        txn.commit().await?;

        Ok(Some(advance))
    }
}

// ===== Repayment Repository =====

pub struct SeaOrmRepaymentRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmRepaymentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RepaymentRepository for SeaOrmRepaymentRepository {
    async fn find_entry(&self, id: Uuid) -> Result<Option<RepaymentEntry>> {
        let result = repayment::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(RepaymentEntry::from))
    }

    async fn entries_for_advance(&self, advance_id: Uuid) -> Result<Vec<RepaymentEntry>> {
        let results = repayment::Entity::find()
            .filter(repayment::Column::AdvanceId.eq(advance_id))
            .order_by_asc(repayment::Column::CreatedAt)
            .order_by_asc(repayment::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(RepaymentEntry::from).collect())
    }

    async fn entries_for_employee(
        &self,
        employee_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<RepaymentEntry>, u64)> {
        let query = repayment::Entity::find()
            .filter(repayment::Column::EmployeeId.eq(employee_id))
            .filter(repayment::Column::ReversedAt.is_null());

        let total = query.clone().count(&*self.db).await?;
        let results = query
            .order_by_desc(repayment::Column::PaymentDate)
            .order_by_desc(repayment::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok((results.into_iter().map(RepaymentEntry::from).collect(), total))
    }
}
