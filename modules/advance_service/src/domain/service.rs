//! Domain service - business logic orchestration

use super::events::{AdvanceEvent, EventPublisher};
use super::history::group_by_month;
use super::ledger::{allocate, estimated_months, money_total, remaining_balance, LedgerPosition};
use super::receipt::{format_money, Receipt};
use super::repository::{
    AdvanceRepository, EmployeeRepository, LedgerChange, RepaymentRepository, RepaymentScope,
};
use super::statistics::summarize;
use super::status::Transition;
use super::validation::{self, Violations, MAX_REASON_LEN};
use crate::contract::{
    Advance, AdvanceFilter, AdvanceStatistics, AdvanceStatus, AdvanceSummary, AdvanceUpdate,
    AdvancesError, Caller, CompanyProfile, Employee, EmployeeBalance, EmployeeRepayment,
    HistoryPage, NewAdvance, NewEmployee, NewRepayment, RecordedRepayment, RepaymentEntry,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Business rules the service is configured with
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// ISO currency code printed on receipts and messages
    pub currency: String,
    pub company: CompanyProfile,
    pub history_page_size: u64,
    pub max_history_page_size: u64,
    /// Cap on `pending + outstanding + requested` as a share of basic salary
    pub max_outstanding_salary_ratio: Option<Decimal>,
    /// Employee-level repayments must cover the monthly deduction
    pub enforce_minimum_repayment: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            currency: "SAR".to_string(),
            company: CompanyProfile::default(),
            history_page_size: 10,
            max_history_page_size: 100,
            max_outstanding_salary_ratio: Some(Decimal::new(5, 1)),
            enforce_minimum_repayment: true,
        }
    }
}

/// Domain service for advances and their repayment ledger
pub struct Service {
    employee_repo: Arc<dyn EmployeeRepository>,
    advance_repo: Arc<dyn AdvanceRepository>,
    repayment_repo: Arc<dyn RepaymentRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    options: ServiceOptions,
}

/// Recover a domain decision made inside a repository transaction; anything else is internal
fn storage_error(err: anyhow::Error) -> AdvancesError {
    match err.downcast::<AdvancesError>() {
        Ok(domain) => domain,
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "advance storage operation failed");
            AdvancesError::Internal
        }
    }
}

/// Clone the locked advance if it belongs to `employee_id`
fn owned_advance(position: &LedgerPosition, employee_id: Uuid) -> Result<Advance, AdvancesError> {
    if position.advance.employee_id != employee_id {
        return Err(AdvancesError::not_found("advance", position.advance.id));
    }
    Ok(position.advance.clone())
}

/// Book `amount` against a locked position
fn book(
    position: &LedgerPosition,
    amount: Decimal,
    repayment: &NewRepayment,
    caller: Caller,
    now: DateTime<Utc>,
    currency: &str,
) -> Result<LedgerChange, AdvancesError> {
    let mut advance = position.advance.clone();
    let repaid = position.repaid + amount;
    advance.status = advance.status.apply(Transition::Repay {
        outstanding: remaining_balance(advance.amount, repaid),
    })?;
    if amount > position.remaining() {
        return Err(AdvancesError::invalid(
            "amount",
            format!(
                "must not exceed the remaining balance of {}",
                format_money(currency, position.remaining())
            ),
        ));
    }
    advance.updated_at = now;

    let entry = RepaymentEntry {
        id: Uuid::new_v4(),
        advance_id: advance.id,
        employee_id: advance.employee_id,
        amount,
        payment_date: repayment.payment_date,
        notes: repayment.notes.clone(),
        recorded_by: caller.user_id,
        created_at: now,
        reversed_by: None,
        reversed_at: None,
        reversal_reason: None,
    };

    Ok(LedgerChange {
        entry,
        position: LedgerPosition { advance, repaid },
    })
}

impl Service {
    /// Create a new service instance
    pub fn new(
        employee_repo: Arc<dyn EmployeeRepository>,
        advance_repo: Arc<dyn AdvanceRepository>,
        repayment_repo: Arc<dyn RepaymentRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            employee_repo,
            advance_repo,
            repayment_repo,
            event_publisher,
            options,
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    // ===== Employee Operations =====

    /// Register an employee; the business code must be unique
    pub async fn register_employee(&self, new: NewEmployee) -> Result<Employee, AdvancesError> {
        validation::validate_new_employee(&new)?;

        let existing = self
            .employee_repo
            .find_by_code(&new.employee_code)
            .await
            .map_err(storage_error)?;
        if existing.is_some() {
            return Err(AdvancesError::Conflict {
                reason: format!("Employee code already in use: {}", new.employee_code),
            });
        }

        let employee = Employee {
            id: Uuid::new_v4(),
            employee_code: new.employee_code,
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            designation: new.designation,
            basic_salary: new.basic_salary,
            created_at: Utc::now(),
        };
        let employee = self
            .employee_repo
            .create(&employee)
            .await
            .map_err(storage_error)?;

        tracing::info!(employee_id = %employee.id, code = %employee.employee_code, "employee registered");
        Ok(employee)
    }

    /// Get an employee by id
    pub async fn get_employee(&self, employee_id: Uuid) -> Result<Employee, AdvancesError> {
        self.employee_repo
            .find_by_id(employee_id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| AdvancesError::not_found("employee", employee_id))
    }

    // ===== Advance Operations =====

    /// Request a new advance; it starts out pending
    pub async fn request_advance(
        &self,
        caller: Caller,
        employee_id: Uuid,
        new: NewAdvance,
    ) -> Result<AdvanceSummary, AdvancesError> {
        validation::validate_new_advance(&new)?;
        let employee = self.get_employee(employee_id).await?;
        self.check_eligibility(&employee, new.amount).await?;

        let now = Utc::now();
        let advance = Advance {
            id: Uuid::new_v4(),
            employee_id,
            amount: new.amount,
            reason: new.reason.trim().to_string(),
            status: AdvanceStatus::Pending,
            payment_date: new.payment_date,
            monthly_deduction: new.monthly_deduction,
            repayment_date: new.repayment_date,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            paid_by: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let advance = self
            .advance_repo
            .insert(&advance)
            .await
            .map_err(storage_error)?;

        tracing::info!(
            advance_id = %advance.id,
            employee_id = %employee_id,
            amount = %advance.amount,
            actor = %caller.user_id,
            "advance requested"
        );
        self.publish(AdvanceEvent::requested(&advance, caller.user_id))
            .await;

        Ok(LedgerPosition {
            advance,
            repaid: Decimal::ZERO,
        }
        .summary())
    }

    /// Pending amounts plus outstanding balances must stay within the salary share
    async fn check_eligibility(
        &self,
        employee: &Employee,
        amount: Decimal,
    ) -> Result<(), AdvancesError> {
        let (Some(salary), Some(ratio)) =
            (employee.basic_salary, self.options.max_outstanding_salary_ratio)
        else {
            return Ok(());
        };

        let positions = self
            .advance_repo
            .list_positions(&AdvanceFilter {
                employee_id: Some(employee.id),
                ..Default::default()
            })
            .await
            .map_err(storage_error)?;
        let committed = money_total(
            "committed",
            positions.iter().map(|p| match p.advance.status {
                AdvanceStatus::Pending => p.advance.amount,
                status if status.is_active() => p.remaining(),
                _ => Decimal::ZERO,
            }),
        )?;

        let limit = salary.saturating_mul(ratio).round_dp(2);
        if committed.saturating_add(amount) > limit {
            tracing::debug!(
                employee_id = %employee.id,
                %committed,
                %amount,
                %limit,
                "advance request exceeds eligibility limit"
            );
            return Err(AdvancesError::invalid(
                "amount",
                format!(
                    "exceeds the advance limit of {} ({} already committed)",
                    format_money(&self.options.currency, limit),
                    format_money(&self.options.currency, committed)
                ),
            ));
        }
        Ok(())
    }

    /// Get an advance with its balances
    pub async fn get_advance(
        &self,
        employee_id: Uuid,
        advance_id: Uuid,
    ) -> Result<AdvanceSummary, AdvancesError> {
        self.find_owned_position(employee_id, advance_id)
            .await
            .map(|position| position.summary())
    }

    async fn find_owned_position(
        &self,
        employee_id: Uuid,
        advance_id: Uuid,
    ) -> Result<LedgerPosition, AdvancesError> {
        self.advance_repo
            .find_position(advance_id)
            .await
            .map_err(storage_error)?
            .filter(|position| position.advance.employee_id == employee_id)
            .ok_or_else(|| AdvancesError::not_found("advance", advance_id))
    }

    /// List advances of an employee, newest first
    pub async fn list_employee_advances(
        &self,
        employee_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<AdvanceSummary>, AdvancesError> {
        self.get_employee(employee_id).await?;
        let positions = self.employee_positions(employee_id).await?;

        Ok(positions
            .iter()
            .filter(|p| !active_only || p.advance.status.is_active())
            .map(LedgerPosition::summary)
            .collect())
    }

    async fn employee_positions(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<LedgerPosition>, AdvancesError> {
        self.advance_repo
            .list_positions(&AdvanceFilter {
                employee_id: Some(employee_id),
                ..Default::default()
            })
            .await
            .map_err(storage_error)
    }

    /// List advances across employees, newest first
    pub async fn list_advances(
        &self,
        filter: AdvanceFilter,
    ) -> Result<Vec<AdvanceSummary>, AdvancesError> {
        check_filter(&filter)?;
        let positions = self
            .advance_repo
            .list_positions(&filter)
            .await
            .map_err(storage_error)?;
        Ok(positions.iter().map(LedgerPosition::summary).collect())
    }

    /// Aggregate figures over the advances matching `filter`
    pub async fn statistics(
        &self,
        filter: AdvanceFilter,
    ) -> Result<AdvanceStatistics, AdvancesError> {
        check_filter(&filter)?;
        let positions = self
            .advance_repo
            .list_positions(&filter)
            .await
            .map_err(storage_error)?;
        summarize(&positions)
    }

    /// Change the terms of an advance
    ///
    /// Only pending advances may be edited unless the caller is an admin. The
    /// amount never drops below what has already been repaid.
    pub async fn update_advance(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
        update: AdvanceUpdate,
    ) -> Result<AdvanceSummary, AdvancesError> {
        validation::validate_advance_update(&update)?;
        let currency = self.options.currency.as_str();

        let mutation = |position: &LedgerPosition| -> Result<Advance, AdvancesError> {
            let mut advance = owned_advance(position, employee_id)?;
            if advance.status != AdvanceStatus::Pending && !caller.is_admin {
                return Err(AdvancesError::InvalidTransition {
                    status: advance.status,
                    action: "update".to_string(),
                });
            }

            if let Some(amount) = update.amount {
                if amount < position.repaid {
                    return Err(AdvancesError::invalid(
                        "amount",
                        format!(
                            "must not be below the repaid amount of {}",
                            format_money(currency, position.repaid)
                        ),
                    ));
                }
                advance.amount = amount;
            }
            if let Some(reason) = &update.reason {
                advance.reason = reason.trim().to_string();
            }
            if let Some(payment_date) = update.payment_date {
                advance.payment_date = payment_date;
            }
            if let Some(deduction) = update.monthly_deduction {
                advance.monthly_deduction = Some(deduction);
            }
            if let Some(repayment_date) = update.repayment_date {
                advance.repayment_date = Some(repayment_date);
            }

            let mut v = Violations::new();
            if let Some(repayment_date) = advance.repayment_date {
                v.check(
                    repayment_date >= advance.payment_date,
                    "repayment_date",
                    "must not be before payment_date",
                );
            }
            v.finish()?;

            // A changed amount can settle or reopen a repaid advance
            if matches!(
                advance.status,
                AdvanceStatus::PartiallyRepaid | AdvanceStatus::FullyRepaid
            ) {
                advance.status = if remaining_balance(advance.amount, position.repaid)
                    <= Decimal::ZERO
                {
                    AdvanceStatus::FullyRepaid
                } else {
                    AdvanceStatus::PartiallyRepaid
                };
            }
            advance.updated_at = Utc::now();
            Ok(advance)
        };

        let position = self.modify(advance_id, &mutation).await?;
        tracing::info!(advance_id = %advance_id, actor = %caller.user_id, admin = caller.is_admin, "advance updated");
        self.publish(AdvanceEvent::updated(&position.advance, caller.user_id))
            .await;
        Ok(position.summary())
    }

    /// Set the monthly deduction of several active advances
    pub async fn update_monthly_deductions(
        &self,
        caller: Caller,
        employee_id: Uuid,
        deductions: Vec<(Uuid, Decimal)>,
    ) -> Result<Vec<AdvanceSummary>, AdvancesError> {
        let mut v = Violations::new();
        v.check(!deductions.is_empty(), "deductions", "must not be empty");
        for (i, (advance_id, deduction)) in deductions.iter().enumerate() {
            validation::check_non_negative(
                &mut v,
                &format!("deductions[{}].monthly_deduction", i),
                *deduction,
            );
            v.check(
                !deductions[..i].iter().any(|(id, _)| id == advance_id),
                &format!("deductions[{}].advance_id", i),
                "is listed more than once",
            );
        }
        v.finish()?;

        // One transaction over every advance of the employee; any failure writes nothing
        let batch = |positions: &[LedgerPosition]| -> Result<Vec<Advance>, AdvancesError> {
            let now = Utc::now();
            deductions
                .iter()
                .map(|(advance_id, deduction)| {
                    let position = positions
                        .iter()
                        .find(|p| p.advance.id == *advance_id)
                        .ok_or_else(|| AdvancesError::not_found("advance", advance_id))?;
                    let mut advance = owned_advance(position, employee_id)?;
                    ensure_active(&advance)?;
                    advance.monthly_deduction = Some(*deduction);
                    advance.updated_at = now;
                    Ok(advance)
                })
                .collect()
        };
        let positions = self
            .advance_repo
            .modify_employee_advances(employee_id, &batch)
            .await
            .map_err(|err| {
                let err = storage_error(err);
                tracing::debug!(employee_id = %employee_id, error = %err, "deduction update rejected");
                err
            })?;

        let mut updated = Vec::with_capacity(positions.len());
        for position in positions {
            self.publish(AdvanceEvent::updated(&position.advance, caller.user_id))
                .await;
            updated.push(position.summary());
        }

        tracing::info!(employee_id = %employee_id, count = updated.len(), actor = %caller.user_id, "monthly deductions updated");
        Ok(updated)
    }

    /// Approve a pending advance
    pub async fn approve_advance(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
    ) -> Result<AdvanceSummary, AdvancesError> {
        let position = self
            .transition(employee_id, advance_id, Transition::Approve, |advance, now| {
                advance.approved_by = Some(caller.user_id);
                advance.approved_at = Some(now);
            })
            .await?;

        tracing::info!(advance_id = %advance_id, actor = %caller.user_id, "advance approved");
        self.publish(AdvanceEvent::approved(&position.advance, caller.user_id))
            .await;
        Ok(position.summary())
    }

    /// Reject a pending advance
    pub async fn reject_advance(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
        rejection_reason: &str,
    ) -> Result<AdvanceSummary, AdvancesError> {
        validation::validate_rejection_reason(rejection_reason)?;
        let reason = rejection_reason.trim().to_string();

        let position = self
            .transition(employee_id, advance_id, Transition::Reject, |advance, now| {
                advance.rejected_by = Some(caller.user_id);
                advance.rejected_at = Some(now);
                advance.rejection_reason = Some(reason.clone());
            })
            .await?;

        tracing::info!(advance_id = %advance_id, actor = %caller.user_id, reason = %reason, "advance rejected");
        self.publish(AdvanceEvent::rejected(&position.advance, caller.user_id))
            .await;
        Ok(position.summary())
    }

    /// Mark an approved advance as handed out
    pub async fn disburse_advance(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
    ) -> Result<AdvanceSummary, AdvancesError> {
        let position = self
            .transition(employee_id, advance_id, Transition::Disburse, |advance, now| {
                advance.paid_by = Some(caller.user_id);
                advance.paid_at = Some(now);
            })
            .await?;

        tracing::info!(advance_id = %advance_id, actor = %caller.user_id, "advance disbursed");
        self.publish(AdvanceEvent::disbursed(&position.advance, caller.user_id))
            .await;
        Ok(position.summary())
    }

    /// Soft delete an advance
    ///
    /// Only pending advances may be deleted unless the caller is an admin.
    /// Advances with active ledger entries are never deleted.
    pub async fn delete_advance(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
    ) -> Result<(), AdvancesError> {
        let guard = |position: &LedgerPosition, active_entries: u64| -> Result<(), AdvancesError> {
            let advance = owned_advance(position, employee_id)?;
            if advance.status != AdvanceStatus::Pending && !caller.is_admin {
                return Err(AdvancesError::InvalidTransition {
                    status: advance.status,
                    action: "delete".to_string(),
                });
            }
            if active_entries > 0 {
                return Err(AdvancesError::Conflict {
                    reason: format!(
                        "Advance {} has {} active repayment entries; reverse them before deleting",
                        advance.id, active_entries
                    ),
                });
            }
            Ok(())
        };

        let advance = self
            .advance_repo
            .soft_delete(advance_id, &guard)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| AdvancesError::not_found("advance", advance_id))?;

        tracing::info!(advance_id = %advance_id, actor = %caller.user_id, "advance deleted");
        self.publish(AdvanceEvent::deleted(&advance, caller.user_id))
            .await;
        Ok(())
    }

    // ===== Ledger Operations =====

    /// Record a repayment against one advance
    pub async fn record_repayment(
        &self,
        caller: Caller,
        employee_id: Uuid,
        advance_id: Uuid,
        repayment: NewRepayment,
    ) -> Result<RecordedRepayment, AdvancesError> {
        validation::validate_repayment(&repayment)?;
        let currency = self.options.currency.as_str();
        let now = Utc::now();

        let planner = |positions: &[LedgerPosition]| -> Result<Vec<LedgerChange>, AdvancesError> {
            let position = positions
                .iter()
                .find(|p| p.advance.id == advance_id && p.advance.employee_id == employee_id)
                .ok_or_else(|| AdvancesError::not_found("advance", advance_id))?;
            Ok(vec![book(
                position,
                repayment.amount,
                &repayment,
                caller,
                now,
                currency,
            )?])
        };

        let changes = self
            .advance_repo
            .record_repayments(RepaymentScope::Advance(advance_id), &planner)
            .await
            .map_err(storage_error)?;
        let change = changes.into_iter().next().ok_or_else(|| {
            tracing::error!(advance_id = %advance_id, "repayment planned but nothing was written");
            AdvancesError::Internal
        })?;

        tracing::info!(
            advance_id = %advance_id,
            entry_id = %change.entry.id,
            amount = %change.entry.amount,
            remaining = %change.position.remaining(),
            status = %change.position.advance.status,
            actor = %caller.user_id,
            "repayment recorded"
        );
        self.publish_recorded(&change, caller).await;

        Ok(RecordedRepayment {
            advance: change.position.summary(),
            entry: change.entry,
        })
    }

    /// Distribute one payment over every active advance of an employee
    ///
    /// The smallest balance is settled first, ties go to the oldest advance.
    pub async fn record_employee_repayment(
        &self,
        caller: Caller,
        employee_id: Uuid,
        repayment: NewRepayment,
    ) -> Result<EmployeeRepayment, AdvancesError> {
        validation::validate_repayment(&repayment)?;
        self.get_employee(employee_id).await?;
        let currency = self.options.currency.as_str();
        let enforce_minimum = self.options.enforce_minimum_repayment;
        let now = Utc::now();

        let planner = |positions: &[LedgerPosition]| -> Result<Vec<LedgerChange>, AdvancesError> {
            let open: Vec<LedgerPosition> = positions
                .iter()
                .filter(|p| p.advance.status.accepts_repayment() && p.remaining() > Decimal::ZERO)
                .cloned()
                .collect();
            if open.is_empty() {
                return Err(AdvancesError::Conflict {
                    reason: format!("Employee {} has no outstanding advances", employee_id),
                });
            }

            let total_remaining =
                money_total("total_remaining", open.iter().map(LedgerPosition::remaining))?;
            if repayment.amount > total_remaining {
                return Err(AdvancesError::invalid(
                    "amount",
                    format!(
                        "must not exceed the total remaining balance of {}",
                        format_money(currency, total_remaining)
                    ),
                ));
            }
            if enforce_minimum {
                let total_deduction = money_total(
                    "total_monthly_deduction",
                    open.iter().filter_map(|p| p.advance.monthly_deduction),
                )?;
                let minimum = total_deduction.min(total_remaining);
                if repayment.amount < minimum {
                    return Err(AdvancesError::invalid(
                        "amount",
                        format!(
                            "must be at least the monthly deduction of {}",
                            format_money(currency, minimum)
                        ),
                    ));
                }
            }

            allocate(repayment.amount, &open)
                .into_iter()
                .map(|allocation| {
                    let position = open
                        .iter()
                        .find(|p| p.advance.id == allocation.advance_id)
                        .ok_or(AdvancesError::Internal)?;
                    book(position, allocation.amount, &repayment, caller, now, currency)
                })
                .collect()
        };

        let changes = self
            .advance_repo
            .record_repayments(RepaymentScope::Employee(employee_id), &planner)
            .await
            .map_err(storage_error)?;

        tracing::info!(
            employee_id = %employee_id,
            amount = %repayment.amount,
            advances = changes.len(),
            actor = %caller.user_id,
            "employee repayment recorded"
        );
        for change in &changes {
            self.publish_recorded(change, caller).await;
        }

        let balance = self.employee_balance(employee_id).await?;
        Ok(EmployeeRepayment {
            entries: changes.into_iter().map(|change| change.entry).collect(),
            balance,
        })
    }

    /// Reverse a repayment entry (admin only)
    ///
    /// The entry stays in the ledger, marked reversed, and no longer counts
    /// towards the balance.
    pub async fn reverse_repayment(
        &self,
        caller: Caller,
        employee_id: Uuid,
        entry_id: Uuid,
        reason: Option<String>,
    ) -> Result<AdvanceSummary, AdvancesError> {
        if !caller.is_admin {
            tracing::warn!(entry_id = %entry_id, actor = %caller.user_id, "repayment reversal refused for non-admin");
            return Err(AdvancesError::Forbidden {
                reason: "Only administrators can reverse repayments".to_string(),
            });
        }
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if let Some(reason) = &reason {
            let mut v = Violations::new();
            v.check(
                reason.chars().count() <= MAX_REASON_LEN,
                "reversal_reason",
                format!("must not exceed {} characters", MAX_REASON_LEN),
            );
            v.finish()?;
        }
        let now = Utc::now();

        let planner = |entry: &RepaymentEntry,
                       position: &LedgerPosition|
         -> Result<LedgerChange, AdvancesError> {
            if entry.employee_id != employee_id {
                return Err(AdvancesError::not_found("repayment", entry_id));
            }
            if !entry.is_active() {
                return Err(AdvancesError::Conflict {
                    reason: format!("Repayment {} is already reversed", entry_id),
                });
            }

            let mut advance = position.advance.clone();
            let repaid = position.repaid - entry.amount;
            advance.status = advance.status.apply(Transition::Reverse {
                repaid,
                outstanding: remaining_balance(advance.amount, repaid),
                disbursed: advance.paid_at.is_some(),
            })?;
            advance.updated_at = now;

            let mut entry = entry.clone();
            entry.reversed_by = Some(caller.user_id);
            entry.reversed_at = Some(now);
            entry.reversal_reason = reason.clone();

            Ok(LedgerChange {
                entry,
                position: LedgerPosition { advance, repaid },
            })
        };

        let change = self
            .advance_repo
            .reverse_repayment(entry_id, &planner)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| AdvancesError::not_found("repayment", entry_id))?;

        tracing::info!(
            entry_id = %entry_id,
            advance_id = %change.entry.advance_id,
            amount = %change.entry.amount,
            status = %change.position.advance.status,
            actor = %caller.user_id,
            "repayment reversed"
        );
        self.publish(AdvanceEvent::repayment_reversed(
            &change.entry,
            change.position.remaining(),
            change.position.advance.status,
            caller.user_id,
        ))
        .await;

        Ok(change.position.summary())
    }

    /// Outstanding advance position of an employee
    pub async fn employee_balance(
        &self,
        employee_id: Uuid,
    ) -> Result<EmployeeBalance, AdvancesError> {
        self.get_employee(employee_id).await?;
        let positions = self.employee_positions(employee_id).await?;

        let active: Vec<&LedgerPosition> = positions
            .iter()
            .filter(|p| p.advance.status.is_active())
            .collect();
        let total_remaining =
            money_total("total_remaining", active.iter().map(|p| p.remaining()))?;
        let total_monthly_deduction = money_total(
            "total_monthly_deduction",
            active
                .iter()
                .filter(|p| p.remaining() > Decimal::ZERO)
                .filter_map(|p| p.advance.monthly_deduction),
        )?;

        Ok(EmployeeBalance {
            employee_id,
            active_advances: active.iter().map(|p| p.summary()).collect(),
            total_remaining,
            total_monthly_deduction,
            estimated_months: estimated_months(total_remaining, Some(total_monthly_deduction)),
            settlement_deduction: total_remaining,
        })
    }

    /// One page of an employee's repayments, grouped by month
    pub async fn repayment_history(
        &self,
        employee_id: Uuid,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> Result<HistoryPage, AdvancesError> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(self.options.history_page_size);
        let max = self.options.max_history_page_size;

        let mut v = Violations::new();
        v.check(page >= 1, "page", "must be at least 1");
        v.check(
            (1..=max).contains(&per_page),
            "per_page",
            format!("must be between 1 and {}", max),
        );
        v.finish()?;

        self.get_employee(employee_id).await?;
        let offset = (page - 1).saturating_mul(per_page);
        let (entries, total_entries) = self
            .repayment_repo
            .entries_for_employee(employee_id, per_page, offset)
            .await
            .map_err(storage_error)?;

        Ok(HistoryPage {
            months: group_by_month(entries),
            page,
            per_page,
            total_entries,
        })
    }

    /// Receipt for one repayment of an employee
    pub async fn repayment_receipt(
        &self,
        employee_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Receipt, AdvancesError> {
        let entry = self
            .repayment_repo
            .find_entry(entry_id)
            .await
            .map_err(storage_error)?
            .filter(|entry| entry.employee_id == employee_id)
            .ok_or_else(|| AdvancesError::not_found("repayment", entry_id))?;
        let employee = self.get_employee(employee_id).await?;
        let position = self.find_owned_position(employee_id, entry.advance_id).await?;
        let ledger = self
            .repayment_repo
            .entries_for_advance(entry.advance_id)
            .await
            .map_err(storage_error)?;

        Ok(Receipt::build(
            &entry,
            &position,
            &ledger,
            &employee,
            &self.options.company,
            &self.options.currency,
        ))
    }

    // ===== Helper Methods =====

    async fn modify(
        &self,
        advance_id: Uuid,
        mutation: &(dyn Fn(&LedgerPosition) -> Result<Advance, AdvancesError> + Send + Sync),
    ) -> Result<LedgerPosition, AdvancesError> {
        self.advance_repo
            .modify(advance_id, mutation)
            .await
            .map_err(|err| {
                let err = storage_error(err);
                tracing::debug!(advance_id = %advance_id, error = %err, "advance change rejected");
                err
            })?
            .ok_or_else(|| AdvancesError::not_found("advance", advance_id))
    }

    /// Apply a lifecycle transition and stamp the fields it owns
    async fn transition(
        &self,
        employee_id: Uuid,
        advance_id: Uuid,
        transition: Transition,
        stamp: impl Fn(&mut Advance, DateTime<Utc>) + Send + Sync,
    ) -> Result<LedgerPosition, AdvancesError> {
        let mutation = |position: &LedgerPosition| -> Result<Advance, AdvancesError> {
            let mut advance = owned_advance(position, employee_id)?;
            advance.status = advance.status.apply(transition)?;
            let now = Utc::now();
            advance.updated_at = now;
            stamp(&mut advance, now);
            Ok(advance)
        };
        self.modify(advance_id, &mutation).await
    }

    async fn publish_recorded(&self, change: &LedgerChange, caller: Caller) {
        self.publish(AdvanceEvent::repayment_recorded(
            &change.entry,
            change.position.remaining(),
            change.position.advance.status,
            caller.user_id,
        ))
        .await;
    }

    /// Publish an event; failures are logged and never fail the operation
    async fn publish(&self, event: AdvanceEvent) {
        let kind = event.kind();
        if let Err(err) = self.event_publisher.publish(event).await {
            tracing::warn!(event = kind, error = %err, "failed to publish advance event");
        }
    }
}

fn ensure_active(advance: &Advance) -> Result<(), AdvancesError> {
    if advance.status.is_active() {
        Ok(())
    } else {
        Err(AdvancesError::InvalidTransition {
            status: advance.status,
            action: "change the monthly deduction of".to_string(),
        })
    }
}

fn check_filter(filter: &AdvanceFilter) -> Result<(), AdvancesError> {
    match (filter.created_from, filter.created_to) {
        (Some(from), Some(to)) if from > to => Err(AdvancesError::invalid(
            "created_from",
            "must not be after created_to",
        )),
        _ => Ok(()),
    }
}
