//! Field validation for advance service inputs

use crate::contract::{
    AdvanceUpdate, AdvancesError, FieldViolation, NewAdvance, NewEmployee, NewRepayment,
};
use super::ledger::MAX_MONEY;
use rust_decimal::Decimal;

pub const MAX_REASON_LEN: usize = 255;
pub const MAX_NOTES_LEN: usize = 500;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMPLOYEE_CODE_LEN: usize = 50;

/// Money amounts carry at most this many decimal places
const MONEY_SCALE: u32 = 2;

/// Collects violations so a request reports every bad field at once
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    /// Record `message` for `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn finish(self) -> Result<(), AdvancesError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AdvancesError::Validation { violations: self.0 })
        }
    }
}

fn check_text(v: &mut Violations, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        v.push(field, "is required");
    } else if value.chars().count() > max_len {
        v.push(field, format!("must not exceed {} characters", max_len));
    }
}

/// Scale and upper bound shared by every money field
fn check_money(v: &mut Violations, field: &str, value: Decimal) {
    if value.normalize().scale() > MONEY_SCALE {
        v.push(field, "must have at most two decimal places");
    } else if value > MAX_MONEY {
        v.push(field, format!("must not exceed {}", MAX_MONEY));
    }
}

fn check_amount(v: &mut Violations, field: &str, amount: Decimal) {
    if amount <= Decimal::ZERO {
        v.push(field, "must be greater than zero");
    } else {
        check_money(v, field, amount);
    }
}

/// Non-negative money value such as a monthly deduction or a salary
pub fn check_non_negative(v: &mut Violations, field: &str, value: Decimal) {
    if value < Decimal::ZERO {
        v.push(field, "must not be negative");
    } else {
        check_money(v, field, value);
    }
}

fn check_deduction(v: &mut Violations, deduction: Option<Decimal>) {
    if let Some(d) = deduction {
        check_non_negative(v, "monthly_deduction", d);
    }
}

/// Validate an employee registration
pub fn validate_new_employee(employee: &NewEmployee) -> Result<(), AdvancesError> {
    let mut v = Violations::new();
    check_text(
        &mut v,
        "employee_code",
        &employee.employee_code,
        MAX_EMPLOYEE_CODE_LEN,
    );
    v.check(
        !employee.employee_code.chars().any(char::is_whitespace),
        "employee_code",
        "must not contain whitespace",
    );
    check_text(&mut v, "first_name", &employee.first_name, MAX_NAME_LEN);
    check_text(&mut v, "last_name", &employee.last_name, MAX_NAME_LEN);
    if let Some(designation) = &employee.designation {
        v.check(
            designation.chars().count() <= MAX_NAME_LEN,
            "designation",
            format!("must not exceed {} characters", MAX_NAME_LEN),
        );
    }
    if let Some(salary) = employee.basic_salary {
        check_non_negative(&mut v, "basic_salary", salary);
    }
    v.finish()
}

/// Validate a new advance request
pub fn validate_new_advance(advance: &NewAdvance) -> Result<(), AdvancesError> {
    let mut v = Violations::new();
    check_amount(&mut v, "amount", advance.amount);
    check_text(&mut v, "reason", &advance.reason, MAX_REASON_LEN);
    check_deduction(&mut v, advance.monthly_deduction);
    if let Some(repayment_date) = advance.repayment_date {
        v.check(
            repayment_date >= advance.payment_date,
            "repayment_date",
            "must not be before payment_date",
        );
    }
    v.finish()
}

/// Validate a partial update; cross-field checks run on the merged advance
pub fn validate_advance_update(update: &AdvanceUpdate) -> Result<(), AdvancesError> {
    let mut v = Violations::new();
    if let Some(amount) = update.amount {
        check_amount(&mut v, "amount", amount);
    }
    if let Some(reason) = &update.reason {
        check_text(&mut v, "reason", reason, MAX_REASON_LEN);
    }
    check_deduction(&mut v, update.monthly_deduction);
    v.finish()
}

/// Validate a repayment input (balance checks happen against the ledger)
pub fn validate_repayment(repayment: &NewRepayment) -> Result<(), AdvancesError> {
    let mut v = Violations::new();
    check_amount(&mut v, "amount", repayment.amount);
    if let Some(notes) = &repayment.notes {
        v.check(
            notes.chars().count() <= MAX_NOTES_LEN,
            "notes",
            format!("must not exceed {} characters", MAX_NOTES_LEN),
        );
    }
    v.finish()
}

/// Validate a rejection reason
pub fn validate_rejection_reason(reason: &str) -> Result<(), AdvancesError> {
    let mut v = Violations::new();
    check_text(&mut v, "rejection_reason", reason, MAX_REASON_LEN);
    v.finish()
}
