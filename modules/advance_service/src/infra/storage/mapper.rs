//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models. Money columns are
//! rounded to cents on load since some backends hand decimals back as floats.

use super::entity;
use crate::contract::{Advance, AdvanceStatus, Employee, RepaymentEntry};
use rust_decimal::Decimal;

fn cents(value: Decimal) -> Decimal {
    value.round_dp(2)
}

// ===== Employee Conversions =====

impl From<entity::employee::Model> for Employee {
    fn from(entity: entity::employee::Model) -> Self {
        Self {
            id: entity.id,
            employee_code: entity.employee_code,
            first_name: entity.first_name,
            last_name: entity.last_name,
            designation: entity.designation,
            basic_salary: entity.basic_salary.map(cents),
            created_at: entity.created_at,
        }
    }
}

impl From<&Employee> for entity::employee::ActiveModel {
    fn from(model: &Employee) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(model.id),
            employee_code: Set(model.employee_code.clone()),
            first_name: Set(model.first_name.clone()),
            last_name: Set(model.last_name.clone()),
            designation: Set(model.designation.clone()),
            basic_salary: Set(model.basic_salary),
            created_at: Set(model.created_at),
        }
    }
}

// ===== Advance Conversions =====

impl TryFrom<entity::Model> for Advance {
    type Error = anyhow::Error;

    fn try_from(entity: entity::Model) -> Result<Self, Self::Error> {
        let status: AdvanceStatus = entity
            .status
            .parse()
            .map_err(|_| anyhow::anyhow!("advance {} has unknown status '{}'", entity.id, entity.status))?;

        Ok(Self {
            id: entity.id,
            employee_id: entity.employee_id,
            amount: cents(entity.amount),
            reason: entity.reason,
            status,
            payment_date: entity.payment_date,
            monthly_deduction: entity.monthly_deduction.map(cents),
            repayment_date: entity.repayment_date,
            approved_by: entity.approved_by,
            approved_at: entity.approved_at,
            rejected_by: entity.rejected_by,
            rejected_at: entity.rejected_at,
            rejection_reason: entity.rejection_reason,
            paid_by: entity.paid_by,
            paid_at: entity.paid_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            deleted_at: entity.deleted_at,
        })
    }
}

impl From<&Advance> for entity::ActiveModel {
    fn from(model: &Advance) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(model.id),
            employee_id: Set(model.employee_id),
            amount: Set(model.amount),
            reason: Set(model.reason.clone()),
            status: Set(model.status.as_str().to_string()),
            payment_date: Set(model.payment_date),
            monthly_deduction: Set(model.monthly_deduction),
            repayment_date: Set(model.repayment_date),
            approved_by: Set(model.approved_by),
            approved_at: Set(model.approved_at),
            rejected_by: Set(model.rejected_by),
            rejected_at: Set(model.rejected_at),
            rejection_reason: Set(model.rejection_reason.clone()),
            paid_by: Set(model.paid_by),
            paid_at: Set(model.paid_at),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
            deleted_at: Set(model.deleted_at),
        }
    }
}

// ===== Repayment Conversions =====

impl From<entity::repayment::Model> for RepaymentEntry {
    fn from(entity: entity::repayment::Model) -> Self {
        Self {
            id: entity.id,
            advance_id: entity.advance_id,
            employee_id: entity.employee_id,
            amount: cents(entity.amount),
            payment_date: entity.payment_date,
            notes: entity.notes,
            recorded_by: entity.recorded_by,
            created_at: entity.created_at,
            reversed_by: entity.reversed_by,
            reversed_at: entity.reversed_at,
            reversal_reason: entity.reversal_reason,
        }
    }
}

impl From<&RepaymentEntry> for entity::repayment::ActiveModel {
    fn from(model: &RepaymentEntry) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(model.id),
            advance_id: Set(model.advance_id),
            employee_id: Set(model.employee_id),
            amount: Set(model.amount),
            payment_date: Set(model.payment_date),
            notes: Set(model.notes.clone()),
            recorded_by: Set(model.recorded_by),
            created_at: Set(model.created_at),
            reversed_by: Set(model.reversed_by),
            reversed_at: Set(model.reversed_at),
            reversal_reason: Set(model.reversal_reason.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;
    use uuid::Uuid;

    fn row(status: &str) -> entity::Model {
        let now = Utc::now();
        entity::Model {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            amount: Decimal::from_str("1000.004").unwrap(),
            reason: "rent".to_string(),
            status: status.to_string(),
            payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            monthly_deduction: Some(Decimal::from(200)),
            repayment_date: None,
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
        }
    }

    #[test]
    fn test_advance_row_maps_status_and_rounds_money() {
        let advance = Advance::try_from(row("partially_repaid")).unwrap();
        assert_eq!(advance.status, AdvanceStatus::PartiallyRepaid);
        assert_eq!(advance.amount, Decimal::from(1000));

        let active: entity::ActiveModel = (&advance).into();
        assert_eq!(
            active.status,
            sea_orm::ActiveValue::Set("partially_repaid".to_string())
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(Advance::try_from(row("archived")).is_err());
    }
}
