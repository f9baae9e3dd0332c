//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.

use super::dto::*;
use crate::contract;
use crate::domain::receipt::{format_money, Receipt};
use rust_decimal::Decimal;

/// Money leaves the API with exactly two decimal places
fn money(mut value: Decimal) -> Decimal {
    value.rescale(2);
    value
}

// ===== Employee conversions =====

impl From<contract::Employee> for EmployeeDto {
    fn from(employee: contract::Employee) -> Self {
        Self {
            full_name: employee.full_name(),
            id: employee.id,
            employee_code: employee.employee_code,
            first_name: employee.first_name,
            last_name: employee.last_name,
            designation: employee.designation,
            basic_salary: employee.basic_salary.map(money),
            created_at: employee.created_at,
        }
    }
}

impl From<RegisterEmployeeRequest> for contract::NewEmployee {
    fn from(req: RegisterEmployeeRequest) -> Self {
        Self {
            employee_code: req.employee_code,
            first_name: req.first_name,
            last_name: req.last_name,
            designation: req.designation,
            basic_salary: req.basic_salary,
        }
    }
}

// ===== Advance conversions =====

impl From<contract::AdvanceSummary> for AdvanceDto {
    fn from(summary: contract::AdvanceSummary) -> Self {
        let advance = summary.advance;
        Self {
            id: advance.id,
            employee_id: advance.employee_id,
            amount: money(advance.amount),
            reason: advance.reason,
            status: advance.status.as_str().to_string(),
            payment_date: advance.payment_date,
            monthly_deduction: advance.monthly_deduction.map(money),
            repayment_date: advance.repayment_date,
            repaid_amount: money(summary.repaid_amount),
            remaining_balance: money(summary.remaining_balance),
            estimated_months: summary.estimated_months,
            approved_by: advance.approved_by,
            approved_at: advance.approved_at,
            rejected_by: advance.rejected_by,
            rejected_at: advance.rejected_at,
            rejection_reason: advance.rejection_reason,
            paid_by: advance.paid_by,
            paid_at: advance.paid_at,
            created_at: advance.created_at,
            updated_at: advance.updated_at,
        }
    }
}

impl From<Vec<contract::AdvanceSummary>> for AdvanceListResponse {
    fn from(summaries: Vec<contract::AdvanceSummary>) -> Self {
        let items: Vec<AdvanceDto> = summaries.into_iter().map(AdvanceDto::from).collect();
        let total = items.len();
        Self { items, total }
    }
}

impl From<CreateAdvanceRequest> for contract::NewAdvance {
    fn from(req: CreateAdvanceRequest) -> Self {
        Self {
            amount: req.amount,
            reason: req.reason,
            payment_date: req.payment_date,
            monthly_deduction: req.monthly_deduction,
            repayment_date: req.repayment_date,
        }
    }
}

impl From<UpdateAdvanceRequest> for contract::AdvanceUpdate {
    fn from(req: UpdateAdvanceRequest) -> Self {
        Self {
            amount: req.amount,
            reason: req.reason,
            payment_date: req.payment_date,
            monthly_deduction: req.monthly_deduction,
            repayment_date: req.repayment_date,
        }
    }
}

// ===== Ledger conversions =====

impl From<contract::RepaymentEntry> for RepaymentEntryDto {
    fn from(entry: contract::RepaymentEntry) -> Self {
        Self {
            id: entry.id,
            advance_id: entry.advance_id,
            employee_id: entry.employee_id,
            amount: money(entry.amount),
            payment_date: entry.payment_date,
            notes: entry.notes,
            recorded_by: entry.recorded_by,
            created_at: entry.created_at,
            reversed_by: entry.reversed_by,
            reversed_at: entry.reversed_at,
            reversal_reason: entry.reversal_reason,
        }
    }
}

impl From<RecordRepaymentRequest> for contract::NewRepayment {
    fn from(req: RecordRepaymentRequest) -> Self {
        Self {
            amount: req.amount,
            payment_date: req.payment_date,
            notes: req.notes,
        }
    }
}

impl From<contract::RecordedRepayment> for RecordedRepaymentDto {
    fn from(recorded: contract::RecordedRepayment) -> Self {
        Self {
            entry: recorded.entry.into(),
            advance: recorded.advance.into(),
        }
    }
}

impl From<contract::EmployeeBalance> for EmployeeBalanceDto {
    fn from(balance: contract::EmployeeBalance) -> Self {
        Self {
            employee_id: balance.employee_id,
            active_advances: balance
                .active_advances
                .into_iter()
                .map(AdvanceDto::from)
                .collect(),
            total_remaining: money(balance.total_remaining),
            total_monthly_deduction: money(balance.total_monthly_deduction),
            estimated_months: balance.estimated_months,
            settlement_deduction: money(balance.settlement_deduction),
        }
    }
}

impl From<contract::EmployeeRepayment> for EmployeeRepaymentDto {
    fn from(repayment: contract::EmployeeRepayment) -> Self {
        Self {
            entries: repayment
                .entries
                .into_iter()
                .map(RepaymentEntryDto::from)
                .collect(),
            balance: repayment.balance.into(),
        }
    }
}

impl From<contract::MonthlyRepayments> for MonthlyRepaymentsDto {
    fn from(month: contract::MonthlyRepayments) -> Self {
        Self {
            month: month.month,
            label: month.label,
            total_amount: money(month.total_amount),
            payments: month
                .payments
                .into_iter()
                .map(RepaymentEntryDto::from)
                .collect(),
        }
    }
}

impl From<contract::HistoryPage> for HistoryPageDto {
    fn from(page: contract::HistoryPage) -> Self {
        Self {
            total_pages: page.total_entries.div_ceil(page.per_page.max(1)),
            months: page
                .months
                .into_iter()
                .map(MonthlyRepaymentsDto::from)
                .collect(),
            page: page.page,
            per_page: page.per_page,
            total_entries: page.total_entries,
        }
    }
}

// ===== Receipt conversions =====

impl From<Receipt> for ReceiptDto {
    fn from(receipt: Receipt) -> Self {
        let amount_display = format_money(&receipt.currency, receipt.payment.amount);
        Self {
            receipt_number: receipt.receipt_number,
            currency: receipt.currency,
            company: CompanyDto {
                name: receipt.company.name,
                address: receipt.company.address,
                phone: receipt.company.phone,
                email: receipt.company.email,
            },
            employee: ReceiptEmployeeDto {
                employee_id: receipt.employee.employee_id,
                name: receipt.employee.name,
                employee_code: receipt.employee.employee_code,
                designation: receipt.employee.designation,
            },
            payment: ReceiptPaymentDto {
                entry_id: receipt.payment.entry_id,
                amount: money(receipt.payment.amount),
                amount_display,
                payment_date: receipt.payment.payment_date,
                notes: receipt.payment.notes,
                recorded_by: receipt.payment.recorded_by,
                recorded_at: receipt.payment.recorded_at,
                reversed: receipt.payment.reversed_at.is_some(),
            },
            advance: ReceiptAdvanceDto {
                advance_id: receipt.advance.advance_id,
                amount: money(receipt.advance.amount),
                reason: receipt.advance.reason,
                payment_date: receipt.advance.payment_date,
                status: receipt.advance.status.as_str().to_string(),
                repaid_to_date: money(receipt.advance.repaid_to_date),
                balance_after_payment: money(receipt.advance.balance_after_payment),
                current_balance: money(receipt.advance.current_balance),
            },
            issued_at: receipt.issued_at,
        }
    }
}

// ===== Statistics conversions =====

impl From<contract::AdvanceStatistics> for AdvanceStatisticsDto {
    fn from(stats: contract::AdvanceStatistics) -> Self {
        Self {
            total_requests: stats.total_requests,
            pending_requests: stats.pending_requests,
            approved_requests: stats.approved_requests,
            rejected_requests: stats.rejected_requests,
            paid_requests: stats.paid_requests,
            partially_repaid_requests: stats.partially_repaid_requests,
            fully_repaid_requests: stats.fully_repaid_requests,
            total_amount_requested: money(stats.total_amount_requested),
            total_amount_approved: money(stats.total_amount_approved),
            total_amount_repaid: money(stats.total_amount_repaid),
            total_outstanding: money(stats.total_outstanding),
            average_amount: stats.average_amount.map(money),
            approval_rate: money(stats.approval_rate),
        }
    }
}
