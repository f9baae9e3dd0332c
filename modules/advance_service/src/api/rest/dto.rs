//! REST DTOs with serde derives for HTTP API
//!
//! Money travels as decimal strings with two places (`"1000.00"`); requests
//! accept strings or JSON numbers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ===== Employee DTOs =====

/// Employee registration request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterEmployeeRequest {
    #[schema(example = "EMP-0042")]
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub designation: Option<String>,
    /// Monthly basic salary
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "8000.00")]
    pub basic_salary: Option<Decimal>,
}

/// Employee response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeDto {
    pub id: Uuid,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub basic_salary: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

// ===== Advance DTOs =====

/// Advance request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAdvanceRequest {
    #[schema(value_type = String, example = "1000.00")]
    pub amount: Decimal,
    #[schema(example = "Family emergency")]
    pub reason: String,
    /// Date the advance is handed out
    pub payment_date: NaiveDate,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "200.00")]
    pub monthly_deduction: Option<Decimal>,
    #[serde(default)]
    pub repayment_date: Option<NaiveDate>,
}

/// Partial update of an advance; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAdvanceRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub monthly_deduction: Option<Decimal>,
    #[serde(default)]
    pub repayment_date: Option<NaiveDate>,
}

/// Rejection request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RejectAdvanceRequest {
    #[schema(example = "insufficient tenure")]
    pub rejection_reason: String,
}

/// One entry of a bulk monthly deduction update
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MonthlyDeductionItem {
    pub advance_id: Uuid,
    #[schema(value_type = String, example = "250.00")]
    pub monthly_deduction: Decimal,
}

/// Bulk monthly deduction update
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MonthlyDeductionsRequest {
    pub deductions: Vec<MonthlyDeductionItem>,
}

/// Advance with its ledger-derived balances
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvanceDto {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[schema(value_type = String, example = "1000.00")]
    pub amount: Decimal,
    pub reason: String,
    /// `pending`, `approved`, `rejected`, `paid`, `partially_repaid` or `fully_repaid`
    #[schema(example = "pending")]
    pub status: String,
    pub payment_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub monthly_deduction: Option<Decimal>,
    pub repayment_date: Option<NaiveDate>,
    #[schema(value_type = String, example = "300.00")]
    pub repaid_amount: Decimal,
    #[schema(value_type = String, example = "700.00")]
    pub remaining_balance: Decimal,
    /// Months left at the current deduction; null when no deduction is set
    pub estimated_months: Option<u32>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub paid_by: Option<Uuid>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Advance list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvanceListResponse {
    pub items: Vec<AdvanceDto>,
    pub total: usize,
}

// ===== Ledger DTOs =====

/// Repayment request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordRepaymentRequest {
    #[schema(value_type = String, example = "300.00")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Reversal request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReverseRepaymentRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepaymentEntryDto {
    pub id: Uuid,
    pub advance_id: Uuid,
    pub employee_id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversal_reason: Option<String>,
}

/// Result of a repayment against one advance
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordedRepaymentDto {
    pub entry: RepaymentEntryDto,
    pub advance: AdvanceDto,
}

/// Result of a repayment distributed over an employee's advances
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeRepaymentDto {
    pub entries: Vec<RepaymentEntryDto>,
    pub balance: EmployeeBalanceDto,
}

/// Outstanding position of an employee
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeBalanceDto {
    pub employee_id: Uuid,
    pub active_advances: Vec<AdvanceDto>,
    #[schema(value_type = String)]
    pub total_remaining: Decimal,
    #[schema(value_type = String)]
    pub total_monthly_deduction: Decimal,
    pub estimated_months: Option<u32>,
    /// Amount withheld from a final settlement
    #[schema(value_type = String)]
    pub settlement_deduction: Decimal,
}

/// Repayments of one month
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyRepaymentsDto {
    #[schema(example = "2024-03")]
    pub month: String,
    #[schema(example = "March 2024")]
    pub label: String,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub payments: Vec<RepaymentEntryDto>,
}

/// Repayment history page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryPageDto {
    pub months: Vec<MonthlyRepaymentsDto>,
    pub page: u64,
    pub per_page: u64,
    pub total_entries: u64,
    pub total_pages: u64,
}

// ===== Receipt DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyDto {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiptEmployeeDto {
    pub employee_id: Uuid,
    pub name: String,
    pub employee_code: String,
    pub designation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiptPaymentDto {
    pub entry_id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Formatted amount, e.g. `SAR 1,234.50`
    pub amount_display: String,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub reversed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiptAdvanceDto {
    pub advance_id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub reason: String,
    pub payment_date: NaiveDate,
    pub status: String,
    #[schema(value_type = String)]
    pub repaid_to_date: Decimal,
    #[schema(value_type = String)]
    pub balance_after_payment: Decimal,
    #[schema(value_type = String)]
    pub current_balance: Decimal,
}

/// Repayment receipt
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiptDto {
    #[schema(example = "RCPT-20240315-1A2B3C4D")]
    pub receipt_number: String,
    #[schema(example = "SAR")]
    pub currency: String,
    pub company: CompanyDto,
    pub employee: ReceiptEmployeeDto,
    pub payment: ReceiptPaymentDto,
    pub advance: ReceiptAdvanceDto,
    pub issued_at: DateTime<Utc>,
}

// ===== Statistics DTOs =====

/// Aggregate figures over advances
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvanceStatisticsDto {
    pub total_requests: u64,
    pub pending_requests: u64,
    pub approved_requests: u64,
    pub rejected_requests: u64,
    pub paid_requests: u64,
    pub partially_repaid_requests: u64,
    pub fully_repaid_requests: u64,
    #[schema(value_type = String)]
    pub total_amount_requested: Decimal,
    #[schema(value_type = String)]
    pub total_amount_approved: Decimal,
    #[schema(value_type = String)]
    pub total_amount_repaid: Decimal,
    #[schema(value_type = String)]
    pub total_outstanding: Decimal,
    #[schema(value_type = Option<String>)]
    pub average_amount: Option<Decimal>,
    /// Percentage of decided requests that were approved
    #[schema(value_type = String, example = "66.67")]
    pub approval_rate: Decimal,
}
