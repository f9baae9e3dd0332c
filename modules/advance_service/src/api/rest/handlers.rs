//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    caller::caller_from_headers,
    dto::*,
    error::{map_domain_error, Problem},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use crate::contract::{AdvanceFilter, AdvanceStatus};
use crate::domain::Service;
use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

// ===== Employee Handlers =====

/// Register an employee
pub async fn register_employee(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RegisterEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeDto>), Problem> {
    caller_from_headers(&headers)?;
    let employee = service
        .register_employee(req.into())
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(employee.into())))
}

/// Get an employee
pub async fn get_employee(
    service: Arc<Service>,
    ApiPath(employee_id): ApiPath<Uuid>,
) -> Result<Json<EmployeeDto>, Problem> {
    let employee = service
        .get_employee(employee_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(employee.into()))
}

// ===== Advance Handlers =====

/// Query parameters for listing advances
#[derive(Debug, Default, Deserialize)]
pub struct ListAdvancesQuery {
    pub employee_id: Option<Uuid>,
    /// Status string, e.g. `pending`
    pub status: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
}

impl ListAdvancesQuery {
    fn into_filter(self) -> Result<AdvanceFilter, Problem> {
        let status = self
            .status
            .map(|s| s.parse::<AdvanceStatus>())
            .transpose()
            .map_err(map_domain_error)?;

        Ok(AdvanceFilter {
            employee_id: self.employee_id,
            status,
            created_from: self.created_from,
            created_to: self.created_to,
        })
    }
}

/// List advances across employees
pub async fn list_advances(
    service: Arc<Service>,
    ApiQuery(query): ApiQuery<ListAdvancesQuery>,
) -> Result<Json<AdvanceListResponse>, Problem> {
    let advances = service
        .list_advances(query.into_filter()?)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advances.into()))
}

/// Aggregate figures over advances
pub async fn advance_statistics(
    service: Arc<Service>,
    ApiQuery(query): ApiQuery<ListAdvancesQuery>,
) -> Result<Json<AdvanceStatisticsDto>, Problem> {
    let stats = service
        .statistics(query.into_filter()?)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(stats.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeAdvancesQuery {
    /// Only advances still being repaid
    #[serde(default)]
    pub active_only: bool,
}

/// List advances of an employee
pub async fn list_employee_advances(
    service: Arc<Service>,
    ApiPath(employee_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<EmployeeAdvancesQuery>,
) -> Result<Json<AdvanceListResponse>, Problem> {
    let advances = service
        .list_employee_advances(employee_id, query.active_only)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advances.into()))
}

/// Request an advance
pub async fn request_advance(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath(employee_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateAdvanceRequest>,
) -> Result<(StatusCode, Json<AdvanceDto>), Problem> {
    let caller = caller_from_headers(&headers)?;
    let advance = service
        .request_advance(caller, employee_id, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(advance.into())))
}

/// Get an advance
pub async fn get_advance(
    service: Arc<Service>,
    ApiPath((employee_id, advance_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<AdvanceDto>, Problem> {
    let advance = service
        .get_advance(employee_id, advance_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advance.into()))
}

/// Update the terms of an advance
pub async fn update_advance(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath((employee_id, advance_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateAdvanceRequest>,
) -> Result<Json<AdvanceDto>, Problem> {
    let caller = caller_from_headers(&headers)?;
    let advance = service
        .update_advance(caller, employee_id, advance_id, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advance.into()))
}

/// Soft delete an advance
pub async fn delete_advance(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath((employee_id, advance_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, Problem> {
    let caller = caller_from_headers(&headers)?;
    service
        .delete_advance(caller, employee_id, advance_id)
        .await
        .map_err(map_domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Approve a pending advance
pub async fn approve_advance(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath((employee_id, advance_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<AdvanceDto>, Problem> {
    let caller = caller_from_headers(&headers)?;
    let advance = service
        .approve_advance(caller, employee_id, advance_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advance.into()))
}

/// Reject a pending advance
pub async fn reject_advance(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath((employee_id, advance_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<RejectAdvanceRequest>,
) -> Result<Json<AdvanceDto>, Problem> {
    let caller = caller_from_headers(&headers)?;
    let advance = service
        .reject_advance(caller, employee_id, advance_id, &req.rejection_reason)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advance.into()))
}

/// Mark an approved advance as disbursed
pub async fn disburse_advance(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath((employee_id, advance_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<AdvanceDto>, Problem> {
    let caller = caller_from_headers(&headers)?;
    let advance = service
        .disburse_advance(caller, employee_id, advance_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advance.into()))
}

/// Set monthly deductions of several active advances
pub async fn update_monthly_deductions(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath(employee_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<MonthlyDeductionsRequest>,
) -> Result<Json<AdvanceListResponse>, Problem> {
    let caller = caller_from_headers(&headers)?;
    let deductions = req
        .deductions
        .into_iter()
        .map(|item| (item.advance_id, item.monthly_deduction))
        .collect();
    let advances = service
        .update_monthly_deductions(caller, employee_id, deductions)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advances.into()))
}

// ===== Ledger Handlers =====

/// Record a repayment against one advance
pub async fn record_repayment(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath((employee_id, advance_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<RecordRepaymentRequest>,
) -> Result<(StatusCode, Json<RecordedRepaymentDto>), Problem> {
    let caller = caller_from_headers(&headers)?;
    let recorded = service
        .record_repayment(caller, employee_id, advance_id, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(recorded.into())))
}

/// Record a repayment distributed over the employee's advances
pub async fn record_employee_repayment(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath(employee_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RecordRepaymentRequest>,
) -> Result<(StatusCode, Json<EmployeeRepaymentDto>), Problem> {
    let caller = caller_from_headers(&headers)?;
    let repayment = service
        .record_employee_repayment(caller, employee_id, req.into())
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(repayment.into())))
}

/// Reverse a repayment (admin only)
pub async fn reverse_repayment(
    service: Arc<Service>,
    headers: HeaderMap,
    ApiPath((employee_id, entry_id)): ApiPath<(Uuid, Uuid)>,
    req: Option<ApiJson<ReverseRepaymentRequest>>,
) -> Result<Json<AdvanceDto>, Problem> {
    let caller = caller_from_headers(&headers)?;
    let reason = req.and_then(|ApiJson(req)| req.reason);
    let advance = service
        .reverse_repayment(caller, employee_id, entry_id, reason)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(advance.into()))
}

/// Outstanding balance of an employee
pub async fn employee_balance(
    service: Arc<Service>,
    ApiPath(employee_id): ApiPath<Uuid>,
) -> Result<Json<EmployeeBalanceDto>, Problem> {
    let balance = service
        .employee_balance(employee_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(balance.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Repayment history grouped by month
pub async fn repayment_history(
    service: Arc<Service>,
    ApiPath(employee_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<HistoryPageDto>, Problem> {
    let page = service
        .repayment_history(employee_id, query.page, query.per_page)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(page.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    /// `json` (default) or `text`
    pub format: Option<String>,
}

/// Receipt for one repayment, as JSON or printable text
pub async fn repayment_receipt(
    service: Arc<Service>,
    ApiPath((employee_id, entry_id)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(query): ApiQuery<ReceiptQuery>,
) -> Result<Response, Problem> {
    let receipt = service
        .repayment_receipt(employee_id, entry_id)
        .await
        .map_err(map_domain_error)?;

    match query.format.as_deref() {
        None | Some("json") => Ok(Json(ReceiptDto::from(receipt)).into_response()),
        Some("text") => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            receipt.render_text(),
        )
            .into_response()),
        Some(other) => Err(map_domain_error(crate::contract::AdvancesError::invalid(
            "format",
            format!("unsupported receipt format '{}'", other),
        ))),
    }
}
