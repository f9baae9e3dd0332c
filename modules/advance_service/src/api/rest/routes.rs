//! Route registration

use super::{
    dto::*,
    error::Problem,
    extract::{ApiJson, ApiPath, ApiQuery},
    handlers,
    openapi::ApiDoc,
};
use crate::domain::Service;
use axum::{
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

/// Register all REST routes
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        // Employee endpoints
        .route("/employees", post(register_employee_handler))
        .route("/employees/{employee_id}", get(get_employee_handler))
        // Advance endpoints
        .route("/advances", get(list_advances_handler))
        .route("/advances/statistics", get(advance_statistics_handler))
        .route(
            "/employees/{employee_id}/advances",
            get(list_employee_advances_handler).post(request_advance_handler),
        )
        .route(
            "/employees/{employee_id}/advances/balance",
            get(employee_balance_handler),
        )
        .route(
            "/employees/{employee_id}/advances/history",
            get(repayment_history_handler),
        )
        .route(
            "/employees/{employee_id}/advances/monthly-deductions",
            put(update_monthly_deductions_handler),
        )
        .route(
            "/employees/{employee_id}/advances/{advance_id}",
            get(get_advance_handler)
                .patch(update_advance_handler)
                .delete(delete_advance_handler),
        )
        .route(
            "/employees/{employee_id}/advances/{advance_id}/approve",
            post(approve_advance_handler),
        )
        .route(
            "/employees/{employee_id}/advances/{advance_id}/reject",
            post(reject_advance_handler),
        )
        .route(
            "/employees/{employee_id}/advances/{advance_id}/disburse",
            post(disburse_advance_handler),
        )
        // Ledger endpoints
        .route(
            "/employees/{employee_id}/advances/{advance_id}/repayments",
            post(record_repayment_handler),
        )
        .route(
            "/employees/{employee_id}/repayments",
            post(record_employee_repayment_handler),
        )
        .route(
            "/employees/{employee_id}/repayments/{entry_id}/reverse",
            post(reverse_repayment_handler),
        )
        .route(
            "/employees/{employee_id}/repayments/{entry_id}/receipt",
            get(repayment_receipt_handler),
        )
        .route("/openapi.json", get(openapi_handler))
        // Add service as extension for handlers
        .layer(Extension(service))
}

// ===== Handler wrappers that extract service from Extension =====

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn register_employee_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    json: ApiJson<RegisterEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeDto>), Problem> {
    handlers::register_employee(service, headers, json).await
}

async fn get_employee_handler(
    Extension(service): Extension<Arc<Service>>,
    path: ApiPath<Uuid>,
) -> Result<Json<EmployeeDto>, Problem> {
    handlers::get_employee(service, path).await
}

async fn list_advances_handler(
    Extension(service): Extension<Arc<Service>>,
    query: ApiQuery<handlers::ListAdvancesQuery>,
) -> Result<Json<AdvanceListResponse>, Problem> {
    handlers::list_advances(service, query).await
}

async fn advance_statistics_handler(
    Extension(service): Extension<Arc<Service>>,
    query: ApiQuery<handlers::ListAdvancesQuery>,
) -> Result<Json<AdvanceStatisticsDto>, Problem> {
    handlers::advance_statistics(service, query).await
}

async fn list_employee_advances_handler(
    Extension(service): Extension<Arc<Service>>,
    path: ApiPath<Uuid>,
    query: ApiQuery<handlers::EmployeeAdvancesQuery>,
) -> Result<Json<AdvanceListResponse>, Problem> {
    handlers::list_employee_advances(service, path, query).await
}

async fn request_advance_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<Uuid>,
    json: ApiJson<CreateAdvanceRequest>,
) -> Result<(StatusCode, Json<AdvanceDto>), Problem> {
    handlers::request_advance(service, headers, path, json).await
}

async fn update_monthly_deductions_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<Uuid>,
    json: ApiJson<MonthlyDeductionsRequest>,
) -> Result<Json<AdvanceListResponse>, Problem> {
    handlers::update_monthly_deductions(service, headers, path, json).await
}

async fn get_advance_handler(
    Extension(service): Extension<Arc<Service>>,
    path: ApiPath<(Uuid, Uuid)>,
) -> Result<Json<AdvanceDto>, Problem> {
    handlers::get_advance(service, path).await
}

async fn update_advance_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<(Uuid, Uuid)>,
    json: ApiJson<UpdateAdvanceRequest>,
) -> Result<Json<AdvanceDto>, Problem> {
    handlers::update_advance(service, headers, path, json).await
}

async fn delete_advance_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, Problem> {
    handlers::delete_advance(service, headers, path).await
}

async fn approve_advance_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<(Uuid, Uuid)>,
) -> Result<Json<AdvanceDto>, Problem> {
    handlers::approve_advance(service, headers, path).await
}

async fn reject_advance_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<(Uuid, Uuid)>,
    json: ApiJson<RejectAdvanceRequest>,
) -> Result<Json<AdvanceDto>, Problem> {
    handlers::reject_advance(service, headers, path, json).await
}

async fn disburse_advance_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<(Uuid, Uuid)>,
) -> Result<Json<AdvanceDto>, Problem> {
    handlers::disburse_advance(service, headers, path).await
}

async fn record_repayment_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<(Uuid, Uuid)>,
    json: ApiJson<RecordRepaymentRequest>,
) -> Result<(StatusCode, Json<RecordedRepaymentDto>), Problem> {
    handlers::record_repayment(service, headers, path, json).await
}

async fn record_employee_repayment_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<Uuid>,
    json: ApiJson<RecordRepaymentRequest>,
) -> Result<(StatusCode, Json<EmployeeRepaymentDto>), Problem> {
    handlers::record_employee_repayment(service, headers, path, json).await
}

async fn reverse_repayment_handler(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    path: ApiPath<(Uuid, Uuid)>,
    json: Option<ApiJson<ReverseRepaymentRequest>>,
) -> Result<Json<AdvanceDto>, Problem> {
    handlers::reverse_repayment(service, headers, path, json).await
}

async fn employee_balance_handler(
    Extension(service): Extension<Arc<Service>>,
    path: ApiPath<Uuid>,
) -> Result<Json<EmployeeBalanceDto>, Problem> {
    handlers::employee_balance(service, path).await
}

async fn repayment_history_handler(
    Extension(service): Extension<Arc<Service>>,
    path: ApiPath<Uuid>,
    query: ApiQuery<handlers::HistoryQuery>,
) -> Result<Json<HistoryPageDto>, Problem> {
    handlers::repayment_history(service, path, query).await
}

async fn repayment_receipt_handler(
    Extension(service): Extension<Arc<Service>>,
    path: ApiPath<(Uuid, Uuid)>,
    query: ApiQuery<handlers::ReceiptQuery>,
) -> Result<Response, Problem> {
    handlers::repayment_receipt(service, path, query).await
}
