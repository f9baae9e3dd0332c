//! OpenAPI document for the advance endpoints

use super::dto::*;
use super::error::Problem;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Advance Service", description = "Salary advances and repayment ledger"),
    components(schemas(
        RegisterEmployeeRequest,
        EmployeeDto,
        CreateAdvanceRequest,
        UpdateAdvanceRequest,
        RejectAdvanceRequest,
        MonthlyDeductionItem,
        MonthlyDeductionsRequest,
        AdvanceDto,
        AdvanceListResponse,
        RecordRepaymentRequest,
        ReverseRepaymentRequest,
        RepaymentEntryDto,
        RecordedRepaymentDto,
        EmployeeRepaymentDto,
        EmployeeBalanceDto,
        MonthlyRepaymentsDto,
        HistoryPageDto,
        CompanyDto,
        ReceiptEmployeeDto,
        ReceiptPaymentDto,
        ReceiptAdvanceDto,
        ReceiptDto,
        AdvanceStatisticsDto,
        Problem,
    ))
)]
pub struct ApiDoc;
