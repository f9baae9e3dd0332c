//! SeaORM repositories over SQLite

use advance_service::contract::*;
use advance_service::domain::{Service, ServiceOptions, TracingEventPublisher};
use advance_service::infra::storage::migrations::Migrator;
use advance_service::domain::repository::RepaymentRepository;
use advance_service::infra::storage::{
    SeaOrmAdvanceRepository, SeaOrmEmployeeRepository, SeaOrmRepaymentRepository,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use uuid::Uuid;

mod common;
use common::{date, dec, new_advance, print_test_header, repayment};

async fn connect() -> Arc<DatabaseConnection> {
    // A single connection keeps every query on the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

async fn sqlite_service() -> Service {
    service_over(connect().await)
}

fn service_over(db: Arc<DatabaseConnection>) -> Service {
    Service::new(
        Arc::new(SeaOrmEmployeeRepository::new(db.clone())),
        Arc::new(SeaOrmAdvanceRepository::new(db.clone())),
        Arc::new(SeaOrmRepaymentRepository::new(db)),
        Arc::new(TracingEventPublisher),
        ServiceOptions::default(),
    )
}

async fn employee(service: &Service, code: &str) -> Employee {
    service
        .register_employee(NewEmployee {
            employee_code: code.to_string(),
            first_name: "Sara".to_string(),
            last_name: "Nasser".to_string(),
            designation: Some("Accountant".to_string()),
            basic_salary: Some(dec("9000")),
        })
        .await
        .unwrap()
}

async fn disbursed(service: &Service, employee_id: Uuid, amount: &str, deduction: &str) -> Uuid {
    let approver = Caller::user(Uuid::new_v4());
    let advance = service
        .request_advance(approver, employee_id, new_advance(amount, Some(deduction)))
        .await
        .unwrap();
    let id = advance.advance.id;
    service.approve_advance(approver, employee_id, id).await.unwrap();
    service.disburse_advance(approver, employee_id, id).await.unwrap();
    id
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = connect().await;
    Migrator::up(&*db, None).await.unwrap();
    assert!(Migrator::get_pending_migrations(&*db).await.unwrap().is_empty());
    assert_eq!(Migrator::get_applied_migrations(&*db).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_employee_roundtrip_and_unique_code() {
    let service = sqlite_service().await;
    let created = employee(&service, "EMP-1001").await;

    let loaded = service.get_employee(created.id).await.unwrap();
    assert_eq!(loaded.employee_code, "EMP-1001");
    assert_eq!(loaded.basic_salary, Some(dec("9000")));
    assert_eq!(loaded.full_name(), "Sara Nasser");

    let err = service
        .register_employee(NewEmployee {
            employee_code: "EMP-1001".to_string(),
            first_name: "Other".to_string(),
            last_name: "Person".to_string(),
            designation: None,
            basic_salary: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AdvancesError::Conflict { .. }));
}

#[tokio::test]
async fn test_lifecycle_persists_status_and_stamps() {
    let service = sqlite_service().await;
    let emp = employee(&service, "EMP-1002").await;
    let id = disbursed(&service, emp.id, "1000.50", "250").await;

    let summary = service.get_advance(emp.id, id).await.unwrap();
    assert_eq!(summary.advance.status, AdvanceStatus::Paid);
    assert_eq!(summary.advance.amount, dec("1000.50"));
    assert_eq!(summary.advance.payment_date, date(2024, 3, 1));
    assert!(summary.advance.approved_at.is_some());
    assert!(summary.advance.paid_at.is_some());
    assert_eq!(summary.estimated_months, Some(5));
}

#[tokio::test]
async fn test_ledger_balance_survives_reload() {
    print_test_header(
        "test_ledger_balance_survives_reload",
        "Balances are derived from stored ledger rows; reversed rows stop counting",
    );
    let service = sqlite_service().await;
    let emp = employee(&service, "EMP-1003").await;
    let id = disbursed(&service, emp.id, "1000", "200").await;
    let clerk = Caller::user(Uuid::new_v4());

    let first = service
        .record_repayment(clerk, emp.id, id, repayment("300", date(2024, 3, 31)))
        .await
        .unwrap();
    service
        .record_repayment(clerk, emp.id, id, repayment("200", date(2024, 4, 30)))
        .await
        .unwrap();

    let summary = service.get_advance(emp.id, id).await.unwrap();
    assert_eq!(summary.repaid_amount, dec("500"));
    assert_eq!(summary.remaining_balance, dec("500"));
    assert_eq!(summary.advance.status, AdvanceStatus::PartiallyRepaid);

    let reversed = service
        .reverse_repayment(
            Caller::admin(Uuid::new_v4()),
            emp.id,
            first.entry.id,
            Some("bank returned the transfer".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(reversed.remaining_balance, dec("800"));

    let summary = service.get_advance(emp.id, id).await.unwrap();
    assert_eq!(summary.repaid_amount, dec("200"));
    assert_eq!(summary.advance.status, AdvanceStatus::PartiallyRepaid);

    let history = service
        .repayment_history(emp.id, None, None)
        .await
        .unwrap();
    assert_eq!(history.total_entries, 1);
    assert_eq!(history.months[0].month, "2024-04");

    // The reversed entry keeps its receipt, with the reversal recorded
    let receipt = service
        .repayment_receipt(emp.id, first.entry.id)
        .await
        .unwrap();
    assert!(receipt.payment.reversed_at.is_some());
}

#[tokio::test]
async fn test_employee_repayment_is_written_atomically() {
    let service = sqlite_service().await;
    let emp = employee(&service, "EMP-1004").await;
    let a = disbursed(&service, emp.id, "400", "100").await;
    let b = disbursed(&service, emp.id, "600", "100").await;
    let clerk = Caller::user(Uuid::new_v4());

    let result = service
        .record_employee_repayment(clerk, emp.id, repayment("700", date(2024, 5, 1)))
        .await
        .unwrap();
    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.balance.total_remaining, dec("300"));

    let a = service.get_advance(emp.id, a).await.unwrap();
    let b = service.get_advance(emp.id, b).await.unwrap();
    assert_eq!(a.advance.status, AdvanceStatus::FullyRepaid);
    assert_eq!(b.remaining_balance, dec("300"));

    // Rejected plans leave no rows behind
    let err = service
        .record_employee_repayment(clerk, emp.id, repayment("301", date(2024, 5, 2)))
        .await
        .unwrap_err();
    assert!(matches!(err, AdvancesError::Validation { .. }));
    let history = service
        .repayment_history(emp.id, None, None)
        .await
        .unwrap();
    assert_eq!(history.total_entries, 2);
}

#[tokio::test]
async fn test_soft_delete_hides_advance_from_queries() {
    let service = sqlite_service().await;
    let emp = employee(&service, "EMP-1005").await;
    let clerk = Caller::user(Uuid::new_v4());
    let advance = service
        .request_advance(clerk, emp.id, new_advance("250", None))
        .await
        .unwrap();

    service
        .delete_advance(clerk, emp.id, advance.advance.id)
        .await
        .unwrap();

    let err = service
        .get_advance(emp.id, advance.advance.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AdvancesError::NotFound { .. }));
    let all = service.list_advances(AdvanceFilter::default()).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_list_filters_by_status_and_date() {
    let service = sqlite_service().await;
    let emp = employee(&service, "EMP-1006").await;
    let clerk = Caller::user(Uuid::new_v4());
    disbursed(&service, emp.id, "500", "100").await;
    service
        .request_advance(clerk, emp.id, new_advance("150", None))
        .await
        .unwrap();

    let paid = service
        .list_advances(AdvanceFilter {
            status: Some(AdvanceStatus::Paid),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].advance.amount, dec("500"));

    let today = chrono::Utc::now().date_naive();
    let created_today = service
        .list_advances(AdvanceFilter {
            created_from: Some(today),
            created_to: Some(today),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created_today.len(), 2);

    let none = service
        .list_advances(AdvanceFilter {
            created_to: Some(date(2000, 1, 1)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());

    let stats = service.statistics(AdvanceFilter::default()).await.unwrap();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_outstanding, dec("500"));
    assert_eq!(stats.total_amount_repaid, Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_repayments_over_a_connection_pool() {
    print_test_header(
        "test_concurrent_repayments_over_a_connection_pool",
        "Parallel repayments through a pooled file database never overdraw an advance",
    );
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("advances.db").display());
    let mut options = ConnectOptions::new(url);
    options.max_connections(5).sqlx_logging(false);
    let db = Arc::new(Database::connect(options).await.unwrap());
    Migrator::up(&*db, None).await.unwrap();

    let service = Arc::new(service_over(db.clone()));
    let emp = employee(&service, "EMP-1007").await;
    let id = disbursed(&service, emp.id, "1000", "100").await;
    let clerk = Caller::user(Uuid::new_v4());

    let tasks = (0..20).map(|_| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .record_repayment(clerk, emp.id, id, repayment("100", date(2024, 4, 1)))
                .await
        })
    });
    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let accepted: Vec<&RecordedRepayment> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(accepted.len(), 10);
    for result in &results {
        if let Err(err) = result {
            assert!(!matches!(err, AdvancesError::Internal), "unexpected {:?}", err);
        }
    }

    let entries = SeaOrmRepaymentRepository::new(db)
        .entries_for_advance(id)
        .await
        .unwrap();
    let booked: Decimal = entries.iter().map(|e| e.amount).sum();
    assert_eq!(entries.len(), 10);
    assert_eq!(booked, dec("1000"));

    // Every read path agrees on the final ledger
    let summary = service.get_advance(emp.id, id).await.unwrap();
    assert_eq!(summary.repaid_amount, dec("1000"));
    assert_eq!(summary.remaining_balance, Decimal::ZERO);
    assert_eq!(summary.advance.status, AdvanceStatus::FullyRepaid);

    let balance = service.employee_balance(emp.id).await.unwrap();
    assert_eq!(balance.total_remaining, Decimal::ZERO);

    let history = service
        .repayment_history(emp.id, None, Some(50))
        .await
        .unwrap();
    assert_eq!(history.total_entries, 10);
    let history_total: Decimal = history.months.iter().map(|m| m.total_amount).sum();
    assert_eq!(history_total, dec("1000"));

    let receipt = service
        .repayment_receipt(emp.id, accepted[0].entry.id)
        .await
        .unwrap();
    assert_eq!(receipt.advance.repaid_to_date, dec("1000"));
    assert_eq!(receipt.advance.current_balance, Decimal::ZERO);
}
