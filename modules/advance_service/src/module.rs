//! Module wiring: storage, domain service, clients and routes

use crate::api::native::NativeClient;
use crate::config::Config;
use crate::contract::client::AdvancesApi;
use crate::domain::{Service, TracingEventPublisher};
use crate::infra::storage::{
    migrations::Migrator, SeaOrmAdvanceRepository, SeaOrmEmployeeRepository,
    SeaOrmRepaymentRepository,
};
use anyhow::Result;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// Advance service module
pub struct AdvancesModule {
    db: Arc<DatabaseConnection>,
    service: Arc<Service>,
}

impl AdvancesModule {
    /// Build repositories and the domain service on top of `db`
    pub fn new(db: Arc<DatabaseConnection>, config: Config) -> Result<Self> {
        config.validate()?;

        let employee_repo = Arc::new(SeaOrmEmployeeRepository::new(db.clone()));
        let advance_repo = Arc::new(SeaOrmAdvanceRepository::new(db.clone()));
        let repayment_repo = Arc::new(SeaOrmRepaymentRepository::new(db.clone()));
        let event_publisher = Arc::new(TracingEventPublisher);

        let service = Arc::new(Service::new(
            employee_repo,
            advance_repo,
            repayment_repo,
            event_publisher,
            config.into_options(),
        ));

        tracing::info!("Advance service initialized");
        Ok(Self { db, service })
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        Migrator::up(&*self.db, None).await?;
        tracing::info!("Advance service migrations completed");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// In-process client for other modules
    pub fn client(&self) -> Arc<dyn AdvancesApi> {
        Arc::new(NativeClient::new(self.service.clone()))
    }

    /// Mount the REST routes on `router`
    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        tracing::info!("Registering advance service REST routes");
        crate::api::rest::routes::register_routes(router, self.service.clone())
    }
}
