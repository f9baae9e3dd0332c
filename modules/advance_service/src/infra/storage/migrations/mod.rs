//! Database migrations for advance service

use sea_orm_migration::prelude::*;

mod m20240301_000001_create_employees;
mod m20240301_000002_create_advance_payments;
mod m20240301_000003_create_advance_repayments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_employees::Migration),
            Box::new(m20240301_000002_create_advance_payments::Migration),
            Box::new(m20240301_000003_create_advance_repayments::Migration),
        ]
    }
}
