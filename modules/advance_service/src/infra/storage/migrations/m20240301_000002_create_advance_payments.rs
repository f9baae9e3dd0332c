use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdvancePayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdvancePayments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdvancePayments::EmployeeId).uuid().not_null())
                    .col(
                        ColumnDef::new(AdvancePayments::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdvancePayments::Reason)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdvancePayments::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(AdvancePayments::PaymentDate).date().not_null())
                    .col(ColumnDef::new(AdvancePayments::MonthlyDeduction).decimal_len(14, 2))
                    .col(ColumnDef::new(AdvancePayments::RepaymentDate).date())
                    .col(ColumnDef::new(AdvancePayments::ApprovedBy).uuid())
                    .col(ColumnDef::new(AdvancePayments::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdvancePayments::RejectedBy).uuid())
                    .col(ColumnDef::new(AdvancePayments::RejectedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdvancePayments::RejectionReason).string_len(255))
                    .col(ColumnDef::new(AdvancePayments::PaidBy).uuid())
                    .col(ColumnDef::new(AdvancePayments::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AdvancePayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AdvancePayments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AdvancePayments::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_advance_payments_employee")
                            .from(AdvancePayments::Table, AdvancePayments::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_advance_payments_employee_id")
                    .table(AdvancePayments::Table)
                    .col(AdvancePayments::EmployeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_advance_payments_status")
                    .table(AdvancePayments::Table)
                    .col(AdvancePayments::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdvancePayments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdvancePayments {
    Table,
    Id,
    EmployeeId,
    Amount,
    Reason,
    Status,
    PaymentDate,
    MonthlyDeduction,
    RepaymentDate,
    ApprovedBy,
    ApprovedAt,
    RejectedBy,
    RejectedAt,
    RejectionReason,
    PaidBy,
    PaidAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
}
