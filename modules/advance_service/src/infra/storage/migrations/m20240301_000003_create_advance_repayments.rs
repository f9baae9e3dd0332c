use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdvanceRepayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdvanceRepayments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdvanceRepayments::AdvanceId).uuid().not_null())
                    .col(ColumnDef::new(AdvanceRepayments::EmployeeId).uuid().not_null())
                    .col(
                        ColumnDef::new(AdvanceRepayments::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AdvanceRepayments::PaymentDate).date().not_null())
                    .col(ColumnDef::new(AdvanceRepayments::Notes).string_len(500))
                    .col(ColumnDef::new(AdvanceRepayments::RecordedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(AdvanceRepayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AdvanceRepayments::ReversedBy).uuid())
                    .col(ColumnDef::new(AdvanceRepayments::ReversedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdvanceRepayments::ReversalReason).string_len(255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_advance_repayments_advance")
                            .from(AdvanceRepayments::Table, AdvanceRepayments::AdvanceId)
                            .to(AdvancePayments::Table, AdvancePayments::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_advance_repayments_employee")
                            .from(AdvanceRepayments::Table, AdvanceRepayments::EmployeeId)
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
                    .name("idx_advance_repayments_advance_id")
                    .table(AdvanceRepayments::Table)
                    .col(AdvanceRepayments::AdvanceId)
                    .to_owned(),
            )
            .await?;

        // Per-employee history, newest payment first
        manager
            .create_index(
                Index::create()
                    .name("idx_advance_repayments_employee_payment_date")
                    .table(AdvanceRepayments::Table)
                    .col(AdvanceRepayments::EmployeeId)
                    .col(AdvanceRepayments::PaymentDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdvanceRepayments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdvanceRepayments {
    Table,
    Id,
    AdvanceId,
    EmployeeId,
    Amount,
    PaymentDate,
    Notes,
    RecordedBy,
    CreatedAt,
    ReversedBy,
    ReversedAt,
    ReversalReason,
}

#[derive(DeriveIden)]
enum AdvancePayments {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
}
