//! SeaORM entities for database tables

use sea_orm::entity::prelude::*;

/// Advance payments table entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "advance_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub employee_id: Uuid,

    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,

    pub reason: String,

    /// Lifecycle status (`pending`, `approved`, ...)
    pub status: String,

    pub payment_date: Date,

    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub monthly_deduction: Option<Decimal>,

    pub repayment_date: Option<Date>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeUtc>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeUtc>,
    pub rejection_reason: Option<String>,
    pub paid_by: Option<Uuid>,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,

    /// Soft delete timestamp
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Foreign key to employees
    #[sea_orm(
        belongs_to = "employee::Entity",
        from = "Column::EmployeeId",
        to = "employee::Column::Id"
    )]
    Employee,

    /// Ledger entries booked against the advance
    #[sea_orm(has_many = "repayment::Entity")]
    Repayments,
}

impl Related<employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<repayment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Employee directory module
pub mod employee {
    use sea_orm::entity::prelude::*;

    /// Employees table entity
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "employees")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        /// Business code (unique)
        #[sea_orm(unique)]
        pub employee_code: String,

        pub first_name: String,
        pub last_name: String,
        pub designation: Option<String>,

        #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
        pub basic_salary: Option<Decimal>,

        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::Entity")]
        Advances,
    }

    impl Related<super::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Advances.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Repayment ledger module
pub mod repayment {
    use sea_orm::entity::prelude::*;

    /// Repayment ledger table entity (append-only, reversals are marked)
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "advance_repayments")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        pub advance_id: Uuid,

        /// Copied from the locked parent advance
        pub employee_id: Uuid,

        #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
        pub amount: Decimal,

        pub payment_date: Date,
        pub notes: Option<String>,
        pub recorded_by: Uuid,
        pub created_at: DateTimeUtc,
        pub reversed_by: Option<Uuid>,
        pub reversed_at: Option<DateTimeUtc>,
        pub reversal_reason: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::Entity",
            from = "Column::AdvanceId",
            to = "super::Column::Id"
        )]
        Advance,
    }

    impl Related<super::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Advance.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
