//! Migration to create the leaves and leave_balances tables.
//!
//! Leave balances are tracked per (employee, year); the remaining-days
//! invariant is enforced by the guarded atomic update in the leave
//! repository, not by a check constraint, to keep SQLite parity.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Leaves::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Leaves::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Leaves::EmployeeId).uuid().not_null())
                    .col(
                        ColumnDef::new(Leaves::LeaveType)
                            .text()
                            .not_null()
                            .default("ANNUAL"),
                    )
                    .col(ColumnDef::new(Leaves::StartDate).date().not_null())
                    .col(ColumnDef::new(Leaves::EndDate).date().not_null())
                    .col(ColumnDef::new(Leaves::Days).double().not_null())
                    .col(ColumnDef::new(Leaves::Reason).text().null())
                    .col(
                        ColumnDef::new(Leaves::Status)
                            .text()
                            .not_null()
                            .default("REQUESTED"),
                    )
                    .col(
                        ColumnDef::new(Leaves::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Leaves::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leaves_employee_id")
                            .from(Leaves::Table, Leaves::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leaves_employee_id")
                    .table(Leaves::Table)
                    .col(Leaves::EmployeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveBalances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveBalances::EmployeeId).uuid().not_null())
                    .col(ColumnDef::new(LeaveBalances::Year).integer().not_null())
                    .col(ColumnDef::new(LeaveBalances::TotalDays).double().not_null())
                    .col(
                        ColumnDef::new(LeaveBalances::UsedDays)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::RemainingDays)
                            .double()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_balances_employee_id")
                            .from(LeaveBalances::Table, LeaveBalances::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_balances_employee_year")
                    .table(LeaveBalances::Table)
                    .col(LeaveBalances::EmployeeId)
                    .col(LeaveBalances::Year)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_leave_balances_employee_year")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(LeaveBalances::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_leaves_employee_id").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Leaves::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Leaves {
    Table,
    Id,
    EmployeeId,
    LeaveType,
    StartDate,
    EndDate,
    Days,
    Reason,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LeaveBalances {
    Table,
    Id,
    EmployeeId,
    Year,
    TotalDays,
    UsedDays,
    RemainingDays,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
}
