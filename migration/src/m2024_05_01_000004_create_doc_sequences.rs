//! Migration to create the doc_sequences table.
//!
//! One row per (prefix, year_month) bucket holding the last issued sequence
//! number. The composite primary key is what the allocator's atomic
//! upsert-increment conflicts on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocSequences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DocSequences::Prefix).text().not_null())
                    .col(ColumnDef::new(DocSequences::YearMonth).text().not_null())
                    .col(
                        ColumnDef::new(DocSequences::LastSeq)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DocSequences::Prefix)
                            .col(DocSequences::YearMonth),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocSequences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocSequences {
    Table,
    Prefix,
    YearMonth,
    LastSeq,
}
