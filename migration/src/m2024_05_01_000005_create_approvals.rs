//! Migration to create the approval_documents and approval_steps tables.
//!
//! An approval document owns an ordered chain of steps; step order is unique
//! and contiguous per document, enforced here with a composite unique index.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApprovalDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalDocuments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::DocumentNo)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApprovalDocuments::Title).text().not_null())
                    .col(
                        ColumnDef::new(ApprovalDocuments::Content)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::DrafterId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::DraftDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::Status)
                            .text()
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::TotalSteps)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::Urgency)
                            .text()
                            .not_null()
                            .default("NORMAL"),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::RelatedModule)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(ApprovalDocuments::RelatedId).uuid().null())
                    .col(
                        ColumnDef::new(ApprovalDocuments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ApprovalDocuments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_documents_drafter_id")
                            .from(ApprovalDocuments::Table, ApprovalDocuments::DrafterId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_documents_document_no")
                    .table(ApprovalDocuments::Table)
                    .col(ApprovalDocuments::DocumentNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApprovalSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalSteps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApprovalSteps::DocumentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalSteps::StepOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalSteps::ApproverId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalSteps::ApprovalType)
                            .text()
                            .not_null()
                            .default("APPROVE"),
                    )
                    .col(
                        ColumnDef::new(ApprovalSteps::Status)
                            .text()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(ApprovalSteps::Comment).text().null())
                    .col(
                        ColumnDef::new(ApprovalSteps::ActedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_steps_document_id")
                            .from(ApprovalSteps::Table, ApprovalSteps::DocumentId)
                            .to(ApprovalDocuments::Table, ApprovalDocuments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_steps_approver_id")
                            .from(ApprovalSteps::Table, ApprovalSteps::ApproverId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_steps_document_order")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::DocumentId)
                    .col(ApprovalSteps::StepOrder)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_approval_steps_document_order")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalSteps::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_approval_documents_document_no")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalDocuments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApprovalDocuments {
    Table,
    Id,
    DocumentNo,
    Title,
    Content,
    DrafterId,
    DraftDate,
    Status,
    TotalSteps,
    Urgency,
    RelatedModule,
    RelatedId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApprovalSteps {
    Table,
    Id,
    DocumentId,
    StepOrder,
    ApproverId,
    ApprovalType,
    Status,
    Comment,
    ActedAt,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
}
