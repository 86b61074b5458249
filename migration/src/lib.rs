//! Database migrations for the Kontor ERP core service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_05_01_000001_create_users;
mod m2024_05_01_000002_create_employees;
mod m2024_05_01_000003_create_rbac;
mod m2024_05_01_000004_create_doc_sequences;
mod m2024_05_01_000005_create_approvals;
mod m2024_05_01_000006_create_leaves;
mod m2024_05_01_000007_create_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_05_01_000001_create_users::Migration),
            Box::new(m2024_05_01_000002_create_employees::Migration),
            Box::new(m2024_05_01_000003_create_rbac::Migration),
            Box::new(m2024_05_01_000004_create_doc_sequences::Migration),
            Box::new(m2024_05_01_000005_create_approvals::Migration),
            Box::new(m2024_05_01_000006_create_leaves::Migration),
            Box::new(m2024_05_01_000007_create_audit_logs::Migration),
        ]
    }
}
