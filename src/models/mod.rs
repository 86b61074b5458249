//! # Data Models
//!
//! This module contains all the SeaORM entity models used throughout the
//! Kontor ERP core service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod approval_document;
pub mod approval_step;
pub mod audit_log;
pub mod doc_sequence;
pub mod employee;
pub mod leave;
pub mod leave_balance;
pub mod notification;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod session;
pub mod user;
pub mod user_permission;
pub mod user_role;

pub use approval_document::{DocumentStatus, Entity as ApprovalDocument, Urgency};
pub use approval_step::{ApprovalType, Entity as ApprovalStep, StepStatus};
pub use audit_log::Entity as AuditLog;
pub use doc_sequence::Entity as DocSequence;
pub use employee::Entity as Employee;
pub use leave::{Entity as Leave, LeaveStatus};
pub use leave_balance::Entity as LeaveBalance;
pub use notification::Entity as Notification;
pub use permission::Entity as Permission;
pub use role::Entity as Role;
pub use role_permission::Entity as RolePermission;
pub use session::Entity as Session;
pub use user::Entity as User;
pub use user_permission::Entity as UserPermission;
pub use user_role::Entity as UserRole;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "kontor".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
