//! # Permission Evaluation
//!
//! Pure role/permission decision logic shared by the auth middleware and by
//! handlers that need finer checks than the method-derived default. Nothing
//! here touches the database; callers supply the session's resolved roles
//! and grants. Only the server-side invocation is a security boundary; any
//! client consuming the same rules does so for UX only.

use axum::http::Method;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role names that bypass every permission check. The localized literal is
/// kept alongside the English one because existing deployments carry both.
pub const SUPER_ADMIN_ROLES: [&str; 2] = ["SYSTEM_ADMIN", "시스템관리자"];

/// Role name granting read and approve on every module.
pub const DEPT_HEAD_ROLE: &str = "DEPT_HEAD";

/// API version prefix stripped before path-to-module matching.
const API_PREFIX: &str = "/api/v1";

/// Fixed path-prefix to module table; prefixes are disjoint so order does
/// not matter beyond first-match.
const MODULE_TABLE: [(&str, &str); 8] = [
    ("/accounting", "accounting"),
    ("/hr", "hr"),
    ("/inventory", "inventory"),
    ("/sales", "sales"),
    ("/approval", "approval"),
    ("/board", "board"),
    ("/projects", "projects"),
    ("/admin", "admin"),
];

/// The module names grantable through permissions, in table order.
pub fn known_modules() -> [&'static str; 8] {
    MODULE_TABLE.map(|(_, module)| module)
}

/// Permission verb applied to a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Export,
    Import,
    Approve,
}

impl Action {
    /// Every grantable verb.
    pub const ALL: [Action; 7] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Export,
        Action::Import,
        Action::Approve,
    ];

    /// Default action implied by the HTTP method of a request.
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Read),
            Method::POST => Some(Self::Create),
            Method::PUT | Method::PATCH => Some(Self::Update),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Import => "import",
            Self::Approve => "approve",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "read" => Some(Self::Read),
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            "approve" => Some(Self::Approve),
            _ => None,
        }
    }
}

/// An explicit (module, action) grant resolved into the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionGrant {
    pub module: String,
    pub action: Action,
}

/// Decide whether the given roles/grants permit `action` on `module`.
///
/// Evaluated in strict order, first match wins:
/// 1. a super-admin marker role allows everything;
/// 2. the department-head marker allows read and approve on any module;
/// 3. otherwise an exact (module, action) grant is required.
pub fn has_permission(
    grants: &[PermissionGrant],
    roles: &[String],
    module: &str,
    action: Action,
) -> bool {
    if roles
        .iter()
        .any(|role| SUPER_ADMIN_ROLES.contains(&role.as_str()))
    {
        return true;
    }

    if roles.iter().any(|role| role == DEPT_HEAD_ROLE)
        && matches!(action, Action::Read | Action::Approve)
    {
        return true;
    }

    grants
        .iter()
        .any(|grant| grant.module == module && grant.action == action)
}

/// Map a request path to the module whose permission it requires.
///
/// Returns `None` for module-less routes (dashboard, search, notifications),
/// which are session-gated but permission-exempt.
pub fn module_from_path(pathname: &str) -> Option<&'static str> {
    let rest = pathname.strip_prefix(API_PREFIX).unwrap_or(pathname);

    for (prefix, module) in MODULE_TABLE {
        if let Some(tail) = rest.strip_prefix(prefix) {
            // "/hr" must match "/hr" and "/hr/...", never "/hrx".
            if tail.is_empty() || tail.starts_with('/') {
                return Some(module);
            }
        }
    }

    None
}
