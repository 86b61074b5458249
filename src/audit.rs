//! # Audit and Notification Side Effects
//!
//! Best-effort persistence of audit log entries and user notifications.
//! Writes are spawned onto the runtime and never awaited by business
//! callers; a failed write is logged and swallowed so the primary
//! operation's outcome is unaffected.
//!
//! Also hosts the request-level audit middleware, which derives the audit
//! action from the HTTP method and recovers the affected record id by
//! inspecting the buffered JSON response envelope.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::models::{audit_log, notification, role};
use crate::rbac;
use crate::server::AppState;

/// Identity attached to a request for audit attribution.
#[derive(Debug, Clone, Default)]
pub struct RequestActor {
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

/// One audit log entry, before persistence.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// CREATE/UPDATE/DELETE or a domain verb such as APPROVE
    pub action: String,
    pub table_name: String,
    pub record_id: Option<String>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
}

/// A notification to deliver to a user account.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_url: Option<String>,
}

/// Fire-and-forget writer for audit logs and notifications.
#[derive(Clone)]
pub struct AuditSink {
    db: DatabaseConnection,
}

impl AuditSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist an audit entry in the background. Never blocks the caller
    /// and never reports failure to it.
    pub fn record(&self, actor: &RequestActor, entry: AuditEntry) {
        let db = self.db.clone();
        let user_id = actor.user_id;
        let ip_address = actor.ip_address.clone();

        tokio::spawn(async move {
            let row = audit_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                action: Set(entry.action),
                table_name: Set(entry.table_name),
                record_id: Set(entry.record_id),
                old_value: Set(entry.old_value),
                new_value: Set(entry.new_value),
                ip_address: Set(ip_address),
                created_at: Set(Utc::now().into()),
            };

            if let Err(err) = row.insert(&db).await {
                tracing::warn!(error = %err, "failed to persist audit log entry");
            }
        });
    }

    /// Deliver a notification in the background, same failure policy as
    /// [`AuditSink::record`].
    pub fn notify(&self, notification: NewNotification) {
        let db = self.db.clone();

        tokio::spawn(async move {
            let row = notification::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(notification.user_id),
                notification_type: Set(notification.notification_type),
                title: Set(notification.title),
                message: Set(notification.message),
                related_url: Set(notification.related_url),
                is_read: Set(false),
                created_at: Set(Utc::now().into()),
            };

            if let Err(err) = row.insert(&db).await {
                tracing::warn!(error = %err, "failed to persist notification");
            }
        });
    }
}

/// Snapshot the row an update or delete is about to touch.
///
/// Keyed on the first UUID path segment; covers the modules whose routes
/// mutate existing rows. Unknown modules, malformed ids, and lookup
/// failures all yield `None` so the request is never delayed by auditing
/// concerns.
async fn prior_state(db: &DatabaseConnection, module: &str, path: &str) -> Option<serde_json::Value> {
    let id = path
        .split('/')
        .find_map(|segment| segment.parse::<Uuid>().ok())?;

    match module {
        "admin" => {
            let row = role::Entity::find_by_id(id).one(db).await.ok()??;
            serde_json::to_value(&row).ok()
        }
        _ => None,
    }
}

/// Request-level audit trail for mutating endpoints.
///
/// GET and unmapped methods pass through untouched. Updates and deletes
/// snapshot the target row before the handler runs so the entry carries a
/// "before" value. For successful mutations the JSON response envelope is
/// buffered (up to the configured size) and inspected for `data.id`, so
/// generic handlers get a usable record id without handler cooperation.
/// Bodies that are streaming or larger than the cap are audited without a
/// record id rather than buffered.
pub async fn audit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let action = match rbac::Action::from_method(req.method()) {
        Some(action) if action != rbac::Action::Read => action,
        _ => return next.run(req).await,
    };

    let table_name = rbac::module_from_path(req.uri().path())
        .unwrap_or("system")
        .to_string();
    let actor = req
        .extensions()
        .get::<RequestActor>()
        .cloned()
        .unwrap_or_default();

    let old_value = if matches!(action, rbac::Action::Update | rbac::Action::Delete) {
        prior_state(&state.db, &table_name, req.uri().path()).await
    } else {
        None
    };

    let response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    let limit = state.config.audit_max_body_kb * 1024;
    let content_length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    let inspectable = matches!(content_length, Some(len) if len <= limit);
    if !inspectable {
        state.audit.record(
            &actor,
            AuditEntry {
                action: action.as_str().to_uppercase(),
                table_name,
                record_id: None,
                old_value,
                new_value: None,
            },
        );
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to buffer response body for audit");
            axum::body::Bytes::new()
        }
    };

    let mut record_id = None;
    let mut new_value = None;
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
        if value.get("success").and_then(|v| v.as_bool()) == Some(true) {
            if let Some(data) = value.get("data") {
                record_id = data.get("id").map(|id| match id {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                if matches!(action, rbac::Action::Create | rbac::Action::Update) {
                    new_value = Some(data.clone());
                }
            }
        }
    }

    state.audit.record(
        &actor,
        AuditEntry {
            action: action.as_str().to_uppercase(),
            table_name,
            record_id,
            old_value,
            new_value,
        },
    );

    Response::from_parts(parts, Body::from(bytes))
}
