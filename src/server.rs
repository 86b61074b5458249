//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Kontor
//! API: shared state, the router with its middleware stack, and the OpenAPI
//! document.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::audit::{self, AuditSink};
use crate::auth;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub audit: AuditSink,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let audit = AuditSink::new(db.clone());
        Self {
            config: Arc::new(config),
            db,
            audit,
        }
    }
}

/// Assign each request a correlation id, visible to error envelopes via the
/// task-local trace context and echoed back in the `x-trace-id` header.
async fn trace_context_middleware(req: Request, next: Next) -> Response {
    let trace_id = format!("req-{}", &Uuid::new_v4().to_string()[..8]);
    let context = TraceContext {
        trace_id: trace_id.clone(),
    };

    let mut response = telemetry::with_trace_context(context, next.run(req)).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("x-trace-id", value);
    }
    response
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    // Session auth runs outermost, then the module permission gate, then
    // the audit trail (which needs the resolved actor).
    let api = Router::new()
        .route(
            "/approval/documents",
            post(handlers::approvals::create_document).get(handlers::approvals::list_documents),
        )
        .route(
            "/approval/documents/{id}",
            get(handlers::approvals::get_document),
        )
        .route(
            "/approval/documents/{id}/decision",
            post(handlers::approvals::decide_document),
        )
        .route(
            "/approval/documents/{id}/cancel",
            post(handlers::approvals::cancel_document),
        )
        .route("/hr/leaves/batch", post(handlers::leaves::batch_process_leaves))
        .route(
            "/admin/roles",
            get(handlers::admin::list_roles).post(handlers::admin::create_role),
        )
        .route("/admin/roles/{id}", delete(handlers::admin::delete_role))
        .route(
            "/admin/roles/{id}/permissions",
            put(handlers::admin::set_role_permissions),
        )
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notifications::mark_notification_read),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            audit::audit_middleware,
        ))
        .layer(middleware::from_fn(auth::permission_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(config, db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::approvals::create_document,
        crate::handlers::approvals::list_documents,
        crate::handlers::approvals::get_document,
        crate::handlers::approvals::decide_document,
        crate::handlers::approvals::cancel_document,
        crate::handlers::leaves::batch_process_leaves,
        crate::handlers::admin::list_roles,
        crate::handlers::admin::create_role,
        crate::handlers::admin::delete_role,
        crate::handlers::admin::set_role_permissions,
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_notification_read,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::models::DocumentStatus,
            crate::models::Urgency,
            crate::models::ApprovalType,
            crate::models::StepStatus,
            crate::models::LeaveStatus,
            crate::models::approval_document::Model,
            crate::models::approval_step::Model,
            crate::models::leave::Model,
            crate::models::notification::Model,
            crate::models::role::Model,
            crate::rbac::Action,
            crate::repositories::StepSpec,
            crate::repositories::Decision,
            crate::repositories::LeaveAction,
            crate::repositories::BatchOutcome,
            crate::handlers::approvals::CreateDocumentBody,
            crate::handlers::approvals::DecisionBody,
            crate::handlers::approvals::DocumentWithSteps,
            crate::handlers::leaves::LeaveBatchBody,
            crate::handlers::admin::CreateRoleBody,
            crate::handlers::admin::PermissionPair,
            crate::handlers::admin::RolePermissionsBody,
        )
    ),
    info(
        title = "Kontor API",
        description = "ERP core service: approvals, HR, RBAC and audit",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
