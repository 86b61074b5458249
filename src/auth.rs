//! # Authentication and Authorization Middleware
//!
//! Two request layers: session authentication (opaque bearer token resolved
//! against the sessions table) and the module permission gate. The gate
//! maps the request path to a business module and the method to an action
//! verb; requests outside any module (service info, notifications) pass
//! through with authentication only.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::audit::RequestActor;
use crate::error::{self, ApiError};
use crate::rbac::{self, PermissionGrant};
use crate::repositories::{SessionIdentity, SessionRepository};
use crate::server::AppState;

/// Authenticated request identity, injected by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    /// Linked employee record, required for approval and HR operations
    pub employee_id: Option<Uuid>,
    pub display_name: String,
    pub roles: Vec<String>,
    pub grants: Vec<PermissionGrant>,
}

impl From<SessionIdentity> for AuthSession {
    fn from(identity: SessionIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            employee_id: identity.employee_id,
            display_name: identity.display_name,
            roles: identity.roles,
            grants: identity.grants,
        }
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| error::unauthorized(None))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the bearer token into an [`AuthSession`] and attach it, together
/// with the audit [`RequestActor`], to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(req.headers()).map(str::to_string) else {
        return Err(error::unauthorized(Some("Missing bearer token")));
    };

    let identity = SessionRepository::new(state.db.clone())
        .resolve(&token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| error::unauthorized(Some("Invalid or expired session")))?;

    let actor = RequestActor {
        user_id: Some(identity.user_id),
        ip_address: client_ip(req.headers()),
    };

    req.extensions_mut().insert(AuthSession::from(identity));
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

/// Module permission gate. Runs after [`auth_middleware`].
///
/// Requests whose path maps to no module, or whose method maps to no
/// action, are not gated here.
pub async fn permission_middleware(req: Request, next: Next) -> Result<Response, ApiError> {
    let Some(module) = rbac::module_from_path(req.uri().path()) else {
        return Ok(next.run(req).await);
    };
    let Some(action) = rbac::Action::from_method(req.method()) else {
        return Ok(next.run(req).await);
    };

    let session = req
        .extensions()
        .get::<AuthSession>()
        .ok_or_else(|| error::unauthorized(None))?;

    if !rbac::has_permission(&session.grants, &session.roles, module, action) {
        tracing::debug!(
            user_id = %session.user_id,
            module,
            action = action.as_str(),
            "permission denied"
        );
        return Err(error::forbidden(None));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use crate::rbac::Action;
    use tower::ServiceExt;

    fn session(roles: &[&str], grants: Vec<PermissionGrant>) -> AuthSession {
        AuthSession {
            user_id: Uuid::new_v4(),
            employee_id: None,
            display_name: "Tester".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            grants,
        }
    }

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn gated_router(session: AuthSession) -> Router {
        Router::new()
            .route("/api/v1/hr/leaves", get(ok_handler).post(ok_handler))
            .route("/api/v1/notifications", get(ok_handler))
            .layer(middleware::from_fn(permission_middleware))
            .layer(Extension(session))
    }

    async fn status_of(router: Router, method: &str, uri: &str) -> StatusCode {
        let response = router
            .oneshot(
                HttpRequest::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), None);

        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("10.0.0.1".to_string()));
    }

    #[tokio::test]
    async fn super_admin_passes_everything() {
        let router = gated_router(session(&["SYSTEM_ADMIN"], vec![]));
        assert_eq!(
            status_of(router.clone(), "POST", "/api/v1/hr/leaves").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(router, "GET", "/api/v1/hr/leaves").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn dept_head_reads_but_does_not_create() {
        let router = gated_router(session(&["DEPT_HEAD"], vec![]));
        assert_eq!(
            status_of(router.clone(), "GET", "/api/v1/hr/leaves").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(router, "POST", "/api/v1/hr/leaves").await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn exact_grant_is_required_otherwise() {
        let granted = session(
            &[],
            vec![PermissionGrant {
                module: "hr".to_string(),
                action: Action::Create,
            }],
        );
        let router = gated_router(granted);
        assert_eq!(
            status_of(router.clone(), "POST", "/api/v1/hr/leaves").await,
            StatusCode::OK
        );
        // Same module, different verb.
        assert_eq!(
            status_of(router, "GET", "/api/v1/hr/leaves").await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn module_less_paths_skip_the_gate() {
        let router = gated_router(session(&[], vec![]));
        assert_eq!(
            status_of(router, "GET", "/api/v1/notifications").await,
            StatusCode::OK
        );
    }
}
