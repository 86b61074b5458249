//! Integration tests for the HTTP API: authentication, the permission
//! gate, approval workflow, leave batches, role administration, and
//! notifications, all exercised through the full router.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use kontor::config::AppConfig;
use kontor::migration::{Migrator, MigratorTrait};
use kontor::models::{
    LeaveStatus, audit_log, employee, leave, leave_balance, notification, permission, role, user,
    user_permission, user_role,
};
use kontor::repositories::SessionRepository;
use kontor::seeds;
use kontor::server::{AppState, create_app};

async fn setup() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    seeds::seed_rbac(&db).await.unwrap();

    let config = AppConfig {
        profile: "test".to_string(),
        ..Default::default()
    };
    let app = create_app(AppState::new(config, db.clone()));
    (app, db)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_user(db: &DatabaseConnection, name: &str) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(format!("{}-{}", name, Uuid::new_v4())),
        display_name: Set(name.to_string()),
        email: Set(None),
        active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap()
}

async fn create_employee(db: &DatabaseConnection, user_id: Option<Uuid>, name: &str) -> employee::Model {
    employee::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
        department: Set(None),
        position: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap()
}

async fn assign_role(db: &DatabaseConnection, user_id: Uuid, role_name: &str) {
    let role_row = match role::Entity::find()
        .filter(role::Column::Name.eq(role_name))
        .one(db)
        .await
        .unwrap()
    {
        Some(row) => row,
        None => role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(role_name.to_string()),
            description: Set(None),
            is_system: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .unwrap(),
    };

    user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_row.id),
    }
    .insert(db)
    .await
    .unwrap();
}

async fn grant(db: &DatabaseConnection, user_id: Uuid, module: &str, action: &str) {
    let permission_row = permission::Entity::find()
        .filter(permission::Column::Module.eq(module))
        .filter(permission::Column::Action.eq(action))
        .one(db)
        .await
        .unwrap()
        .expect("permission matrix is seeded");

    user_permission::ActiveModel {
        user_id: Set(user_id),
        permission_id: Set(permission_row.id),
    }
    .insert(db)
    .await
    .unwrap();
}

async fn token_for(db: &DatabaseConnection, user_id: Uuid) -> String {
    SessionRepository::new(db.clone())
        .create_session(user_id, 3600, None)
        .await
        .unwrap()
        .1
}

#[tokio::test]
async fn public_endpoints_and_error_envelope() {
    let (app, _db) = setup().await;

    let (status, body) = request(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], json!("kontor"));

    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));

    // Anything under /api/v1 requires a session and fails in the envelope.
    let (status, body) = request(&app, "GET", "/api/v1/admin/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
    assert!(body["error"].get("status").is_none());

    let (status, body) = request(&app, "GET", "/api/v1/admin/roles", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
}

#[tokio::test]
async fn permission_gate_enforces_role_precedence() {
    let (app, db) = setup().await;

    let nobody = create_user(&db, "nobody").await;
    let nobody_token = token_for(&db, nobody.id).await;
    let (status, body) = request(&app, "GET", "/api/v1/admin/roles", Some(&nobody_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("FORBIDDEN"));

    let head = create_user(&db, "head").await;
    assign_role(&db, head.id, "DEPT_HEAD").await;
    let head_token = token_for(&db, head.id).await;
    let (status, _) = request(&app, "GET", "/api/v1/admin/roles", Some(&head_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/admin/roles",
        Some(&head_token),
        Some(json!({ "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = create_user(&db, "admin").await;
    assign_role(&db, admin.id, "SYSTEM_ADMIN").await;
    let admin_token = token_for(&db, admin.id).await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/admin/roles",
        Some(&admin_token),
        Some(json!({ "name": "AUDITORS" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], json!("AUDITORS"));
}

#[tokio::test]
async fn approval_flow_end_to_end() {
    let (app, db) = setup().await;

    let drafter = create_user(&db, "drafter").await;
    create_employee(&db, Some(drafter.id), "Drafter").await;
    grant(&db, drafter.id, "approval", "create").await;
    grant(&db, drafter.id, "approval", "read").await;
    let drafter_token = token_for(&db, drafter.id).await;

    let first = create_user(&db, "first").await;
    let first_emp = create_employee(&db, Some(first.id), "First").await;
    grant(&db, first.id, "approval", "create").await;
    let first_token = token_for(&db, first.id).await;

    let second = create_user(&db, "second").await;
    let second_emp = create_employee(&db, Some(second.id), "Second").await;
    grant(&db, second.id, "approval", "create").await;
    let second_token = token_for(&db, second.id).await;

    // Chain submitted as [second, first]: submission order wins.
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/approval/documents",
        Some(&drafter_token),
        Some(json!({
            "title": "Purchase request",
            "content": "Two laptops",
            "draftDate": "2024-06-10",
            "steps": [
                { "approverId": second_emp.id, "approvalType": "APPROVE" },
                { "approverId": first_emp.id, "approvalType": "APPROVE" },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["document_no"], json!("APR-202406-00001"));
    assert_eq!(body["data"]["status"], json!("DRAFT"));
    assert_eq!(body["data"]["steps"][0]["approver_id"], json!(second_emp.id));
    assert_eq!(body["data"]["steps"][1]["approver_id"], json!(first_emp.id));
    let document_id = body["data"]["id"].as_str().unwrap().to_string();

    // Step 2's approver cannot jump the queue.
    let decision_uri = format!("/api/v1/approval/documents/{}/decision", document_id);
    let (status, body) = request(
        &app,
        "POST",
        &decision_uri,
        Some(&first_token),
        Some(json!({ "decision": "APPROVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("FORBIDDEN"));

    let (status, body) = request(
        &app,
        "POST",
        &decision_uri,
        Some(&second_token),
        Some(json!({ "decision": "APPROVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("IN_PROGRESS"));

    let (status, body) = request(
        &app,
        "POST",
        &decision_uri,
        Some(&first_token),
        Some(json!({ "decision": "APPROVE", "comment": "looks good" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("APPROVED"));

    // Terminal documents refuse further decisions and cancellation.
    let (status, body) = request(
        &app,
        "POST",
        &decision_uri,
        Some(&second_token),
        Some(json!({ "decision": "REJECT" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("CONFLICT"));

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/v1/approval/documents/{}", document_id),
        Some(&drafter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["steps"][0]["status"], json!("APPROVED"));
    assert_eq!(body["data"]["steps"][1]["status"], json!("APPROVED"));
    assert_eq!(body["data"]["steps"][1]["comment"], json!("looks good"));

    // The audit middleware writes entries in the background.
    let mut audited = 0;
    for _ in 0..20 {
        audited = audit_log::Entity::find().count(&db).await.unwrap();
        if audited > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert!(audited > 0, "expected audit log entries to be written");
}

#[tokio::test]
async fn cancel_is_drafter_only() {
    let (app, db) = setup().await;

    let drafter = create_user(&db, "drafter").await;
    create_employee(&db, Some(drafter.id), "Drafter").await;
    assign_role(&db, drafter.id, "SYSTEM_ADMIN").await;
    let drafter_token = token_for(&db, drafter.id).await;

    let other = create_user(&db, "other").await;
    let other_emp = create_employee(&db, Some(other.id), "Other").await;
    assign_role(&db, other.id, "SYSTEM_ADMIN").await;
    let other_token = token_for(&db, other.id).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/approval/documents",
        Some(&drafter_token),
        Some(json!({
            "title": "Draft",
            "content": "c",
            "steps": [{ "approverId": other_emp.id, "approvalType": "APPROVE" }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cancel_uri = format!(
        "/api/v1/approval/documents/{}/cancel",
        body["data"]["id"].as_str().unwrap()
    );

    let (status, _) = request(&app, "POST", &cancel_uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(&app, "POST", &cancel_uri, Some(&drafter_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("CANCELLED"));
}

#[tokio::test]
async fn leave_batch_requires_approve_and_guards_balance() {
    let (app, db) = setup().await;

    let employee_row = create_employee(&db, None, "Worker").await;
    leave_balance::ActiveModel {
        id: Set(Uuid::new_v4()),
        employee_id: Set(employee_row.id),
        year: Set(2024),
        total_days: Set(15.0),
        used_days: Set(5.0),
        remaining_days: Set(10.0),
    }
    .insert(&db)
    .await
    .unwrap();

    let mut leave_ids = Vec::new();
    for days in [3.0, 50.0] {
        let row = leave::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee_row.id),
            leave_type: Set("ANNUAL".to_string()),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()),
            end_date: Set(NaiveDate::from_ymd_opt(2024, 8, 5).unwrap()),
            days: Set(days),
            reason: Set(None),
            status: Set(LeaveStatus::Requested),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        }
        .insert(&db)
        .await
        .unwrap();
        leave_ids.push(row.id);
    }

    // The route gate passes with hr/create, but the handler still demands
    // hr/approve.
    let clerk = create_user(&db, "clerk").await;
    grant(&db, clerk.id, "hr", "create").await;
    let clerk_token = token_for(&db, clerk.id).await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/hr/leaves/batch",
        Some(&clerk_token),
        Some(json!({ "ids": leave_ids, "action": "APPROVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("FORBIDDEN"));

    let manager = create_user(&db, "manager").await;
    grant(&db, manager.id, "hr", "create").await;
    grant(&db, manager.id, "hr", "approve").await;
    let manager_token = token_for(&db, manager.id).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/hr/leaves/batch",
        Some(&manager_token),
        Some(json!({ "ids": leave_ids, "action": "APPROVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success_count"], json!(1));
    assert_eq!(body["data"]["fail_count"], json!(1));

    let balance = leave_balance::Entity::find()
        .filter(leave_balance::Column::EmployeeId.eq(employee_row.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.remaining_days, 7.0);

    // Empty batches are refused outright.
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/hr/leaves/batch",
        Some(&manager_token),
        Some(json!({ "ids": [], "action": "REJECT" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn document_listing_normalizes_pagination() {
    let (app, db) = setup().await;

    let drafter = create_user(&db, "drafter").await;
    create_employee(&db, Some(drafter.id), "Drafter").await;
    assign_role(&db, drafter.id, "SYSTEM_ADMIN").await;
    let token = token_for(&db, drafter.id).await;

    let approver_emp = create_employee(&db, None, "Approver").await;
    for i in 0..3 {
        let (status, _) = request(
            &app,
            "POST",
            "/api/v1/approval/documents",
            Some(&token),
            Some(json!({
                "title": format!("Doc {}", i),
                "content": "c",
                "steps": [{ "approverId": approver_emp.id, "approvalType": "NOTIFY" }],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Garbage page falls back to 1; size is honored.
    let (status, body) = request(
        &app,
        "GET",
        "/api/v1/approval/documents?page=-5&pageSize=2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["page"], json!(1));
    assert_eq!(body["meta"]["pageSize"], json!(2));
    assert_eq!(body["meta"]["totalCount"], json!(3));
    assert_eq!(body["meta"]["totalPages"], json!(2));

    let (status, body) = request(
        &app,
        "GET",
        "/api/v1/approval/documents?status=APPROVED",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalCount"], json!(0));
    assert_eq!(body["meta"]["totalPages"], json!(0));
}

#[tokio::test]
async fn role_administration_over_http() {
    let (app, db) = setup().await;

    let admin = create_user(&db, "admin").await;
    assign_role(&db, admin.id, "SYSTEM_ADMIN").await;
    let token = token_for(&db, admin.id).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/admin/roles",
        Some(&token),
        Some(json!({ "name": "HR_STAFF", "description": "HR team" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/admin/roles",
        Some(&token),
        Some(json!({ "name": "HR_STAFF" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("DUPLICATE"));

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/v1/admin/roles/{}/permissions", role_id),
        Some(&token),
        Some(json!({ "permissions": [
            { "module": "hr", "action": "read" },
            { "module": "hr", "action": "approve" },
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], json!(2));

    // System roles stay.
    let system_role = role::Entity::find()
        .filter(role::Column::Name.eq("SYSTEM_ADMIN"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let (status, body) = request(
        &app,
        "DELETE",
        &format!("/api/v1/admin/roles/{}", system_role.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("CONFLICT"));

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/v1/admin/roles/{}", role_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn role_mutations_record_prior_state_in_audit_trail() {
    let (app, db) = setup().await;

    let admin = create_user(&db, "admin").await;
    assign_role(&db, admin.id, "SYSTEM_ADMIN").await;
    let token = token_for(&db, admin.id).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/admin/roles",
        Some(&token),
        Some(json!({ "name": "TEMPS", "description": "temporary staff" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/v1/admin/roles/{}/permissions", role_id),
        Some(&token),
        Some(json!({ "permissions": [{ "module": "hr", "action": "read" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/v1/admin/roles/{}", role_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The audit writer runs in the background; both mutation entries must
    // carry the role row as it was before the handler touched it.
    let mut rows = Vec::new();
    for _ in 0..20 {
        rows = audit_log::Entity::find()
            .filter(audit_log::Column::Action.is_in(["UPDATE", "DELETE"]))
            .all(&db)
            .await
            .unwrap();
        if rows.len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(rows.len(), 2, "expected UPDATE and DELETE audit entries");

    for row in &rows {
        let old = row.old_value.as_ref().expect("old_value captured");
        assert_eq!(old["name"], json!("TEMPS"));
        assert_eq!(old["id"], json!(role_id));
    }
}

#[tokio::test]
async fn notifications_are_scoped_to_the_caller() {
    let (app, db) = setup().await;

    let reader = create_user(&db, "reader").await;
    let reader_token = token_for(&db, reader.id).await;
    let stranger = create_user(&db, "stranger").await;
    let stranger_token = token_for(&db, stranger.id).await;

    let row = notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(reader.id),
        notification_type: Set("APPROVAL".to_string()),
        title: Set("Approval requested".to_string()),
        message: Set("A document awaits your decision".to_string()),
        related_url: Set(None),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&db)
    .await
    .unwrap();

    let (status, body) = request(&app, "GET", "/api/v1/notifications", Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalCount"], json!(1));

    let (status, body) = request(
        &app,
        "GET",
        "/api/v1/notifications",
        Some(&stranger_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalCount"], json!(0));

    let read_uri = format!("/api/v1/notifications/{}/read", row.id);
    let (status, body) = request(&app, "POST", &read_uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));

    let (status, body) = request(&app, "POST", &read_uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], json!(true));
}
