//! HTTP-level tests for the grievance server contract: actor headers, role
//! gating, status mapping, and response shapes. Runs against `MemoryStore`.

use std::sync::Arc;

use axum::body::Body;
use chrono::{Duration, Utc};
use grievance_core::memory::MemoryStore;
use grievance_core::types::{Grievance, GrievanceStatus};
use grievance_core::{GrievanceService, GrievanceServiceImpl};
use grievance_server::router::build_router;
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Test app builder ───────────────────────────────────────────

async fn build_test_app() -> (axum::Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new().with_campus_reference());
    store.add_user(1, "Asha Student", "asha@campus.edu").await;
    store.add_user(2, "Dr. Authority", "authority@campus.edu").await;

    let created = Utc::now() - Duration::days(4);
    store
        .insert_grievance(Grievance {
            id: 42,
            reporter_id: 1,
            category_id: 1,
            priority_id: 3,
            description: "water leak in lab 2".into(),
            status: GrievanceStatus::Submitted,
            assigned_department: None,
            assigned_officer: None,
            created_at: created,
            updated_at: created,
            resolved_at: None,
        })
        .await;

    let service: Arc<dyn GrievanceService> = Arc::new(GrievanceServiceImpl::new(
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    (build_router(service), store)
}

fn request(method: &str, uri: &str, actor: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = actor {
        builder = builder.header("x-actor-id", id).header("x-actor-role", role);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

const STUDENT: Option<(&str, &str)> = Some(("1", "student"));
const AUTHORITY: Option<(&str, &str)> = Some(("2", "authority"));

// ── Helper to read response body ───────────────────────────────

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(
        |_| json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }),
    )
}

// ── Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_actor() {
    let (app, _) = build_test_app().await;
    let resp = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn missing_or_bad_actor_is_unauthorized() {
    let (app, _) = build_test_app().await;
    let resp = app
        .clone()
        .oneshot(request("GET", "/grievances", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "unauthorized");

    let resp = app
        .oneshot(request("GET", "/grievances", Some(("1", "janitor")), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn student_cannot_update_status() {
    let (app, store) = build_test_app().await;
    let resp = app
        .oneshot(request(
            "PUT",
            "/grievances/status",
            STUDENT,
            Some(json!({ "grievance_id": 42, "status": "closed", "remarks": "nope" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"], "forbidden");
    assert!(store.remarks_for(42).await.is_empty());
}

#[tokio::test]
async fn authority_transition_then_timeline() {
    let (app, _) = build_test_app().await;
    let resp = app
        .clone()
        .oneshot(request(
            "PUT",
            "/grievances/status",
            AUTHORITY,
            Some(json!({ "grievance_id": 42, "status": "in_progress", "remarks": "reviewing now" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["grievance"]["status"], "in_progress");
    assert!(body["grievance"]["resolved_at"].is_null());
    assert!(body.get("audit_warning").is_none());

    let resp = app
        .oneshot(request("GET", "/grievances/42/timeline", STUDENT, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let timeline = body_json(resp).await;
    assert_eq!(timeline[0]["status"], "in_progress");
    assert_eq!(timeline[0]["remark_text"], "reviewing now");
    assert_eq!(timeline[0]["author_name"], "Dr. Authority");
    assert_eq!(timeline[1]["status"], "submitted");
}

#[tokio::test]
async fn invalid_status_is_bad_request() {
    let (app, _) = build_test_app().await;
    let resp = app
        .oneshot(request(
            "PUT",
            "/grievances/status",
            AUTHORITY,
            Some(json!({ "grievance_id": 42, "status": "done", "remarks": "x" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid_argument");
}

#[tokio::test]
async fn assign_unknown_grievance_is_not_found() {
    let (app, store) = build_test_app().await;
    let resp = app
        .oneshot(request(
            "PUT",
            "/grievances/assign",
            AUTHORITY,
            Some(json!({ "grievance_id": 99, "department_id": 3 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(store.activity_entries().await.is_empty());
}

#[tokio::test]
async fn dashboard_lists_with_meta_and_names() {
    let (app, _) = build_test_app().await;
    let resp = app
        .oneshot(request("GET", "/grievances?status=submitted&limit=500", STUDENT, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["meta"], json!({ "page": 1, "limit": 100, "total": 1, "pages": 1 }));
    let row = &body["data"][0];
    assert_eq!(row["id"], 42);
    assert_eq!(row["category_name"], "Infrastructure");
    assert_eq!(row["priority_name"], "High");
    assert_eq!(row["reporter_email"], "asha@campus.edu");
    assert!(row["assigned_dept_name"].is_null());
}

#[tokio::test]
async fn submit_returns_created() {
    let (app, _) = build_test_app().await;
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/grievances",
            STUDENT,
            Some(json!({ "category_id": 3, "priority_id": 1, "description": "mess food cold" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "submitted");
    assert_eq!(body["reporter_id"], 1);

    let resp = app
        .oneshot(request(
            "POST",
            "/grievances",
            STUDENT,
            Some(json!({ "category_id": 99, "priority_id": 1, "description": "x" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attach_image_to_grievance() {
    let (app, _) = build_test_app().await;
    let resp = app
        .oneshot(request(
            "POST",
            "/grievances/42/images",
            STUDENT,
            Some(json!({ "image_ref": "/uploads/leak.jpg" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["grievance_id"], 42);
    assert_eq!(body["image_ref"], "/uploads/leak.jpg");
}

#[tokio::test]
async fn analytics_is_gated_and_shaped() {
    let (app, _) = build_test_app().await;
    let resp = app
        .clone()
        .oneshot(request("GET", "/analytics", STUDENT, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .oneshot(request("GET", "/analytics?days=7", AUTHORITY, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["period_days"], 7);
    assert_eq!(body["summary"]["avg_resolution_days"], 0.0);
    assert_eq!(body["summary"]["pending_over_72h"], 1);
    assert_eq!(
        body["summary"]["total_by_status"],
        json!([{ "status": "submitted", "count": 1 }])
    );
}

#[tokio::test]
async fn reference_lists_and_activity() {
    let (app, _) = build_test_app().await;
    let resp = app
        .clone()
        .oneshot(request("GET", "/priorities", STUDENT, None))
        .await
        .unwrap();
    let priorities = body_json(resp).await;
    assert_eq!(priorities[0], json!({ "id": 1, "name": "Low" }));

    let resp = app
        .clone()
        .oneshot(request("GET", "/departments", STUDENT, None))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await[0]["name"], "Academic Affairs");

    let resp = app
        .clone()
        .oneshot(request(
            "PUT",
            "/grievances/assign",
            AUTHORITY,
            Some(json!({ "grievance_id": 42, "department_id": 1 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["assigned_department"], 1);

    let resp = app
        .clone()
        .oneshot(request("GET", "/activity", STUDENT, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .oneshot(request("GET", "/activity?limit=10", AUTHORITY, None))
        .await
        .unwrap();
    let entries = body_json(resp).await;
    assert_eq!(entries[0]["kind"], "GRIEVANCE_ASSIGNED");
    assert_eq!(entries[0]["details"], "Grievance 42 assigned to department 1");
}

#[tokio::test]
async fn malformed_fields_are_invalid_argument() {
    let (app, store) = build_test_app().await;
    let cases = [
        request(
            "PUT",
            "/grievances/status",
            AUTHORITY,
            Some(json!({ "grievance_id": "abc", "status": "closed", "remarks": "x" })),
        ),
        request(
            "PUT",
            "/grievances/assign",
            AUTHORITY,
            Some(json!({ "grievance_id": 1.5, "department_id": 1 })),
        ),
        request("GET", "/grievances/abc/timeline", AUTHORITY, None),
        request("GET", "/analytics?days=ten", AUTHORITY, None),
        request("GET", "/grievances?page=first", AUTHORITY, None),
        request("GET", "/activity?limit=lots", AUTHORITY, None),
        request(
            "POST",
            "/grievances/abc/images",
            STUDENT,
            Some(json!({ "image_ref": "/uploads/leak.jpg" })),
        ),
    ];
    for req in cases {
        let uri = req.uri().to_string();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(resp).await;
        assert_eq!(body["error"], "invalid_argument", "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
    assert!(store.remarks_for(42).await.is_empty());
    assert!(store.activity_entries().await.is_empty());
}

#[tokio::test]
async fn body_that_is_not_json_is_invalid_argument() {
    let (app, _) = build_test_app().await;
    let req = Request::builder()
        .method("PUT")
        .uri("/grievances/status")
        .header("x-actor-id", "2")
        .header("x-actor-role", "authority")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid_argument");
}
