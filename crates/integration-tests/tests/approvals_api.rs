//! Approvals API tests driving the axum router with `oneshot`.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use karat_admin::middleware::ADMIN_UID_HEADER;
use karat_integration_tests::{EDITOR, INTERN, OWNER, TestContext};

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        request = request.header(ADMIN_UID_HEADER, caller);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

fn rate_proposal() -> Value {
    json!({
        "entityType": "metalRates",
        "actionType": "update",
        "proposedChanges": {"gold22k": "6550", "silver": 91},
    })
}

#[tokio::test]
async fn test_submit_review_round_trip() {
    let ctx = TestContext::new().await;
    let app = ctx.router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/approvals",
        Some(EDITOR),
        Some(rate_proposal()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["entityId"], "current");
    let approval_id = body["approvalId"].as_str().unwrap().to_owned();

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/approvals/pending-count",
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/approvals/{approval_id}"),
        Some(EDITOR),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entityType"], "metalRates");
    assert_eq!(body["submittedBy"], EDITOR);
    assert_eq!(body["submittedByEmail"], "asha@karat.example");
    assert_eq!(body["proposedChanges"]["silver"], "91");

    let review_uri = format!("/api/approvals/{approval_id}/review");
    let (status, body) = send(
        &app,
        Method::POST,
        &review_uri,
        Some(OWNER),
        Some(json!({"decision": "approved", "note": "matches bullion desk"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"approvalId": approval_id, "decision": "approved"})
    );

    // Second decision conflicts.
    let (status, body) = send(
        &app,
        Method::POST,
        &review_uri,
        Some(OWNER),
        Some(json!({"decision": "rejected"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "failed_precondition");

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/approvals?status=approved&entityType=metalRates",
        Some(OWNER),
        None,
    )
    .await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["reviewedBy"], OWNER);
    assert_eq!(entries[0]["reviewNote"], "matches bullion desk");
}

#[tokio::test]
async fn test_error_status_codes() {
    let ctx = TestContext::new().await;
    let app = ctx.router();

    // No caller header.
    let (status, body) = send(&app, Method::GET, "/api/approvals", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    // Caller without the capability.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/approvals",
        Some(INTERN),
        Some(rate_proposal()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");

    // Non-reviewer, even for an entry that does not exist.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/approvals/nope/review",
        Some(EDITOR),
        Some(json!({"decision": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown entry for a reviewer.
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/approvals/nope",
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    // Illegal action for the entity type.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/approvals",
        Some(EDITOR),
        Some(json!({"entityType": "product", "actionType": "delete", "entityId": "p1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");

    // Unknown payload field.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/approvals",
        Some(EDITOR),
        Some(json!({
            "entityType": "metalRates",
            "actionType": "update",
            "proposedChanges": {"gold22k": "6550", "unobtanium": "1"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");

    // Malformed body.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/approvals",
        Some(EDITOR),
        Some(json!({"entityType": "necklace"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");

    // Malformed query.
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/approvals?status=closed",
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_super_admin_submission_is_approved_directly() {
    let ctx = TestContext::new().await;
    let app = ctx.router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/approvals",
        Some(OWNER),
        Some(json!({
            "entityType": "banner",
            "actionType": "create",
            "proposedChanges": {
                "title": "Bridal collection",
                "imageUrl": "https://cdn.karat.example/banners/bridal.jpg",
            },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "approved");
    assert!(body["entityId"].is_string());

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/approvals/pending-count",
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;
    let app = ctx.router();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_owned()));

    let (status, _) = send(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
