use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::*;

#[tokio::test]
async fn health_is_public() {
    let (app, _) = test_app();

    let response = app.oneshot(get("/api/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn schedule_requires_token() {
    let (app, _) = test_app();

    let response = app
        .oneshot(get("/api/schedule/washes?startDate=2026-10-01&endDate=2026-10-31", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn token_signed_elsewhere_is_rejected() {
    let (app, _) = test_app();
    let forged = {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/outro")
            .unwrap();
        let state = AppState::from_pool(pool, "outro-segredo".into(), BusinessCalendar::default());
        bearer(&state, UserRole::Admin)
    };

    let response = app.oneshot(get("/api/leads", Some(&forged))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn schedule_without_dates_is_bad_request() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Admin);

    let response = app
        .oneshot(get("/api/schedule/washes?endDate=2026-10-31", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MISSING_DATES");
}

#[tokio::test]
async fn schedule_with_inverted_window_is_bad_request() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Washer);

    let response = app
        .oneshot(get(
            "/api/schedule/washes?startDate=2026-10-20&endDate=2026-10-01",
            Some(&auth),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_DATE_RANGE");
}

#[tokio::test]
async fn schedule_with_garbage_date_is_bad_request() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Admin);

    let response = app
        .oneshot(get(
            "/api/schedule/washes?startDate=ontem&endDate=2026-10-01",
            Some(&auth),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_DATE");
}

#[tokio::test]
async fn washer_cannot_delete_lead() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Washer);

    let request = axum::http::Request::builder()
        .method(Method::DELETE)
        .uri("/api/leads/42")
        .header(axum::http::header::AUTHORIZATION, &auth)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn limited_admin_cannot_create_washer() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::LimitedAdmin);

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/washers",
            Some(&auth),
            json!({
                "name": "Suresh",
                "email": "suresh@carwash.in",
                "phone": "9876500000",
                "password": "segredo123"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn washer_cannot_assign() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Washer);

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/schedule/assign",
            Some(&auth),
            json!({ "customerId": 1, "washerId": 2, "targetDate": "2026-10-15" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_assign_payload_reports_fields() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Admin);

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/schedule/assign",
            Some(&auth),
            json!({ "customerId": 0, "washerId": 7, "targetDate": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["customer_id"].is_array());
    assert!(body["details"]["target_date"].is_array());
}

#[tokio::test]
async fn login_validates_before_touching_the_database() {
    let (app, _) = test_app();

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "not-an-email", "password": "123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"]["email"].is_array());
    assert!(body["details"]["password"].is_array());
}

#[tokio::test]
async fn openapi_document_lists_schedule_routes() {
    let (app, _) = test_app();

    let response = app.oneshot(get("/api-docs/openapi.json", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/schedule/washes"].is_object());
    assert!(body["paths"]["/api/leads/{leadId}/complete"].is_object());
}

#[tokio::test]
async fn expenses_are_admin_only() {
    let (app, state) = test_app();

    for role in [UserRole::Washer, UserRole::LimitedAdmin] {
        let auth = bearer(&state, role);
        let response = app
            .clone()
            .oneshot(get("/api/expenses/salary-calculation?month=10&year=2026", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn negative_expense_is_rejected() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Admin);

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/expenses",
            Some(&auth),
            json!({ "washerName": "Suresh", "amount": -50, "reason": "Adiantamento" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn expense_without_washer_name_reports_field() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Superadmin);

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/expenses",
            Some(&auth),
            json!({ "washerName": "", "amount": 50, "reason": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"]["washer_name"].is_array());
    assert!(body["details"]["reason"].is_array());
}

#[tokio::test]
async fn salary_for_month_13_is_bad_request() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Admin);

    let response = app
        .oneshot(get("/api/expenses/salary-calculation?month=13&year=2026", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_PERIOD");
}

#[tokio::test]
async fn negative_base_salary_is_rejected() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Admin);

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/washers/7/salary",
            Some(&auth),
            json!({ "baseSalary": -1, "effectiveDate": "2026-11-01" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn washer_cannot_remove_or_edit_washers() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Washer);

    let request = axum::http::Request::builder()
        .method(Method::DELETE)
        .uri("/api/washers/7")
        .header(axum::http::header::AUTHORIZATION, &auth)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(send_json("POST", "/api/washers/7/status", Some(&auth), json!({ "status": "Inactive" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn washer_update_validates_email() {
    let (app, state) = test_app();
    let auth = bearer(&state, UserRole::Admin);

    let response = app
        .oneshot(send_json("PUT", "/api/washers/7", Some(&auth), json!({ "email": "nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"]["email"].is_array());
}

#[tokio::test]
async fn openapi_document_lists_payroll_routes() {
    let (app, _) = test_app();

    let response = app.oneshot(get("/api-docs/openapi.json", None)).await.unwrap();

    let body = body_json(response).await;
    assert!(body["paths"]["/api/expenses"].is_object());
    assert!(body["paths"]["/api/expenses/salary-calculation"].is_object());
    assert!(body["paths"]["/api/washers/{userId}/salary"].is_object());
}
