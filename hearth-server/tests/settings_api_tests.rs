//! Application settings over HTTP

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;

use helpers::TestApp;

#[tokio::test]
async fn test_missing_row_reads_as_enabled() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    let (status, body) = app.request(Method::GET, "/api/settings", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["notifications_enabled"], true);
    assert_eq!(body["settings"]["enable_sms"], true);
    assert_eq!(body["settings"]["enable_whatsapp"], true);
}

#[tokio::test]
async fn test_partial_update_keeps_other_flags() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    let (status, body) = app
        .request(Method::PUT, "/api/settings", Some(&token), Some(json!({ "enable_sms": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["enable_sms"], false);
    assert_eq!(body["settings"]["updated_by"], ana.id.as_str());

    let (_, body) = app
        .request(
            Method::PUT,
            "/api/settings",
            Some(&token),
            Some(json!({ "notifications_enabled": false })),
        )
        .await;
    assert_eq!(body["settings"]["notifications_enabled"], false);
    assert_eq!(body["settings"]["enable_sms"], false);
    assert_eq!(body["settings"]["enable_whatsapp"], true);

    let (_, body) = app.request(Method::GET, "/api/settings", Some(&token), None).await;
    assert_eq!(body["settings"]["notifications_enabled"], false);
    assert_eq!(body["settings"]["enable_sms"], false);
}

#[tokio::test]
async fn test_non_boolean_values_are_rejected() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/settings",
            Some(&token),
            Some(json!({ "enable_whatsapp": "no" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "enable_whatsapp must be a boolean");

    let (status, body) = app
        .request(Method::PUT, "/api/settings", Some(&token), Some(json!([true])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body must be a JSON object");

    let (_, body) = app.request(Method::GET, "/api/settings", Some(&token), None).await;
    assert_eq!(body["settings"]["enable_whatsapp"], true);
}

#[tokio::test]
async fn test_settings_need_a_session() {
    let app = TestApp::new().await;
    let (status, _) = app
        .request(Method::PUT, "/api/settings", None, Some(json!({ "enable_sms": false })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
