//! Family board endpoints: ownership rules, validation and photo uploads

mod helpers;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::json;

use hearth_server::db::memories;

use helpers::TestApp;

const BOUNDARY: &str = "hearth-test-boundary";

fn multipart_request(uri: &str, token: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\n\
             Content-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_event_lifecycle_and_creator_rule() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let ben = app.member("Ben", "father", None).await;
    let ana_token = app.token_for(&ana).await;
    let ben_token = app.token_for(&ben).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/events",
            Some(&ana_token),
            Some(json!({
                "title": "Dentist",
                "date": "2025-06-02",
                "time": "09:30",
                "category": "health"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["event"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["event"]["created_by"], ana.id.as_str());
    assert_eq!(body["event"]["time"], "09:30");

    let uri = format!("/api/events/{}", id);
    let update = json!({ "title": "Dentist (moved)", "date": "2025-06-03", "category": "health" });

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&ben_token), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only edit events you created");

    let (status, body) = app.request(Method::PUT, &uri, Some(&ana_token), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["date"], "2025-06-03");
    assert!(body["event"]["time"].is_null());

    let (status, _) = app.request(Method::DELETE, &uri, Some(&ben_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::DELETE, &uri, Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.request(Method::GET, &uri, Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");
}

#[tokio::test]
async fn test_event_validation() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    let (status, body) = app
        .request(Method::POST, "/api/events", Some(&token), Some(json!({ "title": "Trip" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title, date, and category are required");

    for bad in [
        json!({ "title": "Trip", "date": "06/02/2025", "category": "travel" }),
        json!({ "title": "Trip", "date": "2025-06-02", "category": "party" }),
        json!({ "title": "Trip", "date": "2025-06-02", "time": "25:00", "category": "travel" }),
    ] {
        let (status, _) = app.request(Method::POST, "/api/events", Some(&token), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_events_list_in_date_order() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    app.event_on(&ana, "Later", helpers::date("2025-07-01"), None).await;
    app.event_on(&ana, "Sooner", helpers::date("2025-06-01"), Some("08:00")).await;

    let (status, body) = app.request(Method::GET, "/api/events", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Sooner", "Later"]);
}

#[tokio::test]
async fn test_task_completion_and_default_assignee() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let cy = app.member("Cy", "son", None).await;
    let ana_token = app.token_for(&ana).await;
    let cy_token = app.token_for(&cy).await;

    let (status, body) = app
        .request(Method::POST, "/api/tasks", Some(&ana_token), Some(json!({ "title": "Laundry" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task"]["assigned_to"], "all");
    assert_eq!(body["task"]["completed"], false);
    let uri = format!("/api/tasks/{}", body["task"]["id"].as_str().unwrap());

    let (status, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(&cy_token),
            Some(json!({ "title": "Laundry", "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only edit tasks you created");

    let (status, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(&ana_token),
            Some(json!({ "title": "Laundry", "assigned_to": "son", "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["completed"], true);
    assert_eq!(body["task"]["assigned_to"], "son");

    let (status, body) = app
        .request(Method::POST, "/api/tasks", Some(&ana_token), Some(json!({ "title": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");

    let (status, body) = app
        .request(Method::DELETE, "/api/tasks/missing", Some(&ana_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
}

#[tokio::test]
async fn test_notes_are_parent_managed() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let di = app.member("Di", "daughter", None).await;
    let ana_token = app.token_for(&ana).await;
    let di_token = app.token_for(&di).await;

    let note = json!({
        "title": "Allergies",
        "content": "Peanuts",
        "category": "health",
        "is_readonly_for_kids": true
    });

    let (status, body) = app
        .request(Method::POST, "/api/notes", Some(&di_token), Some(note.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only parents can create notes");

    let (status, body) = app
        .request(Method::POST, "/api/notes", Some(&ana_token), Some(note.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/notes/{}", body["note"]["id"].as_str().unwrap());

    let (status, body) = app.request(Method::PUT, &uri, Some(&di_token), Some(note.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "This note is read-only for kids");

    let (status, body) = app.request(Method::DELETE, &uri, Some(&di_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only parents can delete notes");

    // Kids can still read
    let (status, body) = app.request(Method::GET, "/api/notes", Some(&di_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"].as_array().unwrap().len(), 1);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_announcements_hide_expired() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let ben = app.member("Ben", "father", None).await;
    let ana_token = app.token_for(&ana).await;
    let ben_token = app.token_for(&ben).await;

    let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let future = (Utc::now() + Duration::days(1)).to_rfc3339();

    for body in [
        json!({ "message": "Pizza night" }),
        json!({ "message": "Old news", "expires_at": past }),
        json!({ "message": "Pool closed", "expires_at": future }),
    ] {
        let (status, _) = app
            .request(Method::POST, "/api/announcements", Some(&ana_token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .request(Method::GET, "/api/announcements", Some(&ben_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let active = body["announcements"].as_array().unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|a| a["message"] != "Old news"));

    let uri = format!("/api/announcements/{}", active[0]["id"].as_str().unwrap());
    let (status, _) = app
        .request(Method::PUT, &uri, Some(&ben_token), Some(json!({ "message": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/announcements",
            Some(&ana_token),
            Some(json!({ "message": "Soon", "expires_at": "tomorrow" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}

#[tokio::test]
async fn test_profile_updates_are_self_only() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let ben = app.member("Ben", "father", None).await;
    let ana_token = app.token_for(&ana).await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/profiles/{}", ben.id),
            Some(&ana_token),
            Some(json!({ "name": "Benny" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only update your own profile");

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/profiles/{}", ana.id),
            Some(&ana_token),
            Some(json!({
                "bio": "Runs the house",
                "phone_number": "+44 20 7946 0958",
                "whatsapp_enabled": false,
                "date_of_birth": "1985-04-12"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["profile"]["bio"], "Runs the house");
    assert_eq!(body["profile"]["phone_number"], "+442079460958");
    assert_eq!(body["profile"]["whatsapp_enabled"], false);
    assert_eq!(body["profile"]["sms_enabled"], true);
    assert!(body["profile"]["age"].as_i64().unwrap() >= 40);

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/profiles/{}", ana.id),
            Some(&ana_token),
            Some(json!({ "name": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name cannot be empty");

    let (status, body) = app
        .request(Method::GET, "/api/profiles/unknown", Some(&ana_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Profile not found");
}

#[tokio::test]
async fn test_memory_upload_then_delete_removes_file() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let ben = app.member("Ben", "father", None).await;
    let ana_token = app.token_for(&ana).await;
    let ben_token = app.token_for(&ben).await;

    let png = b"\x89PNG\r\n\x1a\nfake-image-bytes";
    let (status, body) = app
        .send_raw(multipart_request("/api/memories/upload", &ana_token, "image/png", png))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let url = body["url"].as_str().unwrap().to_string();
    let path = body["path"].as_str().unwrap().to_string();
    assert!(url.starts_with("/photos/memories/"));

    let stored = app.photo_dir.path().join("photos").join(&path);
    assert_eq!(tokio::fs::read(&stored).await.unwrap(), png);

    let (status, _) = app
        .send_raw(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/memories",
            Some(&ana_token),
            Some(json!({ "photo_url": url, "note": "Beach day" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/memories/{}", body["memory"]["id"].as_str().unwrap());

    let (status, body) = app.request(Method::DELETE, &uri, Some(&ben_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only delete memories you created");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!stored.exists());
}

#[tokio::test]
async fn test_uploads_must_be_images() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    let (status, body) = app
        .send_raw(multipart_request("/api/memories/upload", &token, "text/plain", b"hello"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File must be an image");

    let (status, body) = app
        .request(Method::POST, "/api/memories", Some(&token), Some(json!({ "note": "no photo" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Photo URL is required");
}

#[tokio::test]
async fn test_profile_photo_replaces_previous_file() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let ben = app.member("Ben", "father", None).await;
    let token = app.token_for(&ana).await;
    let uri = format!("/api/profiles/{}/photo", ana.id);

    let (status, first) = app
        .send_raw(multipart_request(&uri, &token, "image/jpeg", b"first"))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    let first_file = app
        .photo_dir
        .path()
        .join("photos")
        .join(first["path"].as_str().unwrap());
    assert!(first_file.exists());

    let (status, second) = app
        .send_raw(multipart_request(&uri, &token, "image/jpeg", b"second"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!first_file.exists());

    let (_, body) = app
        .request(Method::GET, &format!("/api/profiles/{}", ana.id), Some(&token), None)
        .await;
    assert_eq!(body["profile"]["photo_url"], second["url"]);

    let (status, body) = app
        .send_raw(multipart_request(
            &format!("/api/profiles/{}/photo", ben.id),
            &token,
            "image/jpeg",
            b"not mine",
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only upload your own profile photo");
}

#[tokio::test]
async fn test_unknown_route_is_not_found_without_session() {
    let app = TestApp::new().await;
    let (status, _) = app.request(Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_members_cannot_claim_or_delete_each_others_photos() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let ben = app.member("Ben", "father", None).await;
    let ana_token = app.token_for(&ana).await;
    let ben_token = app.token_for(&ben).await;

    let (status, body) = app
        .send_raw(multipart_request("/api/memories/upload", &ana_token, "image/png", b"ana's"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let ana_url = body["url"].as_str().unwrap().to_string();
    let ana_file = app
        .photo_dir
        .path()
        .join("photos")
        .join(body["path"].as_str().unwrap());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/memories",
            Some(&ben_token),
            Some(json!({ "photo_url": ana_url })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only use photos you uploaded");

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/profiles/{}", ben.id),
            Some(&ben_token),
            Some(json!({ "photo_url": ana_url })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A row that already points at someone else's file never deletes it
    let planted = memories::insert_memory(app.pool(), &ana_url, None, &ben.id)
        .await
        .unwrap();
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/memories/{}", planted.id),
            Some(&ben_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(ana_file.exists());

    // External links are fine and are never touched on disk
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/profiles/{}", ben.id),
            Some(&ben_token),
            Some(json!({ "photo_url": "https://cdn.example.com/photos/profiles/x/ben.jpg" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_photo_is_removed_when_row_update_fails() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    sqlx::query(
        "CREATE TRIGGER reject_photo_url BEFORE UPDATE OF photo_url ON profiles \
         BEGIN SELECT RAISE(ABORT, 'photo updates disabled'); END",
    )
    .execute(app.pool())
    .await
    .unwrap();

    let (status, _) = app
        .send_raw(multipart_request(
            &format!("/api/profiles/{}/photo", ana.id),
            &token,
            "image/png",
            b"orphan",
        ))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let folder = app.photo_dir.path().join("photos").join("profiles").join(&ana.id);
    let mut entries = tokio::fs::read_dir(&folder).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_task_update_applies_all_fields_or_none() {
    let app = TestApp::new().await;
    let ana = app.member("Ana", "mother", None).await;
    let token = app.token_for(&ana).await;

    let (_, body) = app
        .request(Method::POST, "/api/tasks", Some(&token), Some(json!({ "title": "Laundry" })))
        .await;
    let uri = format!("/api/tasks/{}", body["task"]["id"].as_str().unwrap());

    let (status, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "title": "Fold laundry", "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["title"], "Fold laundry");
    let completed_at = body["task"]["completed_at"].clone();
    assert!(completed_at.is_string());

    // Re-completing keeps the original completion time
    let (_, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "title": "Fold", "completed": true })),
        )
        .await;
    assert_eq!(body["task"]["completed_at"], completed_at);

    let (_, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "title": "Fold", "completed": false })),
        )
        .await;
    assert_eq!(body["task"]["completed"], false);
    assert!(body["task"]["completed_at"].is_null());

    sqlx::query(
        "CREATE TRIGGER reject_completion BEFORE UPDATE OF completed ON tasks \
         WHEN NEW.completed = 1 BEGIN SELECT RAISE(ABORT, 'completion disabled'); END",
    )
    .execute(app.pool())
    .await
    .unwrap();

    let (status, _) = app
        .request(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "title": "Renamed", "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, body) = app.request(Method::GET, "/api/tasks", Some(&token), None).await;
    assert_eq!(body["tasks"][0]["title"], "Fold");
    assert_eq!(body["tasks"][0]["completed"], false);
}
