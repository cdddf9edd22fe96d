mod common;

use axum::http::StatusCode;
use common::{png_part, Part, TestApp, FREE_USER, MAX_UPLOAD_BYTES, PREMIUM_USER};
use creation_service::models::CreationType;
use creation_service::services::mock::MemoryLedger;
use serde_json::json;

#[tokio::test]
async fn free_user_below_limit_generates_article() {
    let app = TestApp::spawn(9);

    let (status, body) = app
        .post_json(
            "/api/ai/generate-article",
            FREE_USER,
            json!({"prompt": "Write about ownership", "length": 500}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let content = body["content"].as_str().unwrap();

    let entries = app.ledger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].creation_type, CreationType::Article);
    assert_eq!(entries[0].content, content);
    assert_eq!(app.identity.free_usage(FREE_USER), Some(10));
}

#[tokio::test]
async fn free_user_at_limit_gets_limit_message() {
    let app = TestApp::spawn(10);

    let (status, body) = app
        .post_json(
            "/api/ai/generate-blog-title",
            FREE_USER,
            json!({"prompt": "Rust"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": false, "message": "Limit reached. Upgrade to continue."})
    );
    assert!(app.ledger.entries().is_empty());
    assert_eq!(app.provider_calls(), 0);
}

#[tokio::test]
async fn free_user_cannot_generate_images() {
    let app = TestApp::spawn(0);

    let (_, body) = app
        .post_json(
            "/api/ai/generate-image",
            FREE_USER,
            json!({"prompt": "a red fox", "publish": true}),
        )
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "This feature is only available for premium subscriptions"
    );
    assert_eq!(app.images.calls(), 0);
}

#[tokio::test]
async fn free_user_cannot_remove_backgrounds() {
    let app = TestApp::spawn(0);
    let png = [0x89, b'P', b'N', b'G'];

    let (status, body) = app
        .post_multipart(
            "/api/ai/remove-image-background",
            FREE_USER,
            &[png_part(&png)],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": false, "message": "Premium feature only"}));
    assert_eq!(app.assets.upload_count(), 0);
}

#[tokio::test]
async fn premium_user_generates_published_image() {
    let app = TestApp::spawn(0);

    let (_, body) = app
        .post_json(
            "/api/ai/generate-image",
            PREMIUM_USER,
            json!({"prompt": "a red fox", "publish": true}),
        )
        .await;

    assert_eq!(body["success"], true);
    let url = body["content"].as_str().unwrap();
    assert!(url.starts_with("https://assets.test/"));

    let entries = app.ledger.entries();
    assert_eq!(entries[0].creation_type, CreationType::Image);
    assert!(entries[0].publish);

    let (_, feed) = app.get("/api/creations/published", Some(FREE_USER)).await;
    assert_eq!(feed["success"], true);
    assert_eq!(feed["creations"][0]["content"], url);
    assert_eq!(feed["creations"][0]["type"], "image");
}

#[tokio::test]
async fn premium_user_removes_object() {
    let app = TestApp::spawn(0);
    let png = [0x89, b'P', b'N', b'G'];

    let (_, body) = app
        .post_multipart(
            "/api/ai/remove-image-object",
            PREMIUM_USER,
            &[png_part(&png), Part::Text("object", "car")],
        )
        .await;

    assert_eq!(body["success"], true);
    let url = body["content"].as_str().unwrap();
    assert!(url.contains("e_gen_remove:car"));

    let entries = app.ledger.entries();
    assert_eq!(entries[0].prompt, "Removed car");
    assert_eq!(entries[0].content, url);
}

#[tokio::test]
async fn object_removal_without_image_fails_in_band() {
    let app = TestApp::spawn(0);

    let (status, body) = app
        .post_multipart(
            "/api/ai/remove-image-object",
            PREMIUM_USER,
            &[Part::Text("object", "car")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No image uploaded");
}

#[tokio::test]
async fn premium_user_reviews_resume() {
    let app = TestApp::spawn(0);

    let (_, body) = app
        .post_multipart(
            "/api/ai/resume-review",
            PREMIUM_USER,
            &[Part::File {
                name: "resume",
                file_name: "cv.pdf",
                content_type: "application/pdf",
                bytes: b"%PDF-1.7 resume",
            }],
        )
        .await;

    assert_eq!(body["success"], true);
    assert!(body["content"]
        .as_str()
        .unwrap()
        .contains("Senior Rust Engineer"));
    assert_eq!(
        app.ledger.entries()[0].creation_type,
        CreationType::ResumeReview
    );
}

#[tokio::test]
async fn premium_user_is_not_metered() {
    let app = TestApp::spawn(0);

    for _ in 0..12 {
        let (_, body) = app
            .post_json(
                "/api/ai/generate-blog-title",
                PREMIUM_USER,
                json!({"prompt": "Rust"}),
            )
            .await;
        assert_eq!(body["success"], true);
    }

    assert_eq!(app.identity.free_usage(PREMIUM_USER), Some(0));
    assert_eq!(app.ledger.entries().len(), 12);
}

#[tokio::test]
async fn ledger_failure_is_reported() {
    let app = TestApp::with_ledger(0, MemoryLedger::failing());

    let (_, body) = app
        .post_json(
            "/api/ai/generate-article",
            FREE_USER,
            json!({"prompt": "Write about lifetimes"}),
        )
        .await;

    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to save creation"));
    assert_eq!(app.identity.free_usage(FREE_USER), Some(0));
}

#[tokio::test]
async fn malformed_json_produces_envelope() {
    let app = TestApp::spawn(0);

    let (status, body) = app
        .post_raw(
            "/api/ai/generate-article",
            FREE_USER,
            "application/json",
            "{not json",
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
    assert_eq!(app.text.calls(), 0);
}

#[tokio::test]
async fn malformed_body_from_denied_user_reports_denial() {
    let app = TestApp::spawn(10);

    let (_, body) = app
        .post_raw(
            "/api/ai/generate-article",
            FREE_USER,
            "application/json",
            "{not json",
        )
        .await;

    assert_eq!(body["message"], "Limit reached. Upgrade to continue.");
}

#[tokio::test]
async fn empty_prompt_fails_validation() {
    let app = TestApp::spawn(0);

    let (_, body) = app
        .post_json("/api/ai/generate-blog-title", FREE_USER, json!({"prompt": ""}))
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(app.text.calls(), 0);
    assert_eq!(app.identity.free_usage(FREE_USER), Some(0));
}

#[tokio::test]
async fn oversized_upload_is_rejected_in_band() {
    let app = TestApp::spawn(0);
    let big = vec![0u8; MAX_UPLOAD_BYTES + 1];

    let (status, body) = app
        .post_multipart(
            "/api/ai/remove-image-background",
            PREMIUM_USER,
            &[png_part(&big)],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(app.ledger.entries().is_empty());
}

#[tokio::test]
async fn missing_user_header_is_unauthorized() {
    let app = TestApp::spawn(0);

    let (status, body) = app.get("/api/user/creations", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_user_is_unauthorized() {
    let app = TestApp::spawn(0);

    let (status, _) = app
        .post_json(
            "/api/ai/generate-article",
            "user_unknown",
            json!({"prompt": "hello"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.text.calls(), 0);
}

#[tokio::test]
async fn user_creations_are_scoped_and_newest_first() {
    let app = TestApp::spawn(0);

    for prompt in ["first", "second"] {
        app.post_json(
            "/api/ai/generate-blog-title",
            FREE_USER,
            json!({"prompt": prompt}),
        )
        .await;
    }
    app.post_json(
        "/api/ai/generate-blog-title",
        PREMIUM_USER,
        json!({"prompt": "someone else"}),
    )
    .await;

    let (status, body) = app.get("/api/user/creations", Some(FREE_USER)).await;

    assert_eq!(status, StatusCode::OK);
    let creations = body["creations"].as_array().unwrap();
    assert_eq!(creations.len(), 2);
    assert_eq!(creations[0]["prompt"], "second");
    assert_eq!(creations[1]["prompt"], "first");
    assert!(creations.iter().all(|c| c["user_id"] == FREE_USER));
}
