use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_endpoints_report_ok() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({"ok": true, "app": "SPM"}));

    let res = app.get_without_token(routes::HEALTHZ).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({"status": "ok"}));
}

#[tokio::test]
async fn client_logs_accept_any_body() {
    let app = TestApp::spawn().await;
    let token = app.token_for("alice");

    let entry = json!({
        "page": "home.html",
        "message": "TypeError: x is undefined",
        "stack": "at upload (api_client.js:10)",
        "href": "http://127.0.0.1:5001/home.html",
        "userAgent": "Mozilla/5.0",
    });
    let res = app.post_json(routes::CLIENT_LOGS, &entry, &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({"ok": true}));

    for body in ["", "not json", "[1, 2, 3]", "{\"message\": 42}"] {
        let res = app.post_raw(routes::CLIENT_LOGS, body).await;
        assert_eq!(res.status, 200, "{body:?}");
        assert_eq!(res.body["ok"], true);
    }
}

#[tokio::test]
async fn openapi_ui_is_served() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token("/scalar").await;
    assert_eq!(res.status, 200);
    assert!(res.text.contains("/api/files") || res.text.contains("scalar"));
}
