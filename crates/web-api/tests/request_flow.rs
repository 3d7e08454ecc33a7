mod support;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use support::TestApp;

fn record_payload(app: &TestApp) -> Value {
    json!({
        "providerId": app.provider.id,
        "serviceType": "plumbing",
        "location": "12 Canal St",
        "price": 85.0,
        "requester": {
            "id": app.requester.id,
            "name": app.requester.name,
            "avatarUrl": null
        },
        "verificationCode": "AB12CD34"
    })
}

#[tokio::test]
async fn request_record_lifecycle_over_http() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let base = app.http_base();
    let token = app.token_for(&app.provider);

    // 建档
    let created = client
        .post(format!("{}/api/v1/requests", base))
        .bearer_auth(&token)
        .json(&record_payload(&app))
        .send()
        .await
        .expect("create");
    assert_eq!(created.status(), StatusCode::CREATED);
    let record: Value = created.json().await.expect("record json");
    let request_id = record["id"].as_str().expect("id").to_string();
    assert_eq!(record["status"], "accepted");
    assert_eq!(record["verificationCode"], "AB12CD34");
    assert_eq!(record["startedAt"], Value::Null);

    // 凭码取档
    let fetched = client
        .get(format!("{}/api/v1/requests/{}?code=AB12CD34", base, request_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("fetch");
    assert_eq!(fetched.status(), StatusCode::OK);

    // 错码取不到档
    let wrong_code = client
        .get(format!("{}/api/v1/requests/{}?code=ZZZZZZZZ", base, request_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("fetch wrong code");
    assert_eq!(wrong_code.status(), StatusCode::NOT_FOUND);

    // 错码核销被拒，流程不重置
    let mismatch = client
        .post(format!("{}/api/v1/requests/{}/verify", base, request_id))
        .bearer_auth(&token)
        .json(&json!({ "code": "WRONG999" }))
        .send()
        .await
        .expect("verify wrong");
    assert_eq!(mismatch.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = mismatch.json().await.expect("error body");
    assert_eq!(body["code"], "CODE_MISMATCH");

    // 核码成功，服务开始计时；小写提交也接受
    let verified = client
        .post(format!("{}/api/v1/requests/{}/verify", base, request_id))
        .bearer_auth(&token)
        .json(&json!({ "code": "ab12cd34" }))
        .send()
        .await
        .expect("verify");
    assert_eq!(verified.status(), StatusCode::OK);
    let record: Value = verified.json().await.expect("record json");
    assert_eq!(record["status"], "accepted");
    assert!(record["startedAt"].is_string());

    // 完工
    let completed = client
        .post(format!("{}/api/v1/requests/{}/complete", base, request_id))
        .bearer_auth(&token)
        .json(&json!({ "durationSecs": 3600 }))
        .send()
        .await
        .expect("complete");
    assert_eq!(completed.status(), StatusCode::OK);
    let record: Value = completed.json().await.expect("record json");
    assert_eq!(record["status"], "completed");
    assert_eq!(record["durationSecs"], 3600);
    assert!(record["completedAt"].is_string());
}

#[tokio::test]
async fn create_with_unknown_provider_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let token = app.token_for(&app.requester);

    let mut payload = record_payload(&app);
    payload["providerId"] = json!(uuid::Uuid::new_v4());

    let response = client
        .post(format!("{}/api/v1/requests", app.http_base()))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn endpoints_require_bearer_token() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/v1/requests", app.http_base()))
        .json(&record_payload(&app))
        .send()
        .await
        .expect("create without token");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!(
            "{}/api/v1/presence/{}",
            app.http_base(),
            app.provider.id
        ))
        .send()
        .await
        .expect("presence without token");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn presence_endpoint_reports_offline_user() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let token = app.token_for(&app.requester);

    let response = client
        .get(format!(
            "{}/api/v1/presence/{}",
            app.http_base(),
            app.provider.id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("presence");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("presence json");
    assert_eq!(body["userId"], json!(app.provider.id));
    assert_eq!(body["online"], false);
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", app.http_base()))
        .send()
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::OK);
}
