mod common;

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{sample_png, spawn_app, test_config, ScriptedFactory, TestApp};
use ocrbox::db::NullResultStore;
use ocrbox::storage::{HttpObjectStorage, LocalObjectStorage, ObjectStorage};

const KEYS: &[&str] = &["alice:alice-key", "bob:bob-key"];

fn local_storage(dir: &TempDir) -> Arc<dyn ObjectStorage> {
    Arc::new(LocalObjectStorage::new(
        dir.path().join("uploads"),
        "http://files.test/files",
    ))
}

async fn local_app(dir: &TempDir) -> (TestApp, Arc<ScriptedFactory>) {
    let factory = Arc::new(ScriptedFactory::new("INVOICE 42", Some(0.913)));
    let app = spawn_app(
        test_config(KEYS, dir),
        factory.clone(),
        local_storage(dir),
        None,
    )
    .await;
    (app, factory)
}

fn process_body(file_name: &str) -> Value {
    json!({
        "imageDataBase64": STANDARD.encode(sample_png(64, 32)),
        "fileName": file_name,
        "mimeType": "image/png",
    })
}

async fn post(app: &TestApp, path: &str, key: Option<&str>, body: &Value) -> (u16, Value) {
    let mut request = reqwest::Client::new().post(app.url(path)).json(body);
    if let Some(key) = key {
        request = request.bearer_auth(key);
    }
    let response = request.send().await.expect("request");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

async fn get(app: &TestApp, path: &str, key: &str) -> (u16, Value) {
    let response = reqwest::Client::new()
        .get(app.url(path))
        .bearer_auth(key)
        .send()
        .await
        .expect("request");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

fn uploaded_files(dir: &TempDir) -> usize {
    fn walk(path: &std::path::Path) -> usize {
        match std::fs::read_dir(path) {
            Ok(entries) => entries
                .flatten()
                .map(|e| {
                    let p = e.path();
                    if p.is_dir() {
                        walk(&p)
                    } else {
                        1
                    }
                })
                .sum(),
            Err(_) => 0,
        }
    }
    walk(&dir.path().join("uploads"))
}

#[tokio::test]
async fn test_process_image_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (app, factory) = local_app(&dir).await;

    let (status, body) = post(&app, "/ocr:process", Some("alice-key"), &process_body("invoice.png")).await;

    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["text"], "INVOICE 42");
    assert_eq!(data["confidence"], 91);
    assert_eq!(data["language"], "eng");
    assert_eq!(data["success"], true);
    assert!(data["imageUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://files.test/files/ocr/alice/"));
    assert_eq!(factory.created(), 1);
    assert_eq!(uploaded_files(&dir), 1);

    let (status, history) = get(&app, "/ocr/results", "alice-key").await;
    assert_eq!(status, 200);
    assert_eq!(history["data"][0]["id"], data["resultId"]);
    assert_eq!(history["data"][0]["confidence"], 91);
}

#[tokio::test]
async fn test_engine_is_created_once_and_reused() {
    let dir = TempDir::new().unwrap();
    let (app, factory) = local_app(&dir).await;

    for i in 0..3 {
        let (status, _) = post(&app, "/ocr:process", Some("alice-key"), &process_body(&format!("{i}.png"))).await;
        assert_eq!(status, 200);
    }
    assert_eq!(factory.created(), 1);

    let (_, health) = get(&app, "/health", "alice-key").await;
    assert_eq!(health["data"]["ocr"]["engines"][0]["language"], "eng");
    assert_eq!(health["data"]["ocr"]["engines"][0]["state"], "ready");
}

#[tokio::test]
async fn test_unauthenticated_requests_do_no_work() {
    let dir = TempDir::new().unwrap();
    let (app, factory) = local_app(&dir).await;

    let (status, body) = post(&app, "/ocr:process", None, &process_body("a.png")).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "unauthorized");

    let batch = json!({ "images": [{ "imageData": STANDARD.encode(sample_png(8, 8)), "fileName": "a.png" }] });
    let (status, _) = post(&app, "/ocr:batch", Some("mallory-key"), &batch).await;
    assert_eq!(status, 401);

    assert_eq!(factory.created(), 0);
    assert_eq!(uploaded_files(&dir), 0);
}

#[tokio::test]
async fn test_history_is_newest_first_and_user_scoped() {
    let dir = TempDir::new().unwrap();
    let (app, _) = local_app(&dir).await;

    for name in ["first.png", "second.png", "third.png"] {
        let (status, _) = post(&app, "/ocr:process", Some("alice-key"), &process_body(name)).await;
        assert_eq!(status, 200);
    }
    let (status, _) = post(&app, "/ocr:process", Some("bob-key"), &process_body("bob.png")).await;
    assert_eq!(status, 200);

    let (_, alice) = get(&app, "/ocr/results", "alice-key").await;
    let names: Vec<&str> = alice["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["imageFileName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["third.png", "second.png", "first.png"]);
    assert_eq!(alice["meta"]["total"], 3);

    let (_, limited) = get(&app, "/ocr/results?limit=2", "alice-key").await;
    assert_eq!(limited["data"].as_array().unwrap().len(), 2);
    assert_eq!(limited["meta"]["limit"], 2);

    let (_, bob) = get(&app, "/ocr/results", "bob-key").await;
    assert_eq!(bob["data"].as_array().unwrap().len(), 1);

    // Bob cannot read or delete Alice's results.
    let alice_id = alice["data"][0]["id"].as_str().unwrap();
    let (status, _) = get(&app, &format!("/ocr/results/{alice_id}"), "bob-key").await;
    assert_eq!(status, 404);

    let response = reqwest::Client::new()
        .delete(app.url(&format!("/ocr/results/{alice_id}")))
        .bearer_auth("bob-key")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["success"], false);

    let (_, alice_again) = get(&app, "/ocr/results", "alice-key").await;
    assert_eq!(alice_again["meta"]["total"], 3);
}

#[tokio::test]
async fn test_oversized_image_is_rejected_before_recognition() {
    let dir = TempDir::new().unwrap();
    let factory = Arc::new(ScriptedFactory::new("x", Some(0.5)));
    let mut config = test_config(KEYS, &dir);
    config.ocr.max_file_size = 1024;
    let app = spawn_app(config, factory.clone(), local_storage(&dir), None).await;

    let body = json!({
        "imageDataBase64": STANDARD.encode(vec![0u8; 4096]),
        "fileName": "big.png",
        "mimeType": "image/png",
    });
    let (status, json) = post(&app, "/ocr:process", Some("alice-key"), &body).await;

    assert_eq!(status, 400);
    assert_eq!(json["error"]["code"], "invalid_request");
    assert!(json["error"]["message"].as_str().unwrap().contains("MB"));
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn test_http_storage_failure_is_reported_and_nothing_persisted() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/bucket/ocr/alice/.+-scan\.png$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .expect(1)
        .mount(&server)
        .await;

    let storage: Arc<dyn ObjectStorage> = Arc::new(
        HttpObjectStorage::new(&format!("{}/bucket", server.uri()), None, 5).unwrap(),
    );
    let factory = Arc::new(ScriptedFactory::new("text", Some(0.9)));
    let app = spawn_app(test_config(KEYS, &dir), factory, storage, None).await;

    let (status, body) = post(&app, "/ocr:process", Some("alice-key"), &process_body("scan.png")).await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], "service_unavailable");
    assert!(body["error"]["message"].as_str().unwrap().contains("disk full"));

    let (_, history) = get(&app, "/ocr/results", "alice-key").await;
    assert_eq!(history["meta"]["total"], 0);
}

#[tokio::test]
async fn test_unavailable_store_removes_uploaded_object() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/bucket/ocr/alice/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://cdn.test/ocr/alice/scan.png"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/bucket/ocr/alice/.+$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let storage: Arc<dyn ObjectStorage> = Arc::new(
        HttpObjectStorage::new(&format!("{}/bucket", server.uri()), None, 5).unwrap(),
    );
    let factory = Arc::new(ScriptedFactory::new("text", Some(0.9)));
    let app = spawn_app(
        test_config(KEYS, &dir),
        factory,
        storage,
        Some(Arc::new(NullResultStore)),
    )
    .await;

    let (status, body) = post(&app, "/ocr:process", Some("alice-key"), &process_body("scan.png")).await;
    assert_eq!(status, 503);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Result store is unavailable"));

    server.verify().await;
}

#[tokio::test]
async fn test_http_storage_url_is_returned_to_caller() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/bucket/ocr/alice/.+$"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "url": "https://cdn.test/ocr/alice/receipt.png"
        })))
        .mount(&server)
        .await;

    let storage: Arc<dyn ObjectStorage> = Arc::new(
        HttpObjectStorage::new(&format!("{}/bucket", server.uri()), None, 5).unwrap(),
    );
    let factory = Arc::new(ScriptedFactory::new("TOTAL 9.99", Some(0.75)));
    let app = spawn_app(test_config(KEYS, &dir), factory, storage, None).await;

    let (status, body) = post(&app, "/ocr:process", Some("alice-key"), &process_body("receipt.png")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["imageUrl"], "https://cdn.test/ocr/alice/receipt.png");

    let (_, history) = get(&app, "/ocr/results", "alice-key").await;
    assert_eq!(
        history["data"][0]["imageUrl"],
        "https://cdn.test/ocr/alice/receipt.png"
    );
}

#[tokio::test]
async fn test_upload_multipart_sniffs_missing_content_type() {
    let dir = TempDir::new().unwrap();
    let (app, _) = local_app(&dir).await;

    let part = reqwest::multipart::Part::bytes(sample_png(32, 32)).file_name("photo.bin");
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("language", "eng");

    let response = reqwest::Client::new()
        .post(app.url("/ocr:upload"))
        .bearer_auth("alice-key")
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["text"], "INVOICE 42");
    assert!(body["data"]["imageUrl"].as_str().unwrap().ends_with("-photo.bin"));
}
