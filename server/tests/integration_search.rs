use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pepsearch_core::{EngineConfig, IndexHandle, RawRecord, VecSource};
use pepsearch_server::{build_app, AppState, ServerOptions};
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn person(name: &str, birthplace: &str) -> RawRecord {
    RawRecord { birthplace: Some(birthplace.into()), ..RawRecord::named(name) }
}

fn app_with(records: Vec<RawRecord>) -> Router {
    let state = AppState::new(IndexHandle::new(), &EngineConfig::default(), None);
    state.ingestor.rebuild_from(&VecSource::new(records)).unwrap();
    build_app(state)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn search_returns_ranked_documents() {
    let app = app_with(vec![person("Bob Jones", "Austin"), person("Alice Smith", "Boston")]);
    let (status, json) = call(app, post_json("/search", json!({ "search_text": "Alice" }))).await;
    assert_eq!(status, StatusCode::OK);
    let arr = json.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["name"], "Alice Smith");
    assert_eq!(arr[0]["birthplace"], "Boston");
    assert_eq!(arr[0]["id"], 1);
}

#[tokio::test]
async fn missing_or_blank_search_text_is_bad_request() {
    let app = app_with(vec![person("Alice Smith", "Boston")]);
    let (status, json) = call(app.clone(), post_json("/search", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "search_text is required");

    let (status, _) = call(app, post_json("/search", json!({ "search_text": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_search_body_is_bad_request() {
    let app = app_with(vec![person("Alice Smith", "Boston")]);
    let (status, json) = call(app.clone(), post_json("/search", json!({ "search_text": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "search_text is required");

    let garbled = Request::post("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("search_text=Alice"))
        .unwrap();
    let (status, json) = call(app, garbled).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "search_text is required");
}

#[tokio::test]
async fn no_matches_is_not_found_with_message() {
    let app = app_with(vec![person("Alice Smith", "Boston"), person("Bob Jones", "Austin")]);
    let (status, json) = call(app, post_json("/search", json!({ "search_text": "zzzzz" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No results found");
}

#[tokio::test]
async fn size_limits_the_page() {
    let records = (0..30).map(|i| person(&format!("Lee Number{i}"), "Leeds")).collect();
    let app = app_with(records);
    let (_, json) = call(app.clone(), post_json("/search", json!({ "search_text": "Lee" }))).await;
    assert_eq!(json.as_array().unwrap().len(), 10);
    let (_, json) = call(app, post_json("/search", json!({ "search_text": "Lee", "size": 3 }))).await;
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn doc_lookup() {
    let app = app_with(vec![person("Alice Smith", "Boston")]);
    let (status, json) = call(app.clone(), Request::get("/doc/0").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Alice Smith");
    assert_eq!(json["birthdate"], Value::Null);
    let (status, _) = call(app, Request::get("/doc/42").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rebuild_rereads_the_data_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("people.csv");
    fs::write(&data, "name,birthdate,birthplace,notes\nAlice Smith,1970-01-02,Boston,\n").unwrap();
    let opts = ServerOptions { index_dir: None, data_file: Some(data.clone()), config: EngineConfig::default() };
    let app = build_app(AppState::load(opts).unwrap());

    let (status, json) = call(app.clone(), post_json("/search", json!({ "search_text": "Alice" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["birthdate"], "1970-01-02");

    fs::write(&data, "name,birthdate,birthplace,notes\nBob Jones,,Austin,\n,,Nowhere,\n").unwrap();
    let (status, json) = call(app.clone(), Request::post("/index/rebuild").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["indexed"], 1);
    assert_eq!(json["skipped"], 1);

    let (status, _) = call(app.clone(), post_json("/search", json!({ "search_text": "Alice" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, json) = call(app, post_json("/search", json!({ "search_text": "Jones" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["name"], "Bob Jones");
}

#[tokio::test]
async fn rebuild_without_data_file_is_unavailable() {
    let app = app_with(vec![]);
    let (status, _) = call(app, Request::post("/index/rebuild").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
