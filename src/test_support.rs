//! Router-level helpers shared by handler tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::{build_router, AppState};

const BOUNDARY: &str = "mindful-test-boundary";

pub async fn test_state() -> AppState {
    test_state_with_step(Duration::from_millis(1500)).await
}

pub async fn test_state_with_step(step: Duration) -> AppState {
    let mut config = Config::for_tests();
    config.analysis_step_interval_ms = step.as_millis() as u64;
    AppState::new(crate::db::memory_pool().await, Arc::new(config), None)
}

pub struct TestFile {
    name: String,
    content_type: String,
    size: usize,
}

impl TestFile {
    pub fn new(name: &str, content_type: &str, size: usize) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size,
        }
    }
}

async fn send(state: &AppState, mut req: Request<Body>) -> Response {
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
    build_router(state.clone())
        .oneshot(req)
        .await
        .expect("router is infallible")
}

pub async fn body_json(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn get(state: &AppState, uri: &str) -> Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(state, req).await
}

pub async fn delete(state: &AppState, uri: &str) -> Response {
    let req = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(state, req).await
}

pub async fn post_json(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    body_json(send(state, req).await).await
}

pub async fn post_multipart(state: &AppState, uri: &str, files: &[TestFile]) -> (StatusCode, Value) {
    let mut body: Vec<u8> = Vec::new();
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.name, file.content_type
            )
            .as_bytes(),
        );
        body.extend(std::iter::repeat(b'x').take(file.size));
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    body_json(send(state, req).await).await
}
