//! Minimal Axum request/response helpers for driving the router in-process,
//! grounded in the teacher's `tests/helpers/axum_test.rs`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde::Serialize;
use tower::ServiceExt;

pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl TestRequest {
    pub fn get(uri: &str) -> Self {
        Self { method: Method::GET, uri: uri.to_owned(), headers: Vec::new(), body: None }
    }

    pub fn post(uri: &str) -> Self {
        Self { method: Method::POST, uri: uri.to_owned(), headers: Vec::new(), body: None }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_json::to_string(data).expect("serialize request body"));
        self.headers
            .push((header::CONTENT_TYPE.as_str().to_owned(), "application/json".to_owned()));
        self
    }

    pub async fn send(self, app: Router) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }
        let request = builder
            .body(Body::from(self.body.unwrap_or_default()))
            .expect("build request");
        let response = app.oneshot(request).await.expect("router returned an error");
        TestResponse::from_response(response).await
    }
}

pub struct TestResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl TestResponse {
    async fn from_response(response: axum::http::Response<Body>) -> Self {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body")
            .to_vec();
        Self { status, body }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is valid JSON")
    }
}
