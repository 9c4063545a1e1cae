//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use users_api::config::AppConfig;
use users_api::http::server::{build_router, AppState};
use users_api::observability::RequestLogger;
use users_api::{HttpServer, Shutdown};

/// Defaults with file logging off.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.logging.file_enabled = false;
    config
}

/// Router plus the state behind it, driven in-process.
pub fn test_app(config: &AppConfig) -> (Router, AppState) {
    let state = AppState::from_config(config, RequestLogger::default());
    (build_router(state.clone()), state)
}

pub fn admin_token(state: &AppState) -> String {
    state.tokens.issue("Nikolai", "admin").unwrap()
}

/// Send one request through the router and decode the JSON body (if any).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Response<()>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (parts.status, Response::from_parts(parts, ()), json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn with_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub token: String,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub async fn start(config: AppConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = HttpServer::new(config);
        let token = server.state().tokens.issue("Nikolai", "admin").unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

        Self {
            addr,
            token,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait until the server (and its log writer) stopped.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

pub fn read_log(dir: &Path, prefix: &str) -> String {
    let date = chrono::Local::now().format("%Y-%m-%d");
    std::fs::read_to_string(dir.join(format!("{prefix}_{date}.txt"))).unwrap_or_default()
}
