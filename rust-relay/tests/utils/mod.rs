#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::LOCATION, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use line_relay::{build_router, AppState, BackgroundTasks, Config};
use tokio::net::TcpListener;

/// Scripted collector behaviour for one call.
#[derive(Clone, Debug)]
pub enum Reply {
    Status(u16),
    Redirect(String),
    RedirectWithoutLocation,
    Delayed(Duration, u16),
}

/// A request the collector received.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Local stand-in for the downstream collector.
pub struct Collector {
    pub base: String,
    script: Mutex<VecDeque<Reply>>,
    recorded: Mutex<Vec<Recorded>>,
}

impl Collector {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

/// Start a collector that answers with `script` in order, then 200.
pub async fn spawn_collector(script: Vec<Reply>) -> Arc<Collector> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let collector = Arc::new(Collector {
        base: format!("http://{addr}"),
        script: Mutex::new(script.into()),
        recorded: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .fallback(record)
        .with_state(Arc::clone(&collector));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    collector
}

async fn record(
    State(collector): State<Arc<Collector>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    collector.recorded.lock().unwrap().push(Recorded {
        method,
        uri: uri.to_string(),
        headers,
        body,
    });

    let reply = collector
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(Reply::Status(200));

    match reply {
        Reply::Status(code) => StatusCode::from_u16(code).unwrap().into_response(),
        Reply::Redirect(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
        Reply::RedirectWithoutLocation => StatusCode::FOUND.into_response(),
        Reply::Delayed(delay, code) => {
            tokio::time::sleep(delay).await;
            StatusCode::from_u16(code).unwrap().into_response()
        }
    }
}

/// URL on a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/exec")
}

pub fn test_config(downstream_url: Option<String>) -> Config {
    Config {
        downstream_url,
        hop_timeout_ms: 2000,
        ..Config::default()
    }
}

/// Relay router plus the task handle used to wait for deliveries.
pub fn relay_app(config: Config) -> (Router, BackgroundTasks) {
    let tasks = BackgroundTasks::new();
    let state = AppState::new(config, tasks.clone()).unwrap();
    (build_router(state), tasks)
}
