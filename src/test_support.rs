//! Fakes shared by unit tests: a local HTTP server standing in for remote
//! endpoints, and an in-memory model gateway.

use anyhow::anyhow;
use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::model::Message;
use crate::model_gateway::{
    ModelGateway, ModelGatewayFuture, ModelGatewayRequest, ModelGatewayResponse,
};

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct RecordingState {
    status: StatusCode,
    body: Value,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub(crate) struct RecordingServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RecordingServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }
}

async fn record(
    State(state): State<RecordingState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state
        .requests
        .lock()
        .expect("requests lock poisoned")
        .push(RecordedRequest {
            path: uri.path().to_string(),
            authorization: header("authorization"),
            api_key: header("x-api-key"),
            body,
        });
    (state.status, Json(state.body.clone()))
}

/// Answers every JSON request with `status` and `body`, recording what it saw.
pub(crate) async fn spawn_recording_server(status: StatusCode, body: Value) -> RecordingServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(record).with_state(RecordingState {
        status,
        body,
        requests: Arc::clone(&requests),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("recording server should run");
    });

    RecordingServer {
        base_url: format!("http://{addr}"),
        requests,
    }
}

#[derive(Debug)]
enum StubOutcome {
    Ok(String),
    Err(String),
}

#[derive(Debug)]
pub(crate) struct StubGateway {
    calls: Mutex<Vec<Vec<Message>>>,
    outcome: StubOutcome,
}

impl StubGateway {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: StubOutcome::Ok(content.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: StubOutcome::Err(message.into()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

impl ModelGateway for StubGateway {
    fn chat<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(request.messages);
        let result = match &self.outcome {
            StubOutcome::Ok(content) => Ok(ModelGatewayResponse {
                content: content.clone(),
            }),
            StubOutcome::Err(message) => Err(anyhow!(message.clone())),
        };
        Box::pin(async move { result })
    }
}
