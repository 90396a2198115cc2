//! Stub companion service for tests.
//!
//! Serves `POST /prompt/` with a scripted [`StubBehavior`]. Any other
//! method on the route answers 405, which is what the supervisor's health
//! probe expects from the real companion.
//!
//! Used in-process through [`StubCompanion`] and out-of-process through the
//! `stub-companion` binary, which the supervisor can launch like the real
//! script.

use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use flashgen_core::contracts::{PROMPT_PATH, PromptRequestBody, PromptResponseBody};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Sentence returned by the default behavior.
pub const STUB_SENTENCE: &str = "He likes to ___ every morning.";

/// How the stub answers `POST /prompt/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubBehavior {
    /// `200 {"response": text}`
    Respond(String),
    /// `200` with a JSON object lacking `response`
    MissingField,
    /// `200` with a truncated JSON body
    Malformed,
    /// Never answers
    Hang,
}

impl Default for StubBehavior {
    fn default() -> Self {
        Self::Respond(STUB_SENTENCE.to_string())
    }
}

impl FromStr for StubBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "respond" => Ok(Self::default()),
            "missing-field" => Ok(Self::MissingField),
            "malformed" => Ok(Self::Malformed),
            "hang" => Ok(Self::Hang),
            other => Err(format!("unknown stub behavior: {other}")),
        }
    }
}

#[derive(Clone)]
struct StubState {
    behavior: StubBehavior,
    received: Arc<Mutex<Vec<PromptRequestBody>>>,
}

/// Router serving the prompt route with `behavior`.
fn router(state: StubState) -> Router {
    Router::new()
        .route(PROMPT_PATH, post(prompt))
        .with_state(state)
}

async fn prompt(State(state): State<StubState>, Json(body): Json<PromptRequestBody>) -> Response {
    debug!(front = %body.front_side, back = %body.back_side, "POST /prompt/");
    state
        .received
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body);

    match state.behavior {
        StubBehavior::Respond(text) => Json(PromptResponseBody { response: text }).into_response(),
        StubBehavior::MissingField => {
            Json(serde_json::json!({ "sentence": STUB_SENTENCE })).into_response()
        }
        StubBehavior::Malformed => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"response": "He likes to"#,
        )
            .into_response(),
        StubBehavior::Hang => std::future::pending().await,
    }
}

/// Serve until the process is killed. Used by the `stub-companion` binary.
pub async fn serve(listener: TcpListener, behavior: StubBehavior) -> io::Result<()> {
    let state = StubState {
        behavior,
        received: Arc::default(),
    };
    axum::serve(listener, router(state)).await
}

/// A stub running as a task on the current runtime.
///
/// The server task is aborted on drop.
pub struct StubCompanion {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<PromptRequestBody>>>,
    handle: JoinHandle<()>,
}

impl StubCompanion {
    /// Start a stub on an ephemeral loopback port.
    pub async fn spawn(behavior: StubBehavior) -> io::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        Self::spawn_on(listener, behavior)
    }

    /// Start a stub on an already bound listener.
    pub fn spawn_on(listener: TcpListener, behavior: StubBehavior) -> io::Result<Self> {
        let addr = listener.local_addr()?;
        let received = Arc::<Mutex<Vec<PromptRequestBody>>>::default();
        let state = StubState {
            behavior,
            received: received.clone(),
        };

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router(state)).await {
                tracing::error!(error = %e, "Stub companion server error");
            }
        });

        info!(%addr, "Stub companion started");
        Ok(Self {
            addr,
            received,
            handle,
        })
    }

    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Request bodies received so far, oldest first.
    pub fn received(&self) -> Vec<PromptRequestBody> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for StubCompanion {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A loopback port that was free a moment ago.
pub fn free_port() -> io::Result<u16> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
