//! In-memory transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::transport::{ApiResponse, Method, RequestOptions, Transport, TransportError};

/// A request waiting for the test to answer it.
pub(crate) struct Pending {
    pub path: String,
    pub respond: oneshot::Sender<ApiResponse>,
}

/// Transport that replays canned responses, or hands each request to the test
/// when gated.
pub(crate) struct ScriptedTransport {
    calls: Mutex<Vec<(Method, String, RequestOptions)>>,
    replies: Mutex<VecDeque<ApiResponse>>,
    gate: Option<mpsc::UnboundedSender<Pending>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = ApiResponse>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into_iter().collect()),
            gate: None,
        })
    }

    pub fn gated() -> (Arc<Self>, mpsc::UnboundedReceiver<Pending>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            gate: Some(tx),
        });
        (transport, rx)
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, p, _)| (*m, p.clone()))
            .collect()
    }

    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.calls.lock().unwrap().last().and_then(|(_, _, o)| o.body.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, path: &str, options: RequestOptions) -> ApiResponse {
        self.calls
            .lock()
            .unwrap()
            .push((options.method, path.to_string(), options));

        if let Some(gate) = &self.gate {
            let (tx, rx) = oneshot::channel();
            let _ = gate.send(Pending {
                path: path.to_string(),
                respond: tx,
            });
            return rx
                .await
                .unwrap_or_else(|_| ApiResponse::failed(TransportError::Network("dropped".into())));
        }

        self.replies.lock().unwrap().pop_front().unwrap_or_default()
    }
}
