//! Session activity: the list of active sign-ins shown on the security screen.
//!
//! Each call to [`SessionActivityService::fetch_sessions`] takes a request
//! token. When the response arrives its token is compared with the latest one
//! issued; an older response is discarded without touching the state.
//! Sessions revoked through the service never reappear in a later result,
//! even one that was already in flight when the revoke completed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use adminshell_core::{SessionId, ShellError};

use crate::transport::{ApiResponse, RequestOptions, Transport, TransportError};
use crate::types::{Session, sort_by_recency};

pub const SESSIONS_PATH: &str = "/auth/sessions";

/// State exposed to the security screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<Session>),
    Failed(ShellError),
}

impl FetchState {
    /// Sessions to render. Empty unless loaded.
    pub fn sessions(&self) -> &[Session] {
        match self {
            FetchState::Loaded(sessions) => sessions,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn error(&self) -> Option<&ShellError> {
        match self {
            FetchState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// How a fetch ended for its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResolution {
    /// The result became the service state.
    Applied(FetchState),
    /// A newer fetch (or an invalidation) was issued meanwhile; the result was dropped.
    Superseded,
}

struct Inner {
    latest_token: u64,
    state: FetchState,
    revoked: HashSet<SessionId>,
}

pub struct SessionActivityService {
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
}

impl SessionActivityService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            inner: Mutex::new(Inner {
                latest_token: 0,
                state: FetchState::Idle,
                revoked: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> FetchState {
        self.lock().state.clone()
    }

    /// Fetch the current identity's sessions.
    ///
    /// Never returns an error: failures become [`FetchState::Failed`] and are
    /// logged.
    pub async fn fetch_sessions(&self) -> FetchResolution {
        let token = {
            let mut inner = self.lock();
            inner.latest_token += 1;
            inner.state = FetchState::Loading;
            inner.latest_token
        };

        let response = self.transport.request(SESSIONS_PATH, RequestOptions::get()).await;
        let parsed = parse_sessions(response);

        let mut inner = self.lock();
        if inner.latest_token != token {
            debug!(token, latest = inner.latest_token, "discarding superseded session fetch");
            return FetchResolution::Superseded;
        }

        let next = match parsed {
            Ok(mut sessions) => {
                sessions.retain(|s| !inner.revoked.contains(&s.id));
                debug!(token, count = sessions.len(), "session activity loaded");
                FetchState::Loaded(sessions)
            }
            Err(err) => {
                warn!(token, error = %err, "session activity fetch failed");
                FetchState::Failed(err)
            }
        };
        inner.state = next.clone();
        FetchResolution::Applied(next)
    }

    /// Forget the current state and ignore every in-flight fetch (view unmounted).
    pub fn invalidate(&self) {
        let mut inner = self.lock();
        inner.latest_token += 1;
        inner.state = FetchState::Idle;
    }

    /// Revoke one session. On success it is removed from a loaded list.
    pub async fn revoke_session(&self, id: SessionId) -> Result<(), TransportError> {
        let path = format!("{SESSIONS_PATH}/{id}");
        self.transport
            .request(&path, RequestOptions::delete())
            .await
            .into_result()?;

        let mut inner = self.lock();
        inner.revoked.insert(id);
        if let FetchState::Loaded(sessions) = &mut inner.state {
            sessions.retain(|s| s.id != id);
        }
        info!(session_id = %id, "session revoked");
        Ok(())
    }
}

impl core::fmt::Debug for SessionActivityService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionActivityService")
            .field("latest_token", &inner.latest_token)
            .field("state", &inner.state)
            .finish()
    }
}

/// Absent `data` is an empty list.
fn parse_sessions(response: ApiResponse) -> Result<Vec<Session>, ShellError> {
    let data = response
        .into_result()
        .map_err(|e| ShellError::session_fetch(e.to_string()))?;

    let mut sessions: Vec<Session> = match data {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ShellError::session_fetch(format!("malformed session list: {e}")))?,
        None => Vec::new(),
    };
    sort_by_recency(&mut sessions);
    Ok(sessions)
}
