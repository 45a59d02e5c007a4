//! Authentication flows that feed the identity store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use adminshell_auth::{Identity, IdentityPatch, Preferences};
use adminshell_core::ShellError;
use adminshell_store::IdentityStore;

use crate::transport::{RequestOptions, Transport, TransportError};
use crate::types::Credentials;

pub const ME_PATH: &str = "/auth/me";
pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const PROFILE_PATH: &str = "/users/me";
pub const PREFERENCES_PATH: &str = "/users/me/preferences";

#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// Login, logout, bootstrap and self-service profile updates.
///
/// Every successful call leaves the store holding a whole new snapshot.
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    store: IdentityStore,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn Transport>, store: IdentityStore) -> Self {
        Self { transport, store }
    }

    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    /// Ask the backend who is logged in and hydrate the store with the answer.
    ///
    /// A 401 or an empty body means nobody is; the store is cleared.
    pub async fn bootstrap(&self) -> Result<Option<Identity>, AuthFlowError> {
        let result = self
            .transport
            .request(ME_PATH, RequestOptions::get())
            .await
            .into_result();

        let identity = match result {
            Ok(Some(data)) => Some(decode::<Identity>(data)?),
            Ok(None) => None,
            Err(err) if err.is_unauthorized() => None,
            Err(err) => return Err(err.into()),
        };

        debug!(authenticated = identity.is_some(), "identity bootstrapped");
        self.store.hydrate(identity.clone());
        Ok(identity)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthFlowError> {
        let body = serde_json::to_value(credentials).map_err(|e| AuthFlowError::Decode(e.to_string()))?;
        let data = match self
            .transport
            .request(LOGIN_PATH, RequestOptions::post(Some(body)))
            .await
            .into_result()
        {
            Ok(data) => data,
            Err(err) if err.is_unauthorized() => {
                warn!("login rejected");
                return Err(AuthFlowError::InvalidCredentials);
            }
            Err(err) => return Err(err.into()),
        };

        let identity: Identity = decode(data.ok_or_else(|| AuthFlowError::Decode("empty login response".into()))?)?;
        info!(user_id = %identity.id, "logged in");
        self.store.hydrate(Some(identity.clone()));
        Ok(identity)
    }

    /// The store is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<(), AuthFlowError> {
        let result = self
            .transport
            .request(LOGOUT_PATH, RequestOptions::post(None))
            .await
            .into_result();

        self.store.clear();
        match result {
            Ok(_) => {
                info!("logged out");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "logout call failed; local identity cleared anyway");
                Err(err.into())
            }
        }
    }

    /// Send a profile patch. The server's copy replaces the snapshot; when the
    /// server returns nothing the patch is applied locally.
    pub async fn update_profile(&self, patch: IdentityPatch) -> Result<Identity, AuthFlowError> {
        self.require_identity()?;

        let body = serde_json::to_value(&patch).map_err(|e| AuthFlowError::Decode(e.to_string()))?;
        let data = self
            .transport
            .request(PROFILE_PATH, RequestOptions::patch(body))
            .await
            .into_result()?;

        match data {
            Some(data) => self.store.replace(decode::<Identity>(data)?),
            None => self.store.patch(patch),
        }
        self.require_identity()
    }

    pub async fn update_preferences(&self, preferences: Preferences) -> Result<Preferences, AuthFlowError> {
        self.require_identity()?;

        let body = serde_json::to_value(&preferences).map_err(|e| AuthFlowError::Decode(e.to_string()))?;
        let data = self
            .transport
            .request(PREFERENCES_PATH, RequestOptions::patch(body))
            .await
            .into_result()?;

        let applied = match data {
            Some(data) => decode::<Preferences>(data)?,
            None => preferences,
        };
        self.store.patch(IdentityPatch {
            preferences: Some(applied.clone()),
            ..IdentityPatch::default()
        });
        Ok(applied)
    }

    fn require_identity(&self) -> Result<Identity, AuthFlowError> {
        self.store
            .snapshot()
            .map(|identity| (*identity).clone())
            .ok_or(AuthFlowError::Shell(ShellError::Unauthenticated))
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, AuthFlowError> {
    serde_json::from_value(data).map_err(|e| AuthFlowError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::{ApiResponse, Method};
    use adminshell_auth::{ColorMode, Role, UserStatus};
    use adminshell_core::UserId;
    use serde_json::json;
    use uuid::Uuid;

    fn alice() -> Identity {
        Identity::new(
            UserId::from_uuid(Uuid::from_u128(7)),
            "alice@example.com",
            "alice",
            "Alice",
        )
        .with_role(Role::new("admin", "Administrator"))
    }

    fn as_response(identity: &Identity) -> ApiResponse {
        ApiResponse::ok(serde_json::to_value(identity).unwrap())
    }

    fn unauthorized() -> ApiResponse {
        ApiResponse::failed(TransportError::Status {
            status: 401,
            message: "unauthorized".into(),
        })
    }

    #[tokio::test]
    async fn bootstrap_hydrates_store() {
        let transport = ScriptedTransport::new([as_response(&alice())]);
        let client = AuthClient::new(transport.clone(), IdentityStore::new());

        let identity = client.bootstrap().await.unwrap();
        assert_eq!(identity, Some(alice()));
        assert_eq!(client.store().snapshot().as_deref(), Some(&alice()));
        assert_eq!(transport.calls(), vec![(Method::Get, ME_PATH.to_string())]);
    }

    #[tokio::test]
    async fn bootstrap_unauthorized_clears_store() {
        let transport = ScriptedTransport::new([unauthorized()]);
        let client = AuthClient::new(transport, IdentityStore::with_initial(Some(alice())));

        assert_eq!(client.bootstrap().await.unwrap(), None);
        assert!(!client.store().is_authenticated());
    }

    #[tokio::test]
    async fn bootstrap_network_error_leaves_store_alone() {
        let transport = ScriptedTransport::new([ApiResponse::failed(TransportError::Network("down".into()))]);
        let client = AuthClient::new(transport, IdentityStore::with_initial(Some(alice())));

        assert!(matches!(client.bootstrap().await, Err(AuthFlowError::Transport(_))));
        assert!(client.store().is_authenticated());
    }

    #[tokio::test]
    async fn login_hydrates_and_sends_credentials() {
        let transport = ScriptedTransport::new([as_response(&alice())]);
        let client = AuthClient::new(transport.clone(), IdentityStore::new());

        let identity = client
            .login(&Credentials::new("alice@example.com", "s3cret"))
            .await
            .unwrap();
        assert_eq!(identity.username, "alice");
        assert!(client.store().is_authenticated());
        assert_eq!(
            transport.last_body(),
            Some(json!({"email": "alice@example.com", "password": "s3cret"}))
        );
    }

    #[tokio::test]
    async fn login_rejected_is_invalid_credentials() {
        let transport = ScriptedTransport::new([unauthorized()]);
        let client = AuthClient::new(transport, IdentityStore::new());

        let err = client.login(&Credentials::new("a@b.c", "nope")).await.unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCredentials));
        assert!(!client.store().is_authenticated());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn rejected_login_does_not_log_email() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let transport = ScriptedTransport::new([unauthorized()]);
        let client = AuthClient::new(transport, IdentityStore::new());
        client
            .login(&Credentials::new("private.person@example.com", "nope"))
            .await
            .unwrap_err();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("login rejected"));
        assert!(!output.contains("private.person@example.com"));
    }

    #[tokio::test]
    async fn logout_clears_even_when_call_fails() {
        let transport = ScriptedTransport::new([ApiResponse::failed(TransportError::Network("down".into()))]);
        let store = IdentityStore::with_initial(Some(alice()));
        let client = AuthClient::new(transport, store.clone());

        assert!(client.logout().await.is_err());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn profile_update_requires_identity() {
        let transport = ScriptedTransport::new(Vec::<ApiResponse>::new());
        let client = AuthClient::new(transport.clone(), IdentityStore::new());

        let err = client.update_profile(IdentityPatch::default()).await.unwrap_err();
        assert!(matches!(err, AuthFlowError::Shell(ShellError::Unauthenticated)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn profile_update_takes_server_copy() {
        let mut server_copy = alice();
        server_copy.display_name = "Alice (server)".into();
        server_copy.status = UserStatus::Busy;

        let transport = ScriptedTransport::new([as_response(&server_copy)]);
        let store = IdentityStore::with_initial(Some(alice()));
        let client = AuthClient::new(transport, store.clone());

        let patch = IdentityPatch {
            display_name: Some("Alice (local)".into()),
            ..Default::default()
        };
        let updated = client.update_profile(patch).await.unwrap();
        assert_eq!(updated.display_name, "Alice (server)");
        assert_eq!(store.snapshot().unwrap().status, UserStatus::Busy);
    }

    #[tokio::test]
    async fn profile_update_with_empty_response_applies_patch() {
        let transport = ScriptedTransport::new([ApiResponse::empty()]);
        let store = IdentityStore::with_initial(Some(alice()));
        let client = AuthClient::new(transport, store.clone());

        let patch = IdentityPatch {
            status: Some(UserStatus::Away),
            ..Default::default()
        };
        client.update_profile(patch).await.unwrap();
        assert_eq!(store.snapshot().unwrap().status, UserStatus::Away);
        assert_eq!(store.revision(), 1);
    }

    #[tokio::test]
    async fn preferences_update_replaces_snapshot() {
        let transport = ScriptedTransport::new([ApiResponse::empty()]);
        let store = IdentityStore::with_initial(Some(alice()));
        let before = store.snapshot().unwrap();
        let client = AuthClient::new(transport.clone(), store.clone());

        let prefs = Preferences {
            mode: ColorMode::Dark,
            ..Preferences::default()
        };
        let applied = client.update_preferences(prefs.clone()).await.unwrap();

        assert_eq!(applied, prefs);
        let after = store.snapshot().unwrap();
        assert_eq!(after.preferences.mode, ColorMode::Dark);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.preferences.mode, ColorMode::System);
        assert_eq!(
            transport.calls(),
            vec![(Method::Patch, PREFERENCES_PATH.to_string())]
        );
    }
}
