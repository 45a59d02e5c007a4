//! `adminshell-client` — the shell's backend-facing layer.
//!
//! - [`transport`]: the `request(path, options) -> { data, error }` contract
//!   and its `reqwest` implementation (feature `http`)
//! - [`sessions`]: session activity with last-request-wins fetches
//! - [`auth`]: bootstrap, login, logout and profile updates feeding the store
//! - [`guard`], [`nav`], [`views`]: routing and view models derived from the
//!   current identity and locale

pub mod auth;
pub mod config;
pub mod guard;
pub mod nav;
pub mod sessions;
pub mod transport;
pub mod types;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthClient, AuthFlowError};
pub use config::ShellConfig;
pub use guard::{GuardDecision, RedirectReason, RouteGuard};
pub use nav::{NavItem, NavigationModel, build_menu, default_links};
pub use sessions::{FetchResolution, FetchState, SessionActivityService};
pub use transport::{ApiResponse, Method, RequestOptions, Transport, TransportError};
pub use types::{Credentials, Session};
pub use views::{HeaderView, SecurityView, SessionRow};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
