//! `adminshell`: bootstrap the identity against a backend and print what the
//! shell would render.

use std::sync::Arc;

use anyhow::Context;

use adminshell_client::{
    AuthClient, FetchResolution, HeaderView, HttpTransport, NavigationModel, SecurityView,
    SessionActivityService, ShellConfig,
};
use adminshell_i18n::{load_dictionary, resolve_locale_with_preference};
use adminshell_store::IdentityStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ShellConfig::from_env();
    adminshell_observability::init(config.log_format);

    let table = config.locale_table();
    let mut transport = HttpTransport::new(&config.api_base_url, config.request_timeout)
        .context("failed to build HTTP client")?;
    if let Some(token) = &config.auth_token {
        transport = transport.with_token(token);
    }
    let transport = Arc::new(transport);

    let store = IdentityStore::new();
    let auth = AuthClient::new(transport.clone(), store.clone());
    let identity = auth
        .bootstrap()
        .await
        .with_context(|| format!("bootstrap against {} failed", config.api_base_url))?;

    let user_locale = std::env::args().nth(1);
    let locale = resolve_locale_with_preference(&table, user_locale.as_deref(), None);
    let dictionary = load_dictionary(locale.code).context("bundled dictionary unavailable")?;
    tracing::info!(locale = locale.code, authenticated = identity.is_some(), "shell ready");

    let header = HeaderView::render(identity.as_ref(), locale, dictionary);
    println!("{} [{}] dir={}", header.greeting, header.status, header.dir);

    let nav = NavigationModel::new(&store, table, locale);
    for item in nav.items() {
        println!("  {:<20} {}", item.label, item.href);
    }

    if identity.is_some() {
        let sessions = SessionActivityService::new(transport);
        let state = match sessions.fetch_sessions().await {
            FetchResolution::Applied(state) => state,
            FetchResolution::Superseded => sessions.state(),
        };
        let view = SecurityView::render(identity.as_ref(), &state, dictionary);
        println!("{}", serde_json::to_string_pretty(&view).context("failed to encode view")?);
    }

    Ok(())
}
