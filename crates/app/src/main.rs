use std::sync::Arc;

use anyhow::Context;

use syzportal_app::{AppState, PASSWORD_VAR, USERNAME_VAR};
use syzportal_client::ClientConfig;
use syzportal_navigation::LoggingNavigator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    syzportal_observability::init();

    let config = ClientConfig::from_env();
    let app = AppState::init(config, Arc::new(LoggingNavigator))
        .await
        .context("failed to initialise application state")?;

    if !app.backend_healthy().await {
        tracing::warn!("backend health probe failed");
    }

    if app.auth().user().is_none() {
        let credentials = (std::env::var(USERNAME_VAR), std::env::var(PASSWORD_VAR));
        if let (Ok(username), Ok(password)) = credentials {
            app.login(&username, &password)
                .await
                .with_context(|| format!("login as {username} failed"))?;
        } else {
            tracing::info!("no session and no credentials; showing anonymous navigation");
        }
    }

    let snapshot = app.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    app.dispose();
    Ok(())
}
