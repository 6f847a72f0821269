use anyhow::{Result, bail};
use studyhub_core::auth::AuthSnapshot;
use studyhub_core::user::SignUpDetails;

use super::{App, print_json};

pub async fn status(app: &App) -> Result<()> {
    app.auth.initialize().await;
    let snapshot = app.auth.resolved().await;
    print_json(&snapshot)
}

pub async fn sign_in(app: &App, email: &str, password: &str) -> Result<()> {
    app.auth.initialize().await;
    app.auth.sign_in(email, password).await?;
    print_json(&settled(app).await)
}

pub async fn sign_up(app: &App, email: &str, password: &str, name: Option<String>) -> Result<()> {
    app.auth.initialize().await;
    let details = SignUpDetails {
        name,
        ..SignUpDetails::default()
    };
    let outcome = app.auth.sign_up(email, password, details).await?;
    if outcome.session.is_none() {
        println!("Check {} for a confirmation link", email);
        return Ok(());
    }
    print_json(&settled(app).await)
}

pub async fn sign_out(app: &App) -> Result<()> {
    app.auth.initialize().await;
    app.auth.sign_out().await?;
    print_json(&app.auth.snapshot())
}

pub async fn profile(app: &App) -> Result<()> {
    app.auth.initialize().await;
    let snapshot = settled(app).await;
    match snapshot.profile {
        Some(profile) if snapshot.is_authenticated() => print_json(&profile),
        _ => bail!("Not signed in"),
    }
}

/// Waits (bounded) until the profile of the signed-in identity is reconciled.
async fn settled(app: &App) -> AuthSnapshot {
    let mut receiver = app.auth.subscribe();
    // fetch and insert are each bounded by the profile timeout
    let bound = app.config.auth.profile_timeout() * 2;
    match tokio::time::timeout(bound, receiver.wait_for(AuthSnapshot::is_settled)).await {
        Ok(Ok(snapshot)) => snapshot.clone(),
        _ => app.auth.snapshot(),
    }
}
