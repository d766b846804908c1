//! Web chat with Aurora.
//!
//! Serves a single chat page.  The API key is taken from the secrets file
//! (`.aurora/secrets.yaml` by default) or `GOOGLE_API_KEY`; when neither has
//! one, every browser is asked for its own key.
//!
//! # Usage
//!
//! ```bash
//! # Serve on http://127.0.0.1:8501 with ./aurora_avatar.jpg
//! aurora-web
//!
//! # Listen on all interfaces with a different avatar
//! aurora-web --host 0.0.0.0 --port 8080 --avatar static/aurora.png
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use arrrg::CommandLine;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use aurora::ErrorKind;
use aurora::credential::{CredentialResolver, EnvironmentVariable, SecretsStore};
use aurora::persona::configuration_failure;
use aurora::web::{
    AppState, AvatarAsset, GenerativeConnector, ModelConnector, WebArgs, WebConfig, serve,
};

/// Main entry point for the aurora-web application.
#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_env("AURORA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let (args, _) = WebArgs::from_command_line_relaxed("aurora-web [OPTIONS]");
    let config = WebConfig::from(args);

    let avatar = match AvatarAsset::load(&config.avatar) {
        Ok(avatar) => avatar,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let credential = match CredentialResolver::new()
        .with_provider(SecretsStore::new(config.secrets.clone()))
        .with_provider(EnvironmentVariable::default())
        .resolve()
    {
        Ok(credential) => {
            tracing::info!(source = %credential.source(), "using the server's API key");
            Some(credential)
        }
        Err(err) if err.kind() == ErrorKind::MissingCredential => {
            tracing::info!("no server API key; browsers will be asked for one");
            None
        }
        Err(err) => return Err(err.into()),
    };

    let connector = Arc::new(GenerativeConnector::new(config.chat.clone()));
    if let Some(credential) = &credential
        && let Err(err) = connector.connect(credential)
    {
        eprintln!("{}", configuration_failure(&err));
        return Ok(ExitCode::FAILURE);
    }

    let state = AppState::new(
        config.chat.persona,
        avatar,
        connector,
        credential,
        config.session_ttl,
    );

    let listener = match TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("Failed to bind to {}: {err}", config.bind_address());
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("Aurora AI Chatbot running at http://{}", listener.local_addr()?);

    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    Ok(ExitCode::SUCCESS)
}
