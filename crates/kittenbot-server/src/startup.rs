//! Process bootstrap: credentials first, then the objects that use them.

use std::sync::Arc;

use kittenbot::completion::CompletionClient;
use kittenbot::errors::MissingSecretsError;
use kittenbot::handler::MessageHandler;
use kittenbot::providers::openai::OpenAiProvider;
use kittenbot::secrets::store::SecretStore;
use kittenbot::secrets::{Credentials, SecretNames, SecretProvider};
use kittenbot::slack::client::{SlackClient, SlackClientConfig};
use kittenbot::slack::verify::SignatureVerifier;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::configuration::Settings;
use crate::routes;
use crate::state::AppState;

/// Process exit status when a required secret cannot be resolved
pub const MISSING_SECRETS_EXIT_CODE: u8 = 1;

/// Resolve credentials, then bind and serve until the server stops.
///
/// Returns the process exit status. When any secret is missing the listener is
/// never bound.
pub async fn run<S: SecretStore>(settings: &Settings, store: S) -> anyhow::Result<u8> {
    let credentials = match load_credentials(store, &settings.secrets.names()).await {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{}. Exiting...", e);
            return Ok(MISSING_SECRETS_EXIT_CODE);
        }
    };

    let state = build_state(settings, credentials)?;
    let app = routes::configure(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("Server is running on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(0)
}

/// Resolve the three required credentials. Any absent one is fatal to the caller.
pub async fn load_credentials<S: SecretStore>(
    store: S,
    names: &SecretNames,
) -> Result<Credentials, MissingSecretsError> {
    SecretProvider::new(store).resolve_credentials(names).await
}

pub fn build_state(settings: &Settings, credentials: Credentials) -> anyhow::Result<AppState> {
    let Credentials {
        bot_token,
        signing_secret,
        api_key,
    } = credentials;

    let provider = OpenAiProvider::new(settings.completion.provider_config(api_key.into_secret()))?;
    info!(model = provider.model(), "Completion backend configured");

    let slack = SlackClient::new(SlackClientConfig {
        api_base: settings.slack.api_base.clone(),
        bot_token: bot_token.into_secret(),
    })?;

    let handler = MessageHandler::new(CompletionClient::new(Arc::new(provider)), Arc::new(slack))
        .with_interim_message(Some(settings.slack.interim_message.clone()));

    let verifier = if settings.slack.verify_signatures {
        Some(Arc::new(SignatureVerifier::new(signing_secret.into_secret())))
    } else {
        warn!("Request signature verification is disabled; unsigned deliveries will be accepted");
        None
    };

    Ok(AppState {
        handler,
        verifier,
        process_before_response: settings.slack.process_before_response,
    })
}
