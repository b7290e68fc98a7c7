//! # Application State
//!
//! The shared state built at startup: the orchestrator (agents, provider,
//! document store, memory sink) plus the per-session context registry.

use crate::config::AppConfig;
use shelfkeep::memory::MemorySink;
use shelfkeep::providers::ai::{
    gemini::GeminiProvider, local::LocalAiProvider, ChatProvider, RetryPolicy,
};
use shelfkeep::session::SessionContext;
use shelfkeep::store::{memory::MemoryDocumentStore, DocumentStore};
use shelfkeep::Orchestrator;
use shelfkeep_firestore::{connect_db, FirestoreDocumentStore, FirestoreMemorySink};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The assembled agent hierarchy.
    pub orchestrator: Arc<Orchestrator>,
    /// Live conversation contexts, keyed by session ID.
    pub sessions: Arc<RwLock<HashMap<String, SessionContext>>>,
}

impl AppState {
    /// Returns the context for a session, creating it on first use.
    pub fn session(&self, session_id: &str) -> SessionContext {
        let mut sessions = self.sessions.write().expect("session registry poisoned");
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext::new(session_id))
            .clone()
    }
}

/// Builds the shared application state from the configuration.
///
/// This instantiates the chat provider named by `agent_provider`, opens the
/// configured document-store backend, and wires the orchestrator.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let provider_config = config.providers.get(&config.agent_provider).ok_or_else(|| {
        anyhow::anyhow!(
            "agent_provider '{}' has no entry in the providers map",
            config.agent_provider
        )
    })?;

    let retry: RetryPolicy = config.retry.clone().into();
    let provider: Box<dyn ChatProvider> = match provider_config.provider.as_str() {
        "gemini" => {
            let api_key = provider_config.api_key.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "api_key is required for gemini provider '{}'",
                    config.agent_provider
                )
            })?;
            // If api_url is not provided in config, construct it from the model name.
            let api_url = provider_config
                .api_url
                .clone()
                .unwrap_or_else(|| GeminiProvider::api_url_for_model(&provider_config.model_name));
            Box::new(GeminiProvider::new(api_url, api_key)?.with_retry(retry))
        }
        "local" => {
            let api_url = provider_config.api_url.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "api_url is required for local provider '{}'",
                    config.agent_provider
                )
            })?;
            Box::new(
                LocalAiProvider::new(
                    api_url,
                    provider_config.api_key.clone(),
                    Some(provider_config.model_name.clone()),
                )?
                .with_retry(retry),
            )
        }
        other => {
            return Err(anyhow::anyhow!(
                "Unsupported AI provider type '{other}' for provider '{}'",
                config.agent_provider
            ));
        }
    };

    let (store, memory): (Arc<dyn DocumentStore>, Option<Arc<dyn MemorySink>>) =
        match config.store.backend.as_str() {
            "firestore" => {
                let project_id = config.store.project_id.clone().ok_or_else(|| {
                    anyhow::anyhow!(
                        "store.project_id is required for the firestore backend. \
                         Set PROJECT_ID in the environment."
                    )
                })?;
                let db = connect_db(&project_id, &config.store.database).await?;
                (
                    Arc::new(FirestoreDocumentStore::new(db.clone())),
                    Some(Arc::new(FirestoreMemorySink::new(db))),
                )
            }
            "memory" => {
                info!("Using the in-process document store; data will not survive restarts.");
                (Arc::new(MemoryDocumentStore::new()), None)
            }
            other => {
                return Err(anyhow::anyhow!("Unsupported store backend '{other}'"));
            }
        };
    info!(store = store.name(), "Initialized document store");

    let orchestrator = Orchestrator::new(provider, store, memory)?;

    Ok(AppState {
        config: Arc::new(config),
        orchestrator: Arc::new(orchestrator),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    })
}
