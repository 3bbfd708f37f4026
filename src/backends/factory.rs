// factory.rs - Picks and builds the summarizer backend from configuration

use std::sync::{Arc, Mutex, MutexGuard};
use log::{info, warn};
use thiserror::Error;

use crate::backends::{AnthropicBackend, BackendConfig, BackendKind, OpenAiCompatibleBackend, SummarizerBackend};
use crate::config::Env;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{var} environment variable is required for {provider} backend.")]
    MissingCredential { provider: BackendKind, var: &'static str },
    #[error("Failed to set up HTTP client for {provider}: {source}")]
    Client {
        provider: BackendKind,
        #[source]
        source: reqwest::Error,
    },
}

/// Explicit `AI_BACKEND` wins; otherwise the first provider with a key,
/// falling back to OpenAI.
pub fn detect_backend(env: &Env) -> BackendKind {
    if let Some(explicit) = env.get("AI_BACKEND") {
        match explicit.parse::<BackendKind>() {
            Ok(kind) => return kind,
            Err(e) => warn!("⚠️ Ignoring AI_BACKEND: {}", e),
        }
    }

    BackendKind::DETECTION_ORDER
        .into_iter()
        .find(|kind| env.has(kind.api_key_var()))
        .unwrap_or(BackendKind::OpenAi)
}

pub fn backend_config(kind: BackendKind, env: &Env) -> Result<BackendConfig, BackendError> {
    let api_key = env.get(kind.api_key_var()).ok_or(BackendError::MissingCredential {
        provider: kind,
        var: kind.api_key_var(),
    })?;

    let model = env
        .get(kind.model_var())
        .unwrap_or_else(|| kind.default_model().to_string());

    let base_url = match kind {
        BackendKind::OpenAi => env.get("OPENAI_BASE_URL"),
        _ => None,
    }
    .unwrap_or_else(|| kind.default_base_url().to_string());

    Ok(BackendConfig { api_key, model, base_url })
}

pub fn create_backend(kind: BackendKind, env: &Env) -> Result<Arc<dyn SummarizerBackend>, BackendError> {
    let config = backend_config(kind, env)?;
    let client_error = |source| BackendError::Client { provider: kind, source };

    let backend: Arc<dyn SummarizerBackend> = match kind {
        BackendKind::OpenAi | BackendKind::Perplexity => {
            Arc::new(OpenAiCompatibleBackend::new(kind, config).map_err(client_error)?)
        }
        BackendKind::Anthropic => Arc::new(AnthropicBackend::new(config).map_err(client_error)?),
    };

    info!("🧠 Summarizer backend: {} (model {})", backend.kind(), backend.model());
    Ok(backend)
}

/// Lazily constructed, cached backend. The first successful `current()`
/// builds from the environment; `reset()` forces a rebuild on next use.
pub struct BackendRegistry {
    env: Env,
    slot: Mutex<Option<Arc<dyn SummarizerBackend>>>,
}

impl BackendRegistry {
    pub fn from_env(env: Env) -> Self {
        Self {
            env,
            slot: Mutex::new(None),
        }
    }

    /// A registry that starts out holding `backend`.
    pub fn with_backend(env: Env, backend: Arc<dyn SummarizerBackend>) -> Self {
        Self {
            env,
            slot: Mutex::new(Some(backend)),
        }
    }

    pub fn current(&self) -> Result<Arc<dyn SummarizerBackend>, BackendError> {
        let mut slot = self.lock_slot();
        if let Some(backend) = slot.as_ref() {
            return Ok(Arc::clone(backend));
        }

        let backend = create_backend(detect_backend(&self.env), &self.env)?;
        *slot = Some(Arc::clone(&backend));
        Ok(backend)
    }

    pub fn reset(&self) {
        self.lock_slot().take();
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Arc<dyn SummarizerBackend>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
