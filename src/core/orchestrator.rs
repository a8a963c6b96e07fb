//! Initialization state machine.
//!
//! ```text
//!            ┌──────────── retry ────────────┐
//!            v                               │
//!   Attempting(n) ── reject/timeout/absent ──> WaitingRetry(n)
//!        │  │
//!        │  └── no attempts left ──> Fallback
//!        └── resolved ──> Succeeded
//! ```
//!
//! `Succeeded` and `Fallback` are terminal. Initialization never returns an
//! error: the worst outcome is a [`FallbackInstance`].

use std::sync::Arc;
use tokio::time::{sleep, Instant};

use crate::backend::{BackendLink, SdkInitTime, SharedBackend};
use crate::client::{FallbackInstance, Instance, LiveInstance};
use crate::core::config::InitOptions;
use crate::core::events::EventEmitter;
use crate::core::retry::{race_deadline, RetryPolicy};
use crate::error::{BridgeError, ErrorSanitizationConfig, Result};
use crate::utils::HostRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// Running attempt `attempt` (zero-based).
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed; pausing before the next one.
    WaitingRetry { attempt: u32 },
    Succeeded,
    Fallback,
}

impl InitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InitState::Succeeded | InitState::Fallback)
    }
}

pub type TransitionCallback = Arc<dyn Fn(InitState) + Send + Sync>;

/// Drives backend initialization under the retry policy of the options.
pub struct Orchestrator<L> {
    link: L,
    emitter: EventEmitter,
    runtime: HostRuntime,
    sanitization: ErrorSanitizationConfig,
    on_transition: Option<TransitionCallback>,
}

impl<L: BackendLink> Orchestrator<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            emitter: EventEmitter::global(),
            runtime: HostRuntime::default(),
            sanitization: ErrorSanitizationConfig::default(),
            on_transition: None,
        }
    }

    /// Use a dedicated emitter instead of the process-wide one.
    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_runtime(mut self, runtime: HostRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_sanitization(mut self, config: ErrorSanitizationConfig) -> Self {
        self.sanitization = config;
        self
    }

    /// Observe every state the machine enters.
    pub fn on_transition<F>(mut self, callback: F) -> Self
    where
        F: Fn(InitState) + Send + Sync + 'static,
    {
        self.on_transition = Some(Arc::new(callback));
        self
    }

    pub async fn init(&self, options: InitOptions) -> Instance {
        let policy = options.retry_policy();
        let runtime_version = self.runtime.meta_version();
        if runtime_version.is_none() {
            tracing::warn!(
                "Host runtime version {:?} is not a semantic version, not reporting it",
                self.runtime.raw()
            );
        }
        let augmented = options.augmented(runtime_version.as_deref());

        // The backend has the final say on incomplete options.
        if let Err(e) = options.validate() {
            tracing::warn!("{}", e.sanitized_message(&self.sanitization));
        }

        let mut attempt = 0;
        loop {
            self.enter(InitState::Attempting { attempt });
            let error = match self.attempt(&augmented, &policy, attempt).await {
                Ok(live) => {
                    self.enter(InitState::Succeeded);
                    tracing::info!(
                        "Initialized after {} of {} attempts",
                        attempt + 1,
                        policy.total_attempts()
                    );
                    return Instance::Live(LiveInstance::new(
                        live.backend,
                        self.emitter.clone(),
                        options.log_prefix.clone(),
                        self.sanitization.clone(),
                        live.message,
                        attempt + 1,
                    ));
                }
                Err(e) => e,
            };

            tracing::warn!(
                "Initialization attempt {} of {} failed: {}",
                attempt + 1,
                policy.total_attempts(),
                error.sanitized_message(&self.sanitization)
            );

            if !policy.has_attempts_remaining(attempt) {
                self.enter(InitState::Fallback);
                tracing::error!(
                    "Failed to initialize, continuing with a fallback instance: {}",
                    error.sanitized_message(&self.sanitization)
                );
                return Instance::Fallback(FallbackInstance::new(
                    self.emitter.clone(),
                    error.code,
                    attempt + 1,
                ));
            }

            self.enter(InitState::WaitingRetry { attempt });
            sleep(policy.retry_delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        options: &InitOptions,
        policy: &RetryPolicy,
        attempt: u32,
    ) -> Result<InitializedBackend> {
        let backend = self.link.resolve().ok_or_else(BridgeError::linking)?;

        let started_at = chrono::Utc::now();
        let started = Instant::now();
        let message = race_deadline(backend.initialize(options), policy.init_timeout).await?;

        backend.send_sdk_init_time(SdkInitTime {
            started_at,
            duration: started.elapsed(),
            attempt: attempt + 1,
        });

        Ok(InitializedBackend { backend, message })
    }

    fn enter(&self, state: InitState) {
        tracing::debug!("Initialization state: {:?}", state);
        if let Some(callback) = &self.on_transition {
            callback(state);
        }
    }
}

struct InitializedBackend {
    backend: SharedBackend,
    message: String,
}
