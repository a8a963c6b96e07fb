use async_trait::async_trait;

use crate::backend::SharedBackend;
use crate::core::{EventEmitter, Subscription};
use crate::error::{BridgeError, ErrorCode, ErrorSanitizationConfig, Result};
use crate::flag::FlagResult;
use crate::types::{check_depth, Attributes, LogEvent, LogLevel, UserContext, MAX_PAYLOAD_DEPTH};

/// Operations shared by live and fallback instances.
#[async_trait]
pub trait FmeClient: Send + Sync {
    /// Resolves a flag. The only operation that reports backend failures.
    async fn get_flag(&self, feature_key: &str, context: &UserContext) -> Result<FlagResult>;

    /// Fire-and-forget; failures are logged and swallowed.
    fn track_event(&self, event_name: &str, context: &UserContext, properties: Option<&Attributes>);

    /// Failures are logged and swallowed.
    async fn set_attribute(&self, attributes: &Attributes, context: &UserContext);

    fn set_session_data(&self, data: &Attributes);

    /// Releases the instance's own log subscription. Safe to call repeatedly.
    fn cleanup(&self);

    fn is_fallback(&self) -> bool;
}

/// Instance bound to an initialized native backend.
pub struct LiveInstance {
    backend: SharedBackend,
    emitter: EventEmitter,
    log_subscription: Subscription,
    sanitization: ErrorSanitizationConfig,
    init_message: String,
    attempts: u32,
}

impl LiveInstance {
    pub(crate) fn new(
        backend: SharedBackend,
        emitter: EventEmitter,
        log_prefix: Option<String>,
        sanitization: ErrorSanitizationConfig,
        init_message: String,
        attempts: u32,
    ) -> Self {
        let log_subscription =
            emitter.on_log(move |event| forward_log(log_prefix.as_deref(), event));

        Self {
            backend,
            emitter,
            log_subscription,
            sanitization,
            init_message,
            attempts,
        }
    }

    /// Status message the backend resolved initialization with.
    pub fn init_message(&self) -> &str {
        &self.init_message
    }

    /// Number of initialization attempts it took, starting at 1.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    fn report(&self, action: &str, error: &BridgeError) {
        tracing::error!("Failed to {}: {}", action, error.sanitized_message(&self.sanitization));
    }
}

#[async_trait]
impl FmeClient for LiveInstance {
    async fn get_flag(&self, feature_key: &str, context: &UserContext) -> Result<FlagResult> {
        match self.backend.get_flag(feature_key, context).await {
            Ok(raw) => Ok(FlagResult::wrap(raw)),
            Err(e) => {
                self.report("get feature flag", &e);
                Err(e)
            }
        }
    }

    fn track_event(&self, event_name: &str, context: &UserContext, properties: Option<&Attributes>) {
        let result = properties
            .map_or(Ok(()), |props| check_depth(props, MAX_PAYLOAD_DEPTH))
            .and_then(|_| self.backend.track_event(event_name, context, properties));

        if let Err(e) = result {
            self.report("track event", &e);
        }
    }

    async fn set_attribute(&self, attributes: &Attributes, context: &UserContext) {
        let result = match check_depth(attributes, MAX_PAYLOAD_DEPTH) {
            Ok(()) => self.backend.set_attribute(attributes, context).await.map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.report("set attribute", &e);
        }
    }

    fn set_session_data(&self, data: &Attributes) {
        if let Err(e) = check_depth(data, MAX_PAYLOAD_DEPTH) {
            tracing::warn!("Session data dropped: {}", e);
            return;
        }
        self.backend.set_session_data(data);
    }

    fn cleanup(&self) {
        if self.log_subscription.remove() {
            tracing::debug!("Log subscription released");
        }
    }

    fn is_fallback(&self) -> bool {
        false
    }
}

impl Drop for LiveInstance {
    fn drop(&mut self) {
        self.log_subscription.remove();
    }
}

/// No-op stand-in returned when the backend could not be initialized.
///
/// Every flag resolves disabled with no variables.
pub struct FallbackInstance {
    emitter: EventEmitter,
    cause: ErrorCode,
    attempts: u32,
}

impl FallbackInstance {
    pub(crate) fn new(emitter: EventEmitter, cause: ErrorCode, attempts: u32) -> Self {
        Self {
            emitter,
            cause,
            attempts,
        }
    }

    /// Code of the failure that ended initialization.
    pub fn cause(&self) -> ErrorCode {
        self.cause
    }

    /// Number of initialization attempts made before falling back.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}

#[async_trait]
impl FmeClient for FallbackInstance {
    async fn get_flag(&self, feature_key: &str, _context: &UserContext) -> Result<FlagResult> {
        tracing::debug!("Fallback instance resolving {} as disabled", feature_key);
        Ok(FlagResult::disabled())
    }

    fn track_event(&self, _event_name: &str, _context: &UserContext, _properties: Option<&Attributes>) {}

    async fn set_attribute(&self, _attributes: &Attributes, _context: &UserContext) {}

    fn set_session_data(&self, _data: &Attributes) {}

    fn cleanup(&self) {}

    fn is_fallback(&self) -> bool {
        true
    }
}

/// Result of initialization: a live instance or a fallback.
pub enum Instance {
    Live(LiveInstance),
    Fallback(FallbackInstance),
}

impl Instance {
    pub fn is_live(&self) -> bool {
        matches!(self, Instance::Live(_))
    }

    pub fn as_live(&self) -> Option<&LiveInstance> {
        match self {
            Instance::Live(live) => Some(live),
            Instance::Fallback(_) => None,
        }
    }

    pub fn as_fallback(&self) -> Option<&FallbackInstance> {
        match self {
            Instance::Live(_) => None,
            Instance::Fallback(fallback) => Some(fallback),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Instance::Live(live) => live.attempts(),
            Instance::Fallback(fallback) => fallback.attempts(),
        }
    }

    /// Registers a callback for integration events.
    pub fn register_integration_callback<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Attributes) + Send + Sync + 'static,
    {
        self.emitter().on_integration(callback)
    }

    /// Registers a callback for backend log events.
    pub fn register_log_callback<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.emitter().on_log(callback)
    }

    fn emitter(&self) -> &EventEmitter {
        match self {
            Instance::Live(live) => live.emitter(),
            Instance::Fallback(fallback) => fallback.emitter(),
        }
    }

    fn client(&self) -> &dyn FmeClient {
        match self {
            Instance::Live(live) => live,
            Instance::Fallback(fallback) => fallback,
        }
    }
}

#[async_trait]
impl FmeClient for Instance {
    async fn get_flag(&self, feature_key: &str, context: &UserContext) -> Result<FlagResult> {
        self.client().get_flag(feature_key, context).await
    }

    fn track_event(&self, event_name: &str, context: &UserContext, properties: Option<&Attributes>) {
        self.client().track_event(event_name, context, properties)
    }

    async fn set_attribute(&self, attributes: &Attributes, context: &UserContext) {
        self.client().set_attribute(attributes, context).await
    }

    fn set_session_data(&self, data: &Attributes) {
        self.client().set_session_data(data)
    }

    fn cleanup(&self) {
        self.client().cleanup()
    }

    fn is_fallback(&self) -> bool {
        self.client().is_fallback()
    }
}

fn forward_log(prefix: Option<&str>, event: &LogEvent) {
    let prefix = prefix.unwrap_or_default();
    match event.level {
        LogLevel::Trace => tracing::trace!(target: "fme_bridge::native", "{}{}", prefix, event.message),
        LogLevel::Debug => tracing::debug!(target: "fme_bridge::native", "{}{}", prefix, event.message),
        LogLevel::Info => tracing::info!(target: "fme_bridge::native", "{}{}", prefix, event.message),
        LogLevel::Warn => tracing::warn!(target: "fme_bridge::native", "{}{}", prefix, event.message),
        LogLevel::Error => tracing::error!(target: "fme_bridge::native", "{}{}", prefix, event.message),
    }
}
