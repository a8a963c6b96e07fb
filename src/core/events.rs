//! Event hub between native backends and host callbacks.
//!
//! Backends publish two streams: `LogEvent` records and
//! `IntegrationCallbackEvent` property maps. Host code subscribes with a
//! callback and receives a [`Subscription`] that removes it again.
//!
//! A process-wide emitter is available through [`EventEmitter::global`];
//! independent emitters can be created for isolated setups and tests.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::error::{BridgeError, ErrorCode, Result};
use crate::types::{Attributes, LogEvent};

/// Name of the backend log stream.
pub const LOG_EVENT: &str = "LogEvent";

/// Name of the integration callback stream.
pub const INTEGRATION_CALLBACK_EVENT: &str = "IntegrationCallbackEvent";

pub type LogCallback = Arc<dyn Fn(&LogEvent) + Send + Sync>;
pub type IntegrationCallback = Arc<dyn Fn(&Attributes) + Send + Sync>;

static GLOBAL: Lazy<EventEmitter> = Lazy::new(EventEmitter::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Log,
    Integration,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Log => LOG_EVENT,
            Channel::Integration => INTEGRATION_CALLBACK_EVENT,
        }
    }
}

struct ListenerList<T: ?Sized> {
    entries: RwLock<Vec<(u64, Arc<T>)>>,
}

impl<T: ?Sized> ListenerList<T> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn add(&self, id: u64, listener: Arc<T>) {
        self.entries.write().push((id, listener));
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    // Delivery runs on a snapshot so callbacks may (un)subscribe freely.
    fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.read().iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

struct EmitterInner {
    next_id: AtomicU64,
    log: ListenerList<dyn Fn(&LogEvent) + Send + Sync>,
    integration: ListenerList<dyn Fn(&Attributes) + Send + Sync>,
}

impl EmitterInner {
    fn remove(&self, channel: Channel, id: u64) -> bool {
        match channel {
            Channel::Log => self.log.remove(id),
            Channel::Integration => self.integration.remove(id),
        }
    }
}

/// Fan-out of backend events to registered callbacks.
#[derive(Clone)]
pub struct EventEmitter {
    inner: Arc<EmitterInner>,
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EmitterInner {
                next_id: AtomicU64::new(1),
                log: ListenerList::new(),
                integration: ListenerList::new(),
            }),
        }
    }

    /// The process-wide emitter.
    pub fn global() -> EventEmitter {
        GLOBAL.clone()
    }

    pub fn on_log<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.inner.log.add(id, Arc::new(callback));
        self.subscription(Channel::Log, id)
    }

    pub fn on_integration<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Attributes) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.inner.integration.add(id, Arc::new(callback));
        self.subscription(Channel::Integration, id)
    }

    pub fn emit_log(&self, event: &LogEvent) {
        for listener in self.inner.log.snapshot() {
            listener(event);
        }
    }

    pub fn emit_integration(&self, properties: &Attributes) {
        for listener in self.inner.integration.snapshot() {
            listener(properties);
        }
    }

    /// Publish an event by its bridge name with an untyped body.
    ///
    /// `LogEvent` bodies must have a `message` and a `type`; integration
    /// bodies must be objects.
    pub fn emit(&self, name: &str, body: Value) -> Result<()> {
        match name {
            LOG_EVENT => {
                let event: LogEvent = serde_json::from_value(body).map_err(|e| {
                    BridgeError::with_source(ErrorCode::InvalidPayload, "Malformed log event", e)
                })?;
                self.emit_log(&event);
                Ok(())
            }
            INTEGRATION_CALLBACK_EVENT => match body {
                Value::Object(properties) => {
                    self.emit_integration(&properties);
                    Ok(())
                }
                _ => Err(BridgeError::new(
                    ErrorCode::InvalidPayload,
                    "Integration callback event body must be an object",
                )),
            },
            other => Err(BridgeError::new(
                ErrorCode::InvalidPayload,
                format!("Unsupported event: {}", other),
            )),
        }
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        match channel {
            Channel::Log => self.inner.log.len(),
            Channel::Integration => self.inner.integration.len(),
        }
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn subscription(&self, channel: Channel, id: u64) -> Subscription {
        Subscription {
            id,
            channel,
            emitter: Arc::downgrade(&self.inner),
            removed: AtomicBool::new(false),
        }
    }
}

/// Handle to a registered callback.
///
/// Dropping the handle keeps the callback registered; call
/// [`Subscription::remove`] to unsubscribe.
pub struct Subscription {
    id: u64,
    channel: Channel,
    emitter: Weak<EmitterInner>,
    removed: AtomicBool,
}

impl Subscription {
    /// Unsubscribes the callback. Returns `true` only for the call that
    /// actually removed it.
    pub fn remove(&self) -> bool {
        if self.removed.swap(true, Ordering::AcqRel) {
            return false;
        }
        match self.emitter.upgrade() {
            Some(inner) => inner.remove(self.channel, self.id),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.removed.load(Ordering::Acquire) && self.emitter.strong_count() > 0
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel.as_str())
            .field("active", &self.is_active())
            .finish()
    }
}
