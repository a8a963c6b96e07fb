//! The native feature management backend seam.
//!
//! Flag decisions happen entirely inside the native SDK. This crate only
//! talks to it through [`NativeBackend`], and finds it through a
//! [`BackendLink`] so that a missing native module is detected at
//! initialization time instead of on first use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::core::InitOptions;
use crate::error::Result;
use crate::types::{Attributes, RawFlagResult, UserContext};

/// Timing of a successful initialization, reported back to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkInitTime {
    pub started_at: DateTime<Utc>,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// One-based number of the attempt that succeeded.
    pub attempt: u32,
}

fn serialize_millis<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

/// Operations a native backend provides.
///
/// Implementations publish log and integration events through an
/// [`EventEmitter`](crate::core::EventEmitter).
#[async_trait]
pub trait NativeBackend: Send + Sync {
    /// Starts the native SDK. Resolves with a status message.
    async fn initialize(&self, options: &InitOptions) -> Result<String>;

    async fn get_flag(&self, feature_key: &str, context: &UserContext) -> Result<RawFlagResult>;

    fn track_event(
        &self,
        event_name: &str,
        context: &UserContext,
        properties: Option<&Attributes>,
    ) -> Result<()>;

    async fn set_attribute(&self, attributes: &Attributes, context: &UserContext) -> Result<Value>;

    fn set_session_data(&self, data: &Attributes);

    /// Receives the timing of the successful initialization.
    fn send_sdk_init_time(&self, _timing: SdkInitTime) {}
}

pub type SharedBackend = Arc<dyn NativeBackend>;

/// Locates the backend; `None` means it is not linked into the host.
///
/// The link is consulted on every initialization attempt.
pub trait BackendLink: Send + Sync {
    fn resolve(&self) -> Option<SharedBackend>;
}

impl BackendLink for SharedBackend {
    fn resolve(&self) -> Option<SharedBackend> {
        Some(Arc::clone(self))
    }
}

impl BackendLink for Option<SharedBackend> {
    fn resolve(&self) -> Option<SharedBackend> {
        self.clone()
    }
}

/// A link backed by a lookup function, for backends registered at runtime.
pub struct LinkFn<F>(pub F);

impl<F> BackendLink for LinkFn<F>
where
    F: Fn() -> Option<SharedBackend> + Send + Sync,
{
    fn resolve(&self) -> Option<SharedBackend> {
        (self.0)()
    }
}

/// A link that never finds a backend.
pub struct Unlinked;

impl BackendLink for Unlinked {
    fn resolve(&self) -> Option<SharedBackend> {
        None
    }
}
