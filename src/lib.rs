//! FME Bridge
//!
//! Host-side core of a native feature management SDK. Flag decisions are made
//! by a native backend; this crate initializes it with retries and a timeout,
//! falls back to a no-op instance when it cannot, and exposes flag results,
//! user attributes, events, and backend callbacks.
//!
//! # Quick Start
//!
//! ```no_run
//! use fme_bridge::{FmeClient, InitOptions, SharedBackend, UserContext};
//!
//! async fn run(backend: SharedBackend) -> fme_bridge::Result<()> {
//!     let options = InitOptions::builder("sdk_key", 123456)
//!         .max_retries(2)
//!         .build();
//!
//!     // Never fails: a backend that cannot start yields a fallback instance
//!     let instance = fme_bridge::init(options, backend).await;
//!
//!     let context = UserContext::with_id("user-123");
//!     let flag = instance.get_flag("new-checkout", &context).await?;
//!     if flag.is_enabled_bool() {
//!         let title = flag.get_string("title", "Checkout");
//!         println!("{}", title);
//!     }
//!
//!     instance.track_event("checkout_viewed", &context, None);
//!     instance.cleanup();
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;
mod client;
mod flag;

pub use backend::{BackendLink, LinkFn, NativeBackend, SdkInitTime, SharedBackend, Unlinked};

pub use client::{FallbackInstance, FmeClient, Instance, LiveInstance};

pub use crate::core::{
    Channel, EventEmitter, InitOptions, InitOptionsBuilder, InitState, Orchestrator, RetryPolicy,
    Subscription,
};

pub use error::{BridgeError, ErrorCode, ErrorSanitizationConfig, Result};

pub use flag::FlagResult;

pub use types::{Attributes, LogEvent, LogLevel, RawFlagResult, UserContext, Variable};

pub use utils::{parse_version, HostRuntime, ParsedVersion};

/// Version of this crate, reported as the host runtime version by default.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes the backend found through `link` with the default orchestrator.
///
/// Uses the process-wide [`EventEmitter`]. Build an [`Orchestrator`] to
/// supply a dedicated emitter or host runtime.
pub async fn init<L: BackendLink>(options: InitOptions, link: L) -> Instance {
    Orchestrator::new(link).init(options).await
}

/// Registers a callback for integration events published on the global emitter.
pub fn register_integration_callback<F>(callback: F) -> Subscription
where
    F: Fn(&Attributes) + Send + Sync + 'static,
{
    EventEmitter::global().on_integration(callback)
}

/// Registers a callback for backend log events published on the global emitter.
pub fn register_log_callback<F>(callback: F) -> Subscription
where
    F: Fn(&LogEvent) + Send + Sync + 'static,
{
    EventEmitter::global().on_log(callback)
}
