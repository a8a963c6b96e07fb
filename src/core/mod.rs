mod config;
mod events;
mod orchestrator;
pub mod retry;

pub use config::{
    InitOptions, InitOptionsBuilder, DEFAULT_INIT_TIMEOUT, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY, RUNTIME_VERSION_META_KEY,
};
pub use events::{
    Channel, EventEmitter, IntegrationCallback, LogCallback, Subscription,
    INTEGRATION_CALLBACK_EVENT, LOG_EVENT,
};
pub use orchestrator::{InitState, Orchestrator, TransitionCallback};
pub use retry::{race_deadline, RetryPolicy};
