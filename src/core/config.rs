use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::core::retry::RetryPolicy;
use crate::error::{BridgeError, ErrorCode, Result};
use crate::types::{Attributes, LogLevel};

pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_millis(15000);

/// Key under which the host runtime version is added to `vwo_meta`.
pub const RUNTIME_VERSION_META_KEY: &str = "lv";

/// Options for a single initialization call.
///
/// Serializes to the camelCase field names native backends read, with the
/// retry knobs expressed in milliseconds (`retryDelayMs`, `initTimeoutMs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOptions {
    pub sdk_key: String,
    pub account_id: u64,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_prefix: Option<String>,
    #[serde(default)]
    pub integrations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_service: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_settings_expiry_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_min_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_upload_time_interval: Option<u64>,
    #[serde(default)]
    pub is_usage_stats_disabled: bool,
    #[serde(default)]
    pub vwo_meta: Attributes,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(rename = "retryDelayMs", with = "duration_ms", default = "default_retry_delay")]
    pub retry_delay: Duration,
    #[serde(rename = "initTimeoutMs", with = "duration_ms", default = "default_init_timeout")]
    pub init_timeout: Duration,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_init_timeout() -> Duration {
    DEFAULT_INIT_TIMEOUT
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl InitOptions {
    pub fn new(sdk_key: impl Into<String>, account_id: u64) -> Self {
        Self {
            sdk_key: sdk_key.into(),
            account_id,
            log_level: LogLevel::default(),
            log_prefix: None,
            integrations: false,
            gateway_service: None,
            cached_settings_expiry_time: None,
            poll_interval: None,
            batch_min_size: None,
            batch_upload_time_interval: None,
            is_usage_stats_disabled: false,
            vwo_meta: Attributes::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            init_timeout: DEFAULT_INIT_TIMEOUT,
        }
    }

    pub fn builder(sdk_key: impl Into<String>, account_id: u64) -> InitOptionsBuilder {
        InitOptionsBuilder::new(sdk_key, account_id)
    }

    /// Checks the fields every native backend requires.
    ///
    /// Backends reject incomplete options with these same codes. The
    /// orchestrator only warns; attempts proceed either way.
    pub fn validate(&self) -> Result<()> {
        if self.sdk_key.trim().is_empty() {
            return Err(BridgeError::new(ErrorCode::MissingSdkKey, "SDK Key is missing"));
        }

        if self.account_id == 0 {
            return Err(BridgeError::new(ErrorCode::MissingAccountId, "Account ID is missing"));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
            init_timeout: self.init_timeout,
        }
    }

    /// Copy of these options with `vwo_meta` extended by the host runtime
    /// version. Existing metadata keys are kept; an existing `lv` is replaced.
    pub fn augmented(&self, runtime_version: Option<&str>) -> InitOptions {
        let mut options = self.clone();
        if let Some(version) = runtime_version {
            options.vwo_meta.insert(
                RUNTIME_VERSION_META_KEY.to_string(),
                Value::String(version.to_string()),
            );
        }
        options
    }
}

pub struct InitOptionsBuilder {
    options: InitOptions,
}

impl InitOptionsBuilder {
    pub fn new(sdk_key: impl Into<String>, account_id: u64) -> Self {
        Self {
            options: InitOptions::new(sdk_key, account_id),
        }
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.options.log_level = level;
        self
    }

    pub fn log_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.log_prefix = Some(prefix.into());
        self
    }

    pub fn integrations(mut self, enabled: bool) -> Self {
        self.options.integrations = enabled;
        self
    }

    pub fn gateway_service(mut self, gateway: Attributes) -> Self {
        self.options.gateway_service = Some(gateway);
        self
    }

    pub fn cached_settings_expiry_time(mut self, millis: u64) -> Self {
        self.options.cached_settings_expiry_time = Some(millis);
        self
    }

    pub fn poll_interval(mut self, millis: u64) -> Self {
        self.options.poll_interval = Some(millis);
        self
    }

    pub fn batch_min_size(mut self, size: u32) -> Self {
        self.options.batch_min_size = Some(size);
        self
    }

    pub fn batch_upload_time_interval(mut self, millis: u64) -> Self {
        self.options.batch_upload_time_interval = Some(millis);
        self
    }

    pub fn usage_stats_disabled(mut self, disabled: bool) -> Self {
        self.options.is_usage_stats_disabled = disabled;
        self
    }

    pub fn vwo_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.vwo_meta.insert(key.into(), value.into());
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.options.max_retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.options.retry_delay = delay;
        self
    }

    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.options.init_timeout = timeout;
        self
    }

    pub fn build(self) -> InitOptions {
        self.options
    }
}
