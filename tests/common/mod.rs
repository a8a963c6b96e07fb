#![allow(dead_code)]

use async_trait::async_trait;
use fme_bridge::{
    Attributes, BridgeError, ErrorCode, InitOptions, NativeBackend, RawFlagResult, Result,
    SdkInitTime, SharedBackend, UserContext,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum InitOutcome {
    Resolve,
    Reject(ErrorCode),
    Pending,
}

/// Scriptable in-memory backend.
///
/// Initialization outcomes are taken from the script in order; once it is
/// exhausted every further attempt uses the default outcome.
pub struct MockBackend {
    script: Mutex<VecDeque<InitOutcome>>,
    default_outcome: InitOutcome,
    init_calls: AtomicU32,
    seen_options: Mutex<Vec<InitOptions>>,
    init_times: Mutex<Vec<SdkInitTime>>,
    flags: Mutex<HashMap<String, RawFlagResult>>,
    fail_get_flag: bool,
    fail_track: bool,
    fail_set_attribute: bool,
    tracked: Mutex<Vec<(String, Option<Attributes>)>>,
    attributes: Mutex<Vec<Attributes>>,
    session: Mutex<Vec<Attributes>>,
}

impl MockBackend {
    pub fn new(default_outcome: InitOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_outcome,
            init_calls: AtomicU32::new(0),
            seen_options: Mutex::new(Vec::new()),
            init_times: Mutex::new(Vec::new()),
            flags: Mutex::new(HashMap::new()),
            fail_get_flag: false,
            fail_track: false,
            fail_set_attribute: false,
            tracked: Mutex::new(Vec::new()),
            attributes: Mutex::new(Vec::new()),
            session: Mutex::new(Vec::new()),
        }
    }

    pub fn resolving() -> Self {
        Self::new(InitOutcome::Resolve)
    }

    pub fn rejecting() -> Self {
        Self::new(InitOutcome::Reject(ErrorCode::InitFailed))
    }

    pub fn pending() -> Self {
        Self::new(InitOutcome::Pending)
    }

    pub fn then(self, outcome: InitOutcome) -> Self {
        self.script.lock().push_back(outcome);
        self
    }

    pub fn with_flag(self, key: &str, raw: RawFlagResult) -> Self {
        self.flags.lock().insert(key.to_string(), raw);
        self
    }

    pub fn failing_operations(mut self) -> Self {
        self.fail_get_flag = true;
        self.fail_track = true;
        self.fail_set_attribute = true;
        self
    }

    pub fn shared(self) -> (Arc<MockBackend>, SharedBackend) {
        let mock = Arc::new(self);
        let shared: SharedBackend = mock.clone();
        (mock, shared)
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn seen_options(&self) -> Vec<InitOptions> {
        self.seen_options.lock().clone()
    }

    pub fn init_times(&self) -> Vec<SdkInitTime> {
        self.init_times.lock().clone()
    }

    pub fn tracked(&self) -> Vec<(String, Option<Attributes>)> {
        self.tracked.lock().clone()
    }

    pub fn attributes(&self) -> Vec<Attributes> {
        self.attributes.lock().clone()
    }

    pub fn session(&self) -> Vec<Attributes> {
        self.session.lock().clone()
    }
}

#[async_trait]
impl NativeBackend for MockBackend {
    async fn initialize(&self, options: &InitOptions) -> Result<String> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_options.lock().push(options.clone());

        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone());

        match outcome {
            InitOutcome::Resolve => Ok("SDK initialized".to_string()),
            InitOutcome::Reject(code) => Err(BridgeError::new(code, "native initialization rejected")),
            InitOutcome::Pending => std::future::pending().await,
        }
    }

    async fn get_flag(&self, feature_key: &str, _context: &UserContext) -> Result<RawFlagResult> {
        if self.fail_get_flag {
            return Err(BridgeError::new(ErrorCode::GetFlagFailed, "flag lookup failed"));
        }
        Ok(self
            .flags
            .lock()
            .get(feature_key)
            .cloned()
            .unwrap_or_else(RawFlagResult::disabled))
    }

    fn track_event(
        &self,
        event_name: &str,
        _context: &UserContext,
        properties: Option<&Attributes>,
    ) -> Result<()> {
        if self.fail_track {
            return Err(BridgeError::new(ErrorCode::TrackEventFailed, "tracking failed"));
        }
        self.tracked
            .lock()
            .push((event_name.to_string(), properties.cloned()));
        Ok(())
    }

    async fn set_attribute(&self, attributes: &Attributes, _context: &UserContext) -> Result<Value> {
        if self.fail_set_attribute {
            return Err(BridgeError::new(ErrorCode::SetAttributeFailed, "attribute rejected"));
        }
        self.attributes.lock().push(attributes.clone());
        Ok(json!({ "success": true }))
    }

    fn set_session_data(&self, data: &Attributes) {
        self.session.lock().push(data.clone());
    }

    fn send_sdk_init_time(&self, timing: SdkInitTime) {
        self.init_times.lock().push(timing);
    }
}

pub fn options(max_retries: u32) -> InitOptions {
    InitOptions::builder("0123456789abcdef0123456789abcdef", 123456)
        .max_retries(max_retries)
        .build()
}

pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

/// Object nested `depth` levels deep.
pub fn nested(depth: usize) -> Attributes {
    let mut value = json!(1);
    for _ in 1..depth {
        value = json!({ "n": value });
    }
    attrs(json!({ "root": value }))
}
