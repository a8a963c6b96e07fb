//! FME Bridge Lab
//!
//! Internal verification script for bridge functionality against an
//! in-process backend.
//! Run with: cargo run --example sdk-lab

use async_trait::async_trait;
use fme_bridge::{
    Attributes, BridgeError, ErrorCode, EventEmitter, FmeClient, InitOptions, LogEvent, LogLevel,
    NativeBackend, Orchestrator, RawFlagResult, SharedBackend, Unlinked, UserContext, Variable,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PASS: &str = "\x1b[32m[PASS]\x1b[0m";
const FAIL: &str = "\x1b[31m[FAIL]\x1b[0m";

/// Rejects the first `failures` initializations, then serves a fixed flag.
struct LabBackend {
    failures: u32,
    calls: AtomicU32,
    emitter: EventEmitter,
}

#[async_trait]
impl NativeBackend for LabBackend {
    async fn initialize(&self, options: &InitOptions) -> fme_bridge::Result<String> {
        options.validate()?;
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.emitter.emit_log(&LogEvent::new(
            LogLevel::Info,
            format!("initialize call {}", call + 1),
        ));
        if call < self.failures {
            return Err(BridgeError::init_failed("settings not reachable"));
        }
        Ok("SDK initialized".to_string())
    }

    async fn get_flag(&self, feature_key: &str, _context: &UserContext) -> fme_bridge::Result<RawFlagResult> {
        if feature_key != "lab-flag" {
            return Ok(RawFlagResult::disabled());
        }
        let mut properties = Attributes::new();
        properties.insert("featureKey".to_string(), json!(feature_key));
        self.emitter.emit_integration(&properties);

        Ok(RawFlagResult::new(
            true,
            vec![
                Variable::new("lab-string", "Hello Lab"),
                Variable::new("lab-number", 42),
                Variable::new("lab-null", Value::Null),
            ],
        ))
    }

    fn track_event(
        &self,
        _event_name: &str,
        _context: &UserContext,
        _properties: Option<&Attributes>,
    ) -> fme_bridge::Result<()> {
        Err(BridgeError::new(ErrorCode::TrackEventFailed, "tracking disabled in lab"))
    }

    async fn set_attribute(&self, _attributes: &Attributes, _context: &UserContext) -> fme_bridge::Result<Value> {
        Ok(json!({ "success": true }))
    }

    fn set_session_data(&self, _data: &Attributes) {}
}

#[tokio::main]
async fn main() {
    println!("=== FME Bridge Lab ===\n");

    let mut passed = 0;
    let mut failed = 0;

    macro_rules! check {
        ($cond:expr, $test:expr) => {{
            if $cond {
                println!("{} {}", PASS, $test);
                passed += 1;
            } else {
                println!("{} {}", FAIL, $test);
                failed += 1;
            }
        }};
    }

    let emitter = EventEmitter::new();
    let log_lines = Arc::new(AtomicU32::new(0));
    let integrations = Arc::new(AtomicU32::new(0));
    let counter = log_lines.clone();
    let _log = emitter.on_log(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = integrations.clone();
    let _integration = emitter.on_integration(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    println!("Testing initialization with one retry...");
    let backend: SharedBackend = Arc::new(LabBackend {
        failures: 1,
        calls: AtomicU32::new(0),
        emitter: emitter.clone(),
    });
    let options = InitOptions::builder("0123456789abcdef0123456789abcdef", 123456)
        .max_retries(1)
        .retry_delay(Duration::from_millis(100))
        .init_timeout(Duration::from_secs(2))
        .build();
    let instance = Orchestrator::new(backend)
        .with_emitter(emitter.clone())
        .init(options)
        .await;
    check!(instance.is_live() && instance.attempts() == 2, "Initialization after retry");
    check!(log_lines.load(Ordering::SeqCst) == 2, "Log callback");

    println!("\nTesting flag evaluation...");
    let context = UserContext::with_id("lab-user");
    match instance.get_flag("lab-flag", &context).await {
        Ok(flag) => {
            check!(flag.is_enabled_bool(), "Flag enabled");
            check!(flag.get_string("lab-string", "") == "Hello Lab", "String variable");
            check!(flag.get_int("lab-number", 0) == 42, "Number variable");
            check!(flag.get_variable("lab-null", "default") == Value::Null, "Explicit null");
            check!(flag.get_variable("lab-missing", "default") == json!("default"), "Default value");
            check!(flag.get_variables().len() == 3, "Variable list");
        }
        Err(e) => check!(false, format!("Flag evaluation - {}", e)),
    }
    check!(integrations.load(Ordering::SeqCst) == 1, "Integration callback");

    println!("\nTesting facade...");
    instance.track_event("lab-event", &context, None);
    check!(true, "Track failure contained");
    let mut attributes = Attributes::new();
    attributes.insert("plan".to_string(), json!("lab"));
    instance.set_attribute(&attributes, &context).await;
    check!(true, "Set attribute");
    instance.cleanup();
    instance.cleanup();
    check!(true, "Cleanup twice");

    println!("\nTesting fallback...");
    let options = InitOptions::builder("key", 1)
        .max_retries(0)
        .build();
    let fallback = Orchestrator::new(Unlinked)
        .with_emitter(emitter.clone())
        .init(options)
        .await;
    check!(fallback.is_fallback(), "Unlinked backend falls back");
    match fallback.get_flag("lab-flag", &context).await {
        Ok(flag) => check!(!flag.is_enabled_bool() && flag.get_variables().is_empty(), "Fallback flag disabled"),
        Err(e) => check!(false, format!("Fallback flag - {}", e)),
    }

    print_summary(passed, failed);
    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_summary(passed: i32, failed: i32) {
    println!("\n{}", "=".repeat(40));
    println!("Results: {} passed, {} failed", passed, failed);
    println!("{}", "=".repeat(40));

    if failed == 0 {
        println!("\n\x1b[32mAll verifications passed!\x1b[0m");
    } else {
        println!("\n\x1b[31mSome verifications failed.\x1b[0m");
    }
}
