mod common;

use common::{attrs, nested, options, MockBackend};
use fme_bridge::types::MAX_PAYLOAD_DEPTH;
use fme_bridge::{
    Channel, ErrorCode, EventEmitter, FmeClient, Instance, Orchestrator, RawFlagResult,
    UserContext, Variable,
};
use serde_json::json;
use std::sync::Arc;

async fn live(mock: MockBackend) -> (Arc<MockBackend>, Instance, EventEmitter) {
    let (mock, backend) = mock.shared();
    let emitter = EventEmitter::new();
    let instance = Orchestrator::new(backend)
        .with_emitter(emitter.clone())
        .init(options(0))
        .await;
    assert!(instance.is_live());
    (mock, instance, emitter)
}

#[tokio::test]
async fn test_get_flag_wraps_backend_result() {
    let raw = RawFlagResult::new(true, vec![Variable::new("title", "Hello")]);
    let (_mock, instance, _) = live(MockBackend::resolving().with_flag("banner", raw)).await;
    let context = UserContext::with_id("user-1");

    let flag = instance.get_flag("banner", &context).await.unwrap();
    assert!(flag.is_enabled_bool());
    assert_eq!(flag.get_string("title", ""), "Hello");

    let unknown = instance.get_flag("nope", &context).await.unwrap();
    assert!(!unknown.is_enabled_bool());
}

#[tokio::test]
async fn test_get_flag_propagates_backend_failure() {
    let (_mock, instance, _) = live(MockBackend::resolving().failing_operations()).await;

    let error = instance
        .get_flag("banner", &UserContext::with_id("user-1"))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::GetFlagFailed);
}

#[tokio::test]
async fn test_track_event_forwards_properties() {
    let (mock, instance, _) = live(MockBackend::resolving()).await;
    let context = UserContext::with_id("user-1");

    instance.track_event("purchase", &context, Some(&attrs(json!({"amount": 20}))));
    instance.track_event("view", &context, None);

    let tracked = mock.tracked();
    assert_eq!(tracked.len(), 2);
    assert_eq!(tracked[0].0, "purchase");
    assert_eq!(tracked[0].1, Some(attrs(json!({"amount": 20}))));
    assert_eq!(tracked[1], ("view".to_string(), None));
}

#[tokio::test]
async fn test_operation_failures_are_contained() {
    let (mock, instance, _) = live(MockBackend::resolving().failing_operations()).await;
    let context = UserContext::with_id("user-1");

    instance.track_event("purchase", &context, None);
    instance
        .set_attribute(&attrs(json!({"plan": "pro"})), &context)
        .await;

    assert!(mock.tracked().is_empty());
    assert!(mock.attributes().is_empty());
}

#[tokio::test]
async fn test_set_attribute_and_session_data() {
    let (mock, instance, _) = live(MockBackend::resolving()).await;
    let context = UserContext::with_id("user-1");

    instance
        .set_attribute(&attrs(json!({"plan": "pro", "seats": 4})), &context)
        .await;
    instance.set_session_data(&attrs(json!({"sessionId": 1700000000})));

    assert_eq!(mock.attributes(), vec![attrs(json!({"plan": "pro", "seats": 4}))]);
    assert_eq!(mock.session(), vec![attrs(json!({"sessionId": 1700000000}))]);
}

#[tokio::test]
async fn test_over_deep_payloads_never_reach_backend() {
    let (mock, instance, _) = live(MockBackend::resolving()).await;
    let context = UserContext::with_id("user-1");
    let too_deep = nested(MAX_PAYLOAD_DEPTH + 1);

    instance.track_event("deep", &context, Some(&too_deep));
    instance.set_attribute(&too_deep, &context).await;
    instance.set_session_data(&too_deep);

    assert!(mock.tracked().is_empty());
    assert!(mock.attributes().is_empty());
    assert!(mock.session().is_empty());

    instance.set_session_data(&nested(MAX_PAYLOAD_DEPTH));
    assert_eq!(mock.session().len(), 1);
}

#[tokio::test]
async fn test_cleanup_is_idempotent() {
    let (_mock, instance, emitter) = live(MockBackend::resolving()).await;
    assert_eq!(emitter.listener_count(Channel::Log), 1);

    instance.cleanup();
    assert_eq!(emitter.listener_count(Channel::Log), 0);

    instance.cleanup();
    assert_eq!(emitter.listener_count(Channel::Log), 0);
}

#[tokio::test]
async fn test_cleanup_leaves_user_callbacks_registered() {
    let (_mock, instance, emitter) = live(MockBackend::resolving()).await;
    let user = instance.register_log_callback(|_| {});

    instance.cleanup();

    assert_eq!(emitter.listener_count(Channel::Log), 1);
    assert!(user.remove());
}

#[tokio::test]
async fn test_dropping_live_instance_releases_log_subscription() {
    let (_mock, instance, emitter) = live(MockBackend::resolving()).await;

    drop(instance);

    assert_eq!(emitter.listener_count(Channel::Log), 0);
}

#[tokio::test]
async fn test_fallback_facade_is_inert() {
    let (mock, backend) = MockBackend::rejecting().shared();
    let instance = Orchestrator::new(backend)
        .with_emitter(EventEmitter::new())
        .init(options(0))
        .await;
    let context = UserContext::with_id("user-1");

    instance.track_event("purchase", &context, None);
    instance
        .set_attribute(&attrs(json!({"plan": "pro"})), &context)
        .await;
    instance.set_session_data(&attrs(json!({"sessionId": 1})));
    instance.cleanup();
    instance.cleanup();

    assert!(mock.tracked().is_empty());
    assert!(mock.attributes().is_empty());
    assert!(mock.session().is_empty());
}
