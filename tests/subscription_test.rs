//! Subscription Engine integration tests
//!
//! Runs the toggle flows against the in-memory store and the recording
//! bridge: membership/counter reconciliation, topic-state ordering, and the
//! best-effort admin notifications.

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use campushub::domain::GroupRef;
use campushub::push::BridgeCall;
use campushub::store::{ChannelStore, UserStore};
use campushub::{ActingIdentity, EngineError, ToggleAction};

use common::{channel, sub_channel, user, Harness};

fn identity_for(id: i64, username: &str) -> ActingIdentity {
    ActingIdentity::new(id, format!("{username}@example.com"))
}

#[tokio::test]
async fn test_fresh_subscribe_increments_counter_once() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 5));

    let outcome = h
        .subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(10))
        .await
        .unwrap();

    assert_eq!(outcome.action, ToggleAction::Subscribed);
    assert_eq!(outcome.message, "You have successfully subscribed to a Channel");
    assert_eq!(outcome.group.subscribers(), 6);

    let memberships = h.store.subscribed_channel_ids(1).await.unwrap();
    assert_eq!(memberships, vec![10]);

    assert_eq!(h.bridge.subscribed_topics(), vec!["channel_10".to_string()]);
}

#[tokio::test]
async fn test_toggle_twice_restores_original_state() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 5));
    let identity = identity_for(1, "ada");

    let first = h
        .subscriptions
        .toggle(&identity, 1, GroupRef::Channel(10))
        .await
        .unwrap();
    let second = h
        .subscriptions
        .toggle(&identity, 1, GroupRef::Channel(10))
        .await
        .unwrap();

    assert_eq!(first.action, ToggleAction::Subscribed);
    assert_eq!(second.action, ToggleAction::Unsubscribed);
    assert_eq!(second.group.subscribers(), 5);
    assert!(h.store.subscribed_channel_ids(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_toggles_never_duplicate_membership() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    let identity = identity_for(1, "ada");

    for _ in 0..5 {
        h.subscriptions
            .toggle(&identity, 1, GroupRef::Channel(10))
            .await
            .unwrap();
        let memberships = h.store.subscribed_channel_ids(1).await.unwrap();
        assert!(memberships.len() <= 1);
    }

    // odd number of toggles: subscribed exactly once
    assert_eq!(h.store.subscribed_channel_ids(1).await.unwrap(), vec![10]);
    let refreshed = h.store.find_channel(10).await.unwrap().unwrap();
    assert_eq!(refreshed.subscribers, 1);
}

#[tokio::test]
async fn test_toggle_for_other_user_is_unauthorized() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));

    let result = h
        .subscriptions
        .toggle(&identity_for(2, "eve"), 1, GroupRef::Channel(10))
        .await;

    assert_matches!(result, Err(EngineError::Unauthorized));
    assert_eq!(h.bridge.calls().len(), 0);
}

#[tokio::test]
async fn test_toggle_unknown_channel_is_not_found() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));

    let result = h
        .subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(99))
        .await;

    assert_matches!(result, Err(EngineError::NotFound { entity: "channel", .. }));
}

#[tokio::test]
async fn test_bridge_refusal_aborts_subscribe_without_local_mutation() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 5));
    h.bridge.refuse_subscribe();

    let result = h
        .subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(10))
        .await;

    assert_matches!(result, Err(EngineError::ExternalService { .. }));
    assert!(h.store.subscribed_channel_ids(1).await.unwrap().is_empty());
    let refreshed = h.store.find_channel(10).await.unwrap().unwrap();
    assert_eq!(refreshed.subscribers, 5);
}

#[tokio::test]
async fn test_bridge_refusal_aborts_unsubscribe_keeping_membership() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    h.store.seed_channel_subscription(1, 10);
    h.bridge.refuse_unsubscribe();

    let result = h
        .subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(10))
        .await;

    assert_matches!(result, Err(EngineError::ExternalService { .. }));
    assert_eq!(h.store.subscribed_channel_ids(1).await.unwrap(), vec![10]);
    let refreshed = h.store.find_channel(10).await.unwrap().unwrap();
    assert_eq!(refreshed.subscribers, 1);
}

#[tokio::test]
async fn test_admin_is_notified_best_effort() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_user(user(2, "grace"));
    let mut engineering = channel(10, "Engineering", 0);
    engineering.super_admin_id = Some(2);
    h.store.insert_channel(engineering);

    h.subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(10))
        .await
        .unwrap();

    assert_eq!(h.bridge.sent_titles(), vec!["Subscription Alert!".to_string()]);
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_toggle() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_user(user(2, "grace"));
    let mut engineering = channel(10, "Engineering", 0);
    engineering.super_admin_id = Some(2);
    h.store.insert_channel(engineering);
    h.bridge.refuse_send();

    let outcome = h
        .subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(10))
        .await
        .unwrap();

    assert_eq!(outcome.action, ToggleAction::Subscribed);
    assert_eq!(outcome.group.subscribers(), 1);
}

#[tokio::test]
async fn test_user_without_device_token_still_toggles() {
    let h = Harness::new();
    let mut ada = user(1, "ada");
    ada.device_token = None;
    h.store.insert_user(ada);
    h.store.insert_channel(channel(10, "Engineering", 0));

    let outcome = h
        .subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(10))
        .await
        .unwrap();

    assert_eq!(outcome.action, ToggleAction::Subscribed);
    assert_eq!(outcome.group.subscribers(), 1);
    // no topic call without a token to bind
    assert!(h.bridge.subscribed_topics().is_empty());
}

#[tokio::test]
async fn test_sub_channel_toggle_roundtrip() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    h.store.insert_sub_channel(sub_channel(20, 10, "Robotics"));
    let identity = identity_for(1, "ada");

    let first = h
        .subscriptions
        .toggle(&identity, 1, GroupRef::SubChannel(20))
        .await
        .unwrap();
    assert_eq!(first.action, ToggleAction::Subscribed);
    assert_eq!(
        first.message,
        "You have successfully subscribed to a subchannel"
    );
    assert_eq!(first.group.subscribers(), 1);

    let second = h
        .subscriptions
        .toggle(&identity, 1, GroupRef::SubChannel(20))
        .await
        .unwrap();
    assert_eq!(second.action, ToggleAction::Unsubscribed);
    assert_eq!(second.group.subscribers(), 0);
    assert!(h
        .store
        .subscribed_sub_channel_ids(1)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unsubscribe_with_desynced_zero_counter_stays_at_zero() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    h.store.seed_channel_subscription(1, 10);
    // simulate historical counter drift: membership row exists, counter zero
    h.store.insert_channel(channel(10, "Engineering", 0));

    let outcome = h
        .subscriptions
        .toggle(&identity_for(1, "ada"), 1, GroupRef::Channel(10))
        .await
        .unwrap();

    assert_eq!(outcome.action, ToggleAction::Unsubscribed);
    // floored, not driven negative
    assert_eq!(outcome.group.subscribers(), 0);
}

#[tokio::test]
async fn test_rotate_device_token_moves_topic_state() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    h.store.insert_sub_channel(sub_channel(20, 10, "Robotics"));
    h.store.seed_channel_subscription(1, 10);
    h.store.seed_sub_channel_subscription(1, 20);

    h.subscriptions
        .rotate_device_token(&identity_for(1, "ada"), 1, Some("new-device"))
        .await
        .unwrap();

    let calls = h.bridge.calls();
    assert_eq!(
        calls[0],
        BridgeCall::UnsubscribeAll {
            device_token: "ada-device".to_string()
        }
    );
    let topics = h.bridge.subscribed_topics();
    assert_eq!(topics, vec!["channel_10".to_string(), "sub_channel_20".to_string()]);

    let refreshed = h.store.find_user(1).await.unwrap().unwrap();
    assert_eq!(refreshed.device_token.as_deref(), Some("new-device"));
}

#[tokio::test]
async fn test_rotate_device_token_fatal_when_unsubscribe_all_refused() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.bridge.refuse_unsubscribe_all();

    let result = h
        .subscriptions
        .rotate_device_token(&identity_for(1, "ada"), 1, Some("new-device"))
        .await;

    assert_matches!(result, Err(EngineError::ExternalService { .. }));
    let refreshed = h.store.find_user(1).await.unwrap().unwrap();
    assert_eq!(refreshed.device_token.as_deref(), Some("ada-device"));
}
