//! Pending Admin Ledger integration tests
//!
//! Exercises invitation issuance: target validation, authorization,
//! lookup-or-create with uuid rotation, token claims, and the best-effort
//! invitee notification.

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use campushub::domain::GroupRef;
use campushub::store::PendingAdminStore;
use campushub::{tokens, ActingIdentity, AdminInviteRequest, EngineError, InviteTarget};

use common::{channel, invite_config, sub_channel, user, Harness};

fn identity_for(id: i64, username: &str) -> ActingIdentity {
    ActingIdentity::new(id, format!("{username}@example.com"))
}

fn channel_request(acting_user_id: i64, email: &str, channel_id: i64) -> AdminInviteRequest {
    AdminInviteRequest {
        acting_user_id,
        email: email.to_string(),
        channel_id: Some(channel_id),
        sub_channel_id: None,
    }
}

#[tokio::test]
async fn test_both_targets_set_is_invalid_and_writes_nothing() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    h.store.insert_sub_channel(sub_channel(20, 10, "Robotics"));

    let request = AdminInviteRequest {
        acting_user_id: 1,
        email: "invitee@example.com".to_string(),
        channel_id: Some(10),
        sub_channel_id: Some(20),
    };
    let result = h.invites.request_admin(&identity_for(1, "ada"), request).await;

    assert_matches!(result, Err(EngineError::InvalidTarget { .. }));
    assert_eq!(h.store.pending_admin_count(), 0);
}

#[tokio::test]
async fn test_no_target_set_is_invalid() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));

    let request = AdminInviteRequest {
        acting_user_id: 1,
        email: "invitee@example.com".to_string(),
        channel_id: None,
        sub_channel_id: None,
    };
    let result = h.invites.request_admin(&identity_for(1, "ada"), request).await;

    assert_matches!(result, Err(EngineError::InvalidTarget { .. }));
    assert_eq!(h.store.pending_admin_count(), 0);
}

#[tokio::test]
async fn test_empty_email_is_rejected_before_any_write() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));

    let result = h
        .invites
        .request_admin(&identity_for(1, "ada"), channel_request(1, "  ", 10))
        .await;

    assert_matches!(result, Err(EngineError::Validation { .. }));
    assert_eq!(h.store.pending_admin_count(), 0);
}

#[tokio::test]
async fn test_request_admin_records_entry_and_issues_token() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));

    let invite = h
        .invites
        .request_admin(
            &identity_for(1, "ada"),
            channel_request(1, "invitee@example.com", 10),
        )
        .await
        .unwrap();

    assert_eq!(invite.target, InviteTarget::Channel);
    assert_eq!(invite.target.to_string(), "Channel");

    let pending = h
        .store
        .find_pending_for_target(GroupRef::Channel(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.email, "invitee@example.com");

    let claims = tokens::verify(&invite.token, &invite_config()).unwrap();
    assert_eq!(claims.sub, pending.uuid.to_string());
    assert_eq!(claims.target, "Channel");
    assert_eq!(claims.target_id, 10);
    assert_eq!(claims.exp - claims.iat, 72 * 60 * 60);
}

#[tokio::test]
async fn test_reinvite_same_email_keeps_uuid() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    let identity = identity_for(1, "ada");

    h.invites
        .request_admin(&identity, channel_request(1, "invitee@example.com", 10))
        .await
        .unwrap();
    let first = h
        .store
        .find_pending_for_target(GroupRef::Channel(10))
        .await
        .unwrap()
        .unwrap();

    h.invites
        .request_admin(&identity, channel_request(1, "invitee@example.com", 10))
        .await
        .unwrap();
    let second = h
        .store
        .find_pending_for_target(GroupRef::Channel(10))
        .await
        .unwrap()
        .unwrap();

    // refreshed in place: same row, same link
    assert_eq!(h.store.pending_admin_count(), 1);
    assert_eq!(first.id, second.id);
    assert_eq!(first.uuid, second.uuid);
}

#[tokio::test]
async fn test_reinvite_different_email_rotates_uuid() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));
    let identity = identity_for(1, "ada");

    h.invites
        .request_admin(&identity, channel_request(1, "first@example.com", 10))
        .await
        .unwrap();
    let first = h
        .store
        .find_pending_for_target(GroupRef::Channel(10))
        .await
        .unwrap()
        .unwrap();

    h.invites
        .request_admin(&identity, channel_request(1, "second@example.com", 10))
        .await
        .unwrap();
    let second = h
        .store
        .find_pending_for_target(GroupRef::Channel(10))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(h.store.pending_admin_count(), 1);
    assert_eq!(first.id, second.id);
    assert_eq!(second.email, "second@example.com");
    // the old link must not grant the new invitee's promotion
    assert_ne!(first.uuid, second.uuid);
}

#[tokio::test]
async fn test_acting_for_other_user_requires_super_admin() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_user(user(2, "grace"));
    h.store.insert_channel(channel(10, "Engineering", 0));

    // grace is neither the super admin nor inviting on their own account
    let result = h
        .invites
        .request_admin(
            &identity_for(2, "grace"),
            channel_request(1, "invitee@example.com", 10),
        )
        .await;

    assert_matches!(result, Err(EngineError::Unauthorized));
    assert_eq!(h.store.pending_admin_count(), 0);
}

#[tokio::test]
async fn test_super_admin_may_invite_on_behalf_of_channel() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_user(user(2, "grace"));
    let mut engineering = channel(10, "Engineering", 0);
    engineering.super_admin_id = Some(2);
    h.store.insert_channel(engineering);

    let invite = h
        .invites
        .request_admin(
            &identity_for(2, "grace"),
            channel_request(1, "invitee@example.com", 10),
        )
        .await
        .unwrap();

    assert_eq!(invite.target, InviteTarget::Channel);
    assert_eq!(h.store.pending_admin_count(), 1);
}

#[tokio::test]
async fn test_sub_channel_invite_authorizes_against_parent() {
    let h = Harness::new();
    h.store.insert_user(user(2, "grace"));
    let mut engineering = channel(10, "Engineering", 0);
    engineering.super_admin_id = Some(2);
    h.store.insert_channel(engineering);
    h.store.insert_sub_channel(sub_channel(20, 10, "Robotics"));

    let request = AdminInviteRequest {
        acting_user_id: 2,
        email: "invitee@example.com".to_string(),
        channel_id: None,
        sub_channel_id: Some(20),
    };
    let invite = h
        .invites
        .request_admin(&identity_for(2, "grace"), request)
        .await
        .unwrap();

    assert_eq!(invite.target, InviteTarget::Subchannel);
    assert_eq!(invite.target.to_string(), "Subchannel");

    let pending = h
        .store
        .find_pending_for_target(GroupRef::SubChannel(20))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.sub_channel_id, Some(20));
    assert_eq!(pending.channel_id, None);
}

#[tokio::test]
async fn test_registered_invitee_gets_best_effort_push() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_user(user(3, "lin"));
    h.store.insert_channel(channel(10, "Engineering", 0));

    h.invites
        .request_admin(
            &identity_for(1, "ada"),
            channel_request(1, "lin@example.com", 10),
        )
        .await
        .unwrap();

    let titles = h.bridge.sent_titles();
    assert_eq!(titles, vec!["ada has invited you to manage Engineering".to_string()]);
}

#[tokio::test]
async fn test_unregistered_invitee_gets_no_push() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));
    h.store.insert_channel(channel(10, "Engineering", 0));

    h.invites
        .request_admin(
            &identity_for(1, "ada"),
            channel_request(1, "stranger@example.com", 10),
        )
        .await
        .unwrap();

    assert!(h.bridge.sent_titles().is_empty());
}

#[tokio::test]
async fn test_unknown_channel_is_not_found() {
    let h = Harness::new();
    h.store.insert_user(user(1, "ada"));

    let result = h
        .invites
        .request_admin(
            &identity_for(1, "ada"),
            channel_request(1, "invitee@example.com", 99),
        )
        .await;

    assert_matches!(result, Err(EngineError::NotFound { entity: "channel", .. }));
}
