//! Dispatch steps: delete, terminal action and reply run independently.

mod common;

use common::*;
use tipwarden::platform::PlatformError;
use tipwarden::services::{DispatchOutcome, EditMode, Handled, ReplyOutcome};
use tipwarden_rules::SpecStyle;

fn rule(warden: &tipwarden::Warden, actions: &str) -> String {
    warden
        .add_or_edit(
            GROUP,
            ADMIN,
            &raw(&["spam", "No spam, $code_name", "include", actions]),
            SpecStyle::Trimmed,
            EditMode::Add,
            0,
        )
        .expect("rule accepted")
}

async fn trigger(warden: &tipwarden::Warden, now: i64) -> DispatchOutcome {
    match warden.handle_message(&message(42, MEMBER, "buy spam"), now).await {
        Some(Handled::Keyword { outcome, .. }) => outcome,
        other => panic!("expected keyword dispatch, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_then_reply_without_anchor() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "delete reply");

    let outcome = trigger(&warden, 10).await;
    assert!(outcome.deleted);
    assert_eq!(outcome.reply, Some(ReplyOutcome::Sent(FIRST_ID)));

    assert_eq!(
        platform.calls(),
        vec![
            Call::Delete {
                chat: GROUP,
                messages: vec![42],
            },
            Call::Send {
                chat: GROUP,
                message: FIRST_ID,
                text: "No spam, <code>user10</code>".to_string(),
                buttons: 0,
                reply_to: None,
            },
        ]
    );
}

#[tokio::test]
async fn reply_only_anchors_to_trigger() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "reply");

    trigger(&warden, 10).await;
    assert!(matches!(
        platform.calls().as_slice(),
        [Call::Send {
            reply_to: Some(42),
            ..
        }]
    ));
}

#[tokio::test]
async fn failed_ban_does_not_stop_the_reply() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "ban reply");
    platform.fail("ban_member", PlatformError::Denied("not enough rights".into()));

    let outcome = trigger(&warden, 10).await;
    assert_eq!(outcome.terminal, None);
    assert_eq!(outcome.reply, Some(ReplyOutcome::Sent(FIRST_ID)));
    assert!(outcome.visible());
}

#[tokio::test]
async fn denied_delete_does_not_stop_the_reply() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "delete reply");
    platform.fail("delete_messages", PlatformError::Denied("message to delete not found".into()));

    let outcome = trigger(&warden, 10).await;
    assert!(!outcome.deleted);
    // The trigger may still exist, so the reply anchors to it.
    assert!(platform.calls().iter().any(|c| matches!(
        c,
        Call::Send {
            reply_to: Some(42),
            ..
        }
    )));
    assert!(outcome.visible());
}

#[tokio::test]
async fn kick_is_ban_then_unban() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "kick");

    let outcome = trigger(&warden, 10).await;
    assert_eq!(outcome.terminal, Some("kick"));
    assert_eq!(outcome.reply, None);
    assert!(!outcome.visible());
    assert_eq!(
        platform.calls(),
        vec![
            Call::Ban {
                chat: GROUP,
                user: MEMBER,
                until: None,
            },
            Call::Unban {
                chat: GROUP,
                user: MEMBER,
            },
        ]
    );
}

#[tokio::test]
async fn kick_fails_when_ban_fails() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "kick");
    platform.fail("ban_member", PlatformError::Failed("timeout".into()));

    let outcome = trigger(&warden, 10).await;
    assert_eq!(outcome.terminal, None);
    assert!(!platform
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Unban { .. })));
}

#[tokio::test]
async fn timed_actions_carry_absolute_expiry() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "ban-600");

    let outcome = trigger(&warden, 1000).await;
    assert_eq!(outcome.terminal, Some("ban"));
    assert_eq!(
        platform.calls(),
        vec![Call::Ban {
            chat: GROUP,
            user: MEMBER,
            until: Some(1600),
        }]
    );
}

#[tokio::test]
async fn restrict_is_permanent_without_span() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "delete restrict");

    let outcome = trigger(&warden, 1000).await;
    assert!(outcome.deleted);
    assert_eq!(outcome.terminal, Some("restrict"));
    assert_eq!(
        platform.calls()[1],
        Call::Restrict {
            chat: GROUP,
            user: MEMBER,
            until: None,
        }
    );
}

#[tokio::test]
async fn failed_reply_is_not_visible() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    rule(&warden, "reply");
    platform.fail("send_message", PlatformError::Failed("flood".into()));

    let outcome = trigger(&warden, 10).await;
    assert_eq!(outcome.reply, None);
    assert!(!outcome.visible());
}
