//! Rule administration behind the edit lease.

mod common;

use common::*;
use std::sync::Arc;
use tipwarden::error::{CommandError, LockError};
use tipwarden::services::EditMode;
use tipwarden::store::MemoryStore;
use tipwarden_rules::{SpecStyle, ValidationError};

fn add_as(
    warden: &tipwarden::Warden,
    admin: tipwarden::platform::UserId,
    parts: &[&str],
    now: i64,
) -> Result<String, CommandError> {
    warden.add_or_edit(GROUP, admin, &raw(parts), SpecStyle::Trimmed, EditMode::Add, now)
}

#[tokio::test]
async fn lease_keeps_second_admin_out_until_it_lapses() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);

    add_as(&warden, ADMIN, &["a", "first"], 1000).unwrap();

    let err = add_as(&warden, OTHER_ADMIN, &["b", "second"], 1599).unwrap_err();
    assert_eq!(
        err,
        CommandError::Locked(LockError::AlreadyLocked {
            owner: ADMIN,
            until: 1600,
        })
    );

    add_as(&warden, OTHER_ADMIN, &["b", "second"], 1600).unwrap();
    assert_eq!(group(&warden).rules(|r| r.len()), 2);
}

#[tokio::test]
async fn owner_extends_own_lease() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);

    add_as(&warden, ADMIN, &["a", "one"], 1000).unwrap();
    add_as(&warden, ADMIN, &["b", "two"], 1500).unwrap();

    let err = add_as(&warden, OTHER_ADMIN, &["c", "three"], 2000).unwrap_err();
    assert!(matches!(
        err,
        CommandError::Locked(LockError::AlreadyLocked { until: 2100, .. })
    ));
}

#[tokio::test]
async fn released_lease_frees_the_group() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);

    add_as(&warden, ADMIN, &["a", "one"], 1000).unwrap();
    assert!(!warden.release_lease(GROUP, OTHER_ADMIN));
    assert!(warden.release_lease(GROUP, ADMIN));
    assert!(!warden.release_lease(GROUP, ADMIN));

    add_as(&warden, OTHER_ADMIN, &["b", "two"], 1001).unwrap();
}

#[tokio::test]
async fn claiming_a_lease_releases_it_in_other_groups() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    let elsewhere = GROUP - 1;
    warden.refresh_admins(elsewhere, vec![ADMIN, OTHER_ADMIN]);

    warden
        .add_or_edit(elsewhere, ADMIN, &raw(&["x", "y"]), SpecStyle::Trimmed, EditMode::Add, 1000)
        .unwrap();
    add_as(&warden, ADMIN, &["a", "one"], 1001).unwrap();

    // The lease in the first group went away with the second claim.
    warden
        .add_or_edit(elsewhere, OTHER_ADMIN, &raw(&["z", "w"]), SpecStyle::Trimmed, EditMode::Add, 1002)
        .unwrap();
}

#[tokio::test]
async fn non_admin_is_rejected() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);

    let err = add_as(&warden, MEMBER, &["a", "b"], 0).unwrap_err();
    assert_eq!(err, CommandError::NotAdmin(MEMBER));
    assert_eq!(err.error_code(), "not_admin");
    assert!(matches!(
        warden.show_rules(GROUP, MEMBER),
        Err(CommandError::NotAdmin(_))
    ));
}

#[tokio::test]
async fn invalid_specs_are_rejected_with_reason() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);

    let cases: [(&[&str], ValidationError); 3] = [
        (
            &["a", "r", "include", "kick ban"],
            ValidationError::ActionConflict("kick".into(), "ban".into()),
        ),
        (&["a", "r", "include exact"], ValidationError::ModeConflict),
        (&["a", "r", "case"], ValidationError::ModeMissing),
    ];
    for (parts, expected) in cases {
        let err = add_as(&warden, ADMIN, parts, 0).unwrap_err();
        assert_eq!(err, CommandError::Invalid(expected));
    }

    assert!(matches!(
        add_as(&warden, ADMIN, &["a", "r", "include", "reply", "all", "10"], 0),
        Err(CommandError::Invalid(ValidationError::DestructInvalid(_)))
    ));
    assert_eq!(group(&warden).rules(|r| r.len()), 0);
}

#[tokio::test]
async fn rule_count_is_capped_on_add() {
    let platform = MockPlatform::new();
    let mut config = config();
    config.limits.max_rules = 2;
    let warden = warden_with(&platform, config, Arc::new(MemoryStore::new()));

    let first = add_as(&warden, ADMIN, &["a", "1"], 0).unwrap();
    add_as(&warden, ADMIN, &["b", "2"], 0).unwrap();
    assert_eq!(
        add_as(&warden, ADMIN, &["c", "3"], 0).unwrap_err(),
        CommandError::Invalid(ValidationError::TooManyRules(2))
    );

    // Editing is still allowed at the cap.
    warden
        .add_or_edit(GROUP, ADMIN, &raw(&["a", "one"]), SpecStyle::Trimmed, EditMode::Edit(first), 0)
        .unwrap();
}

#[tokio::test]
async fn edit_keeps_counters_and_replaces_definition() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    let key = add_as(&warden, ADMIN, &["ping", "pong"], 0).unwrap();
    warden.handle_message(&message(10, MEMBER, "ping"), 1).await;

    let edited = warden
        .add_or_edit(
            GROUP,
            ADMIN,
            &raw(&["pong", "ping", "exact"]),
            SpecStyle::Trimmed,
            EditMode::Edit(key.clone()),
            2,
        )
        .unwrap();
    assert_eq!(edited, key);

    let rule = group(&warden).rules(|r| r.get(&key).cloned()).unwrap();
    assert!(rule.words.contains("pong"));
    assert_eq!(rule.counters.total, 1);
}

#[tokio::test]
async fn unknown_keys_are_reported() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);

    let err = warden
        .add_or_edit(
            GROUP,
            ADMIN,
            &raw(&["a", "b"]),
            SpecStyle::Trimmed,
            EditMode::Edit("nosuch".into()),
            0,
        )
        .unwrap_err();
    assert_eq!(err, CommandError::UnknownRule("nosuch".into()));
    assert_eq!(
        warden.remove_rule(GROUP, ADMIN, "nosuch", 0),
        Err(CommandError::UnknownRule("nosuch".into()))
    );
}

#[tokio::test]
async fn show_lists_rules_in_key_order() {
    let platform = MockPlatform::new();
    let warden = warden(&platform);
    let mut keys = vec![
        add_as(&warden, ADMIN, &["a", "1"], 0).unwrap(),
        add_as(&warden, ADMIN, &["b", "2", "exact case", "delete reply", "member", "400"], 0)
            .unwrap(),
    ];
    keys.sort();

    let views = warden.show_rules(GROUP, ADMIN).unwrap();
    assert_eq!(
        views.iter().map(|v| v.key.clone()).collect::<Vec<_>>(),
        keys
    );
    let b = views.iter().find(|v| v.words == ["b"]).unwrap();
    assert_eq!(b.modes, vec!["exact", "case"]);
    assert_eq!(b.target, "member");
    assert_eq!(b.destruct, 400);
    assert_eq!(b.author, ADMIN);
}
