mod common;

use cache_invalidation::StaleView;
use common::TestContext;
use social_service::domain::UpdateProfile;
use social_service::error::ServiceError;
use std::collections::HashSet;

#[tokio::test]
async fn test_profile_counts() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;
    let carol = ctx.sign_up("carol").await;

    ctx.state.relationships.toggle_follow(bob.id, alice.id).await.unwrap();
    ctx.state.relationships.toggle_follow(carol.id, alice.id).await.unwrap();
    ctx.state.relationships.toggle_follow(alice.id, bob.id).await.unwrap();
    ctx.state
        .content
        .create_post(alice.id, Some("one".into()), None)
        .await
        .unwrap();

    let profile = ctx.state.profiles.get_profile("alice").await.unwrap();
    assert_eq!(profile.id, alice.id);
    assert_eq!(profile.follower_count, 2);
    assert_eq!(profile.following_count, 1);
    assert_eq!(profile.post_count, 1);
}

#[tokio::test]
async fn test_unknown_handle() {
    let ctx = TestContext::new();
    let err = ctx.state.profiles.get_profile("nobody").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = ctx
        .state
        .profiles
        .list_author_posts("nobody", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_author_and_liked_posts() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;

    let a1 = ctx
        .state
        .content
        .create_post(alice.id, Some("a1".into()), None)
        .await
        .unwrap();
    let b1 = ctx
        .state
        .content
        .create_post(bob.id, Some("b1".into()), None)
        .await
        .unwrap();
    ctx.state.relationships.toggle_like(bob.id, a1.id).await.unwrap();
    for text in ["first", "second"] {
        ctx.state.content.create_comment(bob.id, a1.id, text).await.unwrap();
    }

    let authored = ctx
        .state
        .profiles
        .list_author_posts("bob", Some(alice.id))
        .await
        .unwrap();
    assert_eq!(authored.len(), 1);
    assert_eq!(authored[0].id, b1.id);

    let liked = ctx
        .state
        .profiles
        .list_liked_posts("bob", Some(bob.id))
        .await
        .unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, a1.id);
    assert!(liked[0].has_liked);
    let texts: Vec<&str> = liked[0].comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
}

#[tokio::test]
async fn test_update_profile_normalizes_fields() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    ctx.invalidator.take();

    let user = ctx
        .state
        .profiles
        .update_profile(
            alice.id,
            UpdateProfile {
                name: Some("  Alice Liddell ".into()),
                bio: Some("Curious".into()),
                location: None,
                websites: Some(vec![
                    "wonderland.example".into(),
                    "".into(),
                    "https://wonderland.example".into(),
                    "http://rabbit.example/hole".into(),
                ]),
            },
        )
        .await
        .unwrap();
    assert_eq!(user.name.as_deref(), Some("Alice Liddell"));
    assert_eq!(user.bio.as_deref(), Some("Curious"));
    assert_eq!(
        user.websites,
        vec![
            "https://wonderland.example/".to_string(),
            "http://rabbit.example/hole".to_string()
        ]
    );
    assert_eq!(
        ctx.invalidator.take(),
        vec![StaleView::Profile("alice".to_string())]
    );

    // blank clears, absent keeps
    let user = ctx
        .state
        .profiles
        .update_profile(
            alice.id,
            UpdateProfile {
                bio: Some("   ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(user.bio.is_none());
    assert_eq!(user.name.as_deref(), Some("Alice Liddell"));
    assert_eq!(user.websites.len(), 2);
}

#[tokio::test]
async fn test_update_profile_rejects_long_bio() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;

    let err = ctx
        .state
        .profiles
        .update_profile(
            alice.id,
            UpdateProfile {
                bio: Some("x".repeat(501)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_update_profile_limits_apply_after_normalizing() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;

    let user = ctx
        .state
        .profiles
        .update_profile(
            alice.id,
            UpdateProfile {
                name: Some(" ".repeat(101)),
                websites: Some(vec!["a.com".to_string(); 11]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(user.name.is_none());
    assert_eq!(user.websites, vec!["https://a.com/".to_string()]);

    let err = ctx
        .state
        .profiles
        .update_profile(
            alice.id,
            UpdateProfile {
                websites: Some((0..11).map(|i| format!("site{i}.example")).collect()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_suggestions_exclude_self_and_followed() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let mut others = Vec::new();
    for handle in ["bob", "carol", "dave", "erin", "frank"] {
        others.push(ctx.sign_up(handle).await);
    }
    ctx.state
        .relationships
        .toggle_follow(alice.id, others[0].id)
        .await
        .unwrap();

    for _ in 0..5 {
        let suggestions = ctx
            .state
            .profiles
            .suggested_users(Some(alice.id))
            .await
            .unwrap();
        assert_eq!(suggestions.len(), 3);
        let handles: HashSet<&str> = suggestions.iter().map(|u| u.handle.as_str()).collect();
        assert_eq!(handles.len(), 3);
        assert!(!handles.contains("alice"));
        assert!(!handles.contains("bob"));
    }

    assert!(ctx
        .state
        .profiles
        .suggested_users(None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_suggestions_when_following_everyone() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;
    ctx.state.relationships.toggle_follow(alice.id, bob.id).await.unwrap();

    let suggestions = ctx
        .state
        .profiles
        .suggested_users(Some(alice.id))
        .await
        .unwrap();
    assert!(suggestions.is_empty());
}
