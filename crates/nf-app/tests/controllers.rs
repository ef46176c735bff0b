use std::sync::Arc;

use nf_app::compose::Composer;
use nf_app::follow::{FollowPanel, FollowToggle, NoticeKind};
use nf_app::forms::AuthForm;
use nf_app::{AuthSession, ComposeError, FollowError, Route, ValidationError};
use nf_store::{MemoryStore, TokenStore};
use nf_testkit::{Call, ScriptedApi};
use nf_types::UserLite;

#[tokio::test]
async fn test_composer_sends_trimmed_text_and_clears() {
    let api = ScriptedApi::new();
    let mut composer = Composer::new();
    composer.set_text("  hello world \n");

    let post = composer.submit(&api, "T1").await.unwrap().unwrap();

    assert_eq!(post.content, "hello world");
    assert_eq!(api.calls(), vec![Call::CreatePost("hello world".into())]);
    assert!(composer.text.is_empty());
    assert!(!composer.loading);
}

#[tokio::test]
async fn test_composer_blank_text_makes_no_call() {
    let api = ScriptedApi::new();
    let mut composer = Composer::new();
    composer.set_text("   ");

    let err = composer.submit(&api, "T1").await.unwrap_err();

    assert_eq!(err, ComposeError::Invalid(ValidationError::EmptyPost));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_composer_over_limit_makes_no_call() {
    let api = ScriptedApi::new();
    let mut composer = Composer::new();
    composer.set_text("x".repeat(201));

    assert!(!composer.can_submit());
    assert!(composer.submit(&api, "T1").await.is_err());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_composer_failure_keeps_text() {
    let api = ScriptedApi::new();
    api.fail_create_post("Unauthorized");
    let mut composer = Composer::new();
    composer.set_text("hi");

    assert!(composer.submit(&api, "T1").await.is_err());
    assert_eq!(composer.text, "hi");
    assert_eq!(composer.error.as_deref(), Some("Unauthorized"));
}

#[tokio::test]
async fn test_follow_panel_tracks_following() {
    let api = ScriptedApi::new();
    let mut panel = FollowPanel::new();

    panel.set_input("7");
    assert_eq!(panel.follow(&api, "T1").await, Ok(7));
    let notice = panel.notice.clone().unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.text, "Successfully followed User #7");
    assert!(panel.input.is_empty());

    panel.set_input("9");
    panel.follow(&api, "T1").await.unwrap();
    assert_eq!(panel.following.iter().copied().collect::<Vec<_>>(), vec![7, 9]);

    panel.set_input("7");
    panel.unfollow(&api, "T1").await.unwrap();
    assert_eq!(panel.notice.as_ref().unwrap().text, "Successfully unfollowed User #7");
    assert_eq!(panel.following.iter().copied().collect::<Vec<_>>(), vec![9]);

    assert_eq!(
        api.calls(),
        vec![Call::Follow(7), Call::Follow(9), Call::Unfollow(7)]
    );
}

#[tokio::test]
async fn test_follow_panel_rejects_bad_input_locally() {
    let api = ScriptedApi::new();
    let mut panel = FollowPanel::new();

    panel.set_input("-2");
    let err = panel.follow(&api, "T1").await.unwrap_err();
    assert_eq!(err, FollowError::Invalid(ValidationError::InvalidUserId));
    assert_eq!(panel.notice.as_ref().unwrap().text, "Please enter a valid User ID");

    panel.set_input("");
    assert_eq!(panel.unfollow(&api, "T1").await, Err(FollowError::EmptyInput));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_follow_panel_shows_server_error() {
    let api = ScriptedApi::new();
    api.fail_follow("User not found");
    let mut panel = FollowPanel::new();
    panel.set_input("42");

    assert!(panel.follow(&api, "T1").await.is_err());

    let notice = panel.notice.clone().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "User not found");
    assert_eq!(panel.input, "42");
    assert!(panel.following.is_empty());
    assert!(!panel.loading);
}

#[tokio::test]
async fn test_follow_toggle_round_trip() {
    let api = ScriptedApi::new();
    let user = UserLite {
        id: 3,
        username: "carol".into(),
    };
    let mut toggle = FollowToggle::new(user, false, false);

    assert_eq!(toggle.click(&api, "T1").await, Ok(Some(true)));
    assert_eq!(toggle.click(&api, "T1").await, Ok(Some(false)));
    assert_eq!(api.calls(), vec![Call::Follow(3), Call::Unfollow(3)]);
}

#[tokio::test]
async fn test_follow_toggle_own_card() {
    let api = ScriptedApi::new();
    let user = UserLite {
        id: 1,
        username: "alice".into(),
    };
    let mut toggle = FollowToggle::new(user, false, true);

    assert_eq!(toggle.click(&api, "T1").await, Err(FollowError::OwnAccount));
    assert!(api.calls().is_empty());
}

fn session(api: &Arc<ScriptedApi>) -> AuthSession {
    AuthSession::new(api.clone(), TokenStore::new(Arc::new(MemoryStore::new())))
}

#[tokio::test]
async fn test_login_form_success_goes_to_feed() {
    let api = Arc::new(ScriptedApi::new());
    let session = session(&api);
    let mut form = AuthForm::new("alice", "secret1");

    assert_eq!(form.submit_login(&session).await, Some(Route::Feed));
    assert_eq!(form.error, None);
    assert_eq!(session.username().as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_login_form_maps_errors() {
    let api = Arc::new(ScriptedApi::new());
    api.fail_login("Invalid credentials");
    let session = session(&api);
    let mut form = AuthForm::new("alice", "wrong");

    assert_eq!(form.submit_login(&session).await, None);
    assert_eq!(form.error.as_deref(), Some("Invalid username or password"));
    assert!(!form.loading);
}

#[tokio::test]
async fn test_register_form_validates_before_calling() {
    let api = Arc::new(ScriptedApi::new());
    let session = session(&api);
    let mut form = AuthForm::new("al", "secret1");

    assert_eq!(form.submit_register(&session).await, None);
    assert_eq!(form.error.as_deref(), Some("Username must be at least 3 characters"));

    form.username = "alice".into();
    form.password = "123".into();
    assert_eq!(form.submit_register(&session).await, None);
    assert_eq!(form.error.as_deref(), Some("Password must be at least 6 characters"));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_register_form_duplicate_username() {
    let api = Arc::new(ScriptedApi::new());
    api.fail_register("Username already exists");
    let session = session(&api);
    let mut form = AuthForm::new("alice", "secret1");

    assert_eq!(form.submit_register(&session).await, None);
    assert_eq!(form.error.as_deref(), Some("Username already taken. Try another one"));
}

#[tokio::test]
async fn test_register_form_signs_in() {
    let api = Arc::new(ScriptedApi::new());
    let session = session(&api);
    let mut form = AuthForm::new("dave", "secret1");

    assert_eq!(form.submit_register(&session).await, Some(Route::Feed));
    assert_eq!(session.token().as_deref(), Some("token-dave"));
}
