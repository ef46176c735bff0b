use std::sync::Arc;
use std::time::Duration;

use nf_app::follow::FollowPanel;
use nf_app::{AuthSession, History, PagerConfig, Route, ViewportEvent, spawn_pager};
use nf_client::ApiClient;
use nf_store::{Database, TokenStore};
use nf_testkit::MockBackend;
use nf_types::SystemClock;

#[tokio::test]
async fn test_sign_up_follow_and_scroll_to_end() {
    let backend = MockBackend::spawn().await.unwrap();
    let bob = backend.seed_user("bob", "secret1");
    for i in 0..15 {
        backend.seed_post(bob, &format!("bob says {}", i), &format!("2024-03-01T10:{:02}:00Z", i));
    }

    let api = Arc::new(ApiClient::new(backend.base_url.clone()));
    let store = Arc::new(Database::open_in_memory().unwrap());
    let session = AuthSession::new(api.clone(), TokenStore::new(store.clone()));

    let mut history = History::new(Route::Feed);
    assert_eq!(history.settle(&session.snapshot()), Route::Login);

    session.register("alice", "secret1").await.unwrap();
    assert_eq!(history.navigate(&session.snapshot(), Route::People), Route::People);
    let token = session.token().unwrap();

    let mut panel = FollowPanel::new();
    panel.set_input(bob.to_string());
    panel.follow(api.as_ref(), &token).await.unwrap();
    assert!(panel.following.contains(&bob));

    let mut pager = spawn_pager(
        api.clone(),
        Arc::new(SystemClock),
        PagerConfig::default(),
        session.subscribe(),
    );
    let first = tokio::time::timeout(Duration::from_secs(5), pager.wait_for(|s| s.posts.len() == 10 && !s.loading))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.posts[0].content, "bob says 14");
    assert!(first.posts.iter().all(|p| p.author_id == bob));

    pager.viewport(ViewportEvent::Sentinel { distance_px: 0 });
    let last = tokio::time::timeout(Duration::from_secs(5), pager.wait_for(|s| s.at_end))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last.posts.len(), 15);
    assert_eq!(last.posts[14].content, "bob says 0");
    assert_eq!(backend.feed_requests(), 3);

    session.logout();
    let cleared = tokio::time::timeout(Duration::from_secs(5), pager.wait_for(|s| s.posts.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.is_empty_feed());
    assert_eq!(history.settle(&session.snapshot()), Route::Login);

    pager.shutdown().await;
}

#[tokio::test]
async fn test_persisted_token_survives_new_session() {
    let backend = MockBackend::spawn().await.unwrap();
    let api = Arc::new(ApiClient::new(backend.base_url.clone()));
    let store = Arc::new(Database::open_in_memory().unwrap());

    let first = AuthSession::new(api.clone(), TokenStore::new(store.clone()));
    first.register("alice", "secret1").await.unwrap();
    let token = first.token();

    let second = AuthSession::new(api, TokenStore::new(store));
    assert_eq!(second.token(), token);
    assert_eq!(second.username(), None);
}
