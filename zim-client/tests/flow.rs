//! End-to-end flow against the in-memory backend: sign in, discover,
//! like into a match, chat, and unlike.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use zim_backend::{Backend, InMemoryBackend, StaticSession};
use zim_client::config::ClientConfig;
use zim_client::{discover, matches, swipe, ZimClient};
use zim_shared::telemetry;
use zim_shared::types::models::Profile;
use zim_shared::types::settings::FilterCriteria;

fn profile(first: &str, age: i32, gender: &str) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        first_name: first.to_string(),
        last_name: "Moyo".to_string(),
        age,
        gender: gender.to_string(),
        city: "Harare".to_string(),
        state: "Harare Province".to_string(),
        bio: "hello".to_string(),
        interests: vec!["hiking".to_string()],
        photos: vec!["a.jpg".to_string()],
        show_age: true,
        show_location: true,
        show_online: true,
        profile_complete: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn eventually<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn discover_like_match_chat_unlike() {
    telemetry::init_tracing("zim-client-test");

    let backend = Arc::new(InMemoryBackend::new());
    let viewer = Uuid::new_v4();
    let mut me = profile("Tari", 30, "man");
    me.id = viewer;
    backend.seed_profile(me).await;
    let other = backend.seed_profile(profile("Rudo", 27, "woman")).await;

    let session = Arc::new(StaticSession::signed_in(viewer));
    let client = ZimClient::connect(
        backend.clone(),
        backend.clone(),
        session,
        ClientConfig::default(),
    )
    .await
    .unwrap();
    let state = client.state().clone();

    // Discovery surfaces the counterpart with presentation applied.
    let filters = state.active_filters(None).await.unwrap();
    assert_eq!(filters.age_range, [18, 99]);
    let deck = discover::select_candidates(&state, &filters).await.unwrap();
    assert_eq!(deck.len(), 1);
    assert_eq!(deck[0].profile.id, other.id);
    assert_eq!(deck[0].display_name, "Rudo Moyo, 27");

    // Counterpart liked us already, so our like completes a match.
    backend.insert_like(other.id, viewer).await.unwrap();
    swipe::like(&state, other.id).await.unwrap();

    let views = matches::load_matches(&state).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].other_user_id, other.id);
    let match_id = views[0].record.id;

    // Open the chat and exchange a message.
    let history = client.open_chat(match_id).await.unwrap();
    assert!(history.is_empty());
    matches::send_message(&state, match_id, "hi there")
        .await
        .unwrap();
    let history = matches::load_messages(&state, match_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "hi there");

    // A message from the counterpart arrives through the reconciler.
    backend
        .insert_message(match_id, other.id, "hey yourself".to_string())
        .await
        .unwrap();
    eventually(|| {
        state
            .caches
            .messages_snapshot()
            .map(|msgs| msgs.len() == 2)
            .unwrap_or(false)
    })
    .await;

    // Unliking tears the match down and clears the open chat.
    swipe::unlike(&state, other.id).await.unwrap();
    assert!(state.chat.selected_match_id().is_none());
    assert!(matches::load_matches(&state).await.unwrap().is_empty());
    assert!(backend
        .find_match(viewer, other.id)
        .await
        .unwrap()
        .is_none());
    assert!(matches::load_messages(&state, match_id)
        .await
        .unwrap()
        .is_empty());

    client.close_chat().await.unwrap();
}

#[tokio::test]
async fn connect_requires_a_signed_in_user() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = Arc::new(StaticSession::signed_out());
    let err = ZimClient::connect(
        backend.clone(),
        backend,
        session,
        ClientConfig::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.error_code(), zim_shared::ErrorCode::NotAuthenticated);
}

#[tokio::test]
async fn invalid_filters_are_rejected_before_fetch() {
    let backend = Arc::new(InMemoryBackend::new());
    let viewer = Uuid::new_v4();
    let mut me = profile("Tari", 30, "man");
    me.id = viewer;
    backend.seed_profile(me).await;
    let session = Arc::new(StaticSession::signed_in(viewer));
    let client = ZimClient::connect(
        backend.clone(),
        backend,
        session,
        ClientConfig::default(),
    )
    .await
    .unwrap();

    let mut filters = FilterCriteria::default();
    filters.age_range = [40, 25];
    let err = discover::select_candidates(client.state(), &filters)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), zim_shared::ErrorCode::ValidationFailed);
}
