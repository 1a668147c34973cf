use serde::{Deserialize, Serialize};
use uuid::Uuid;

use zim_shared::errors::AppResult;
use zim_shared::types::models::{Match, Message, Profile};

use crate::cache::CounterKind;
use crate::AppState;

/// A match as the viewer sees it: the raw record plus the counterpart's
/// profile, the last message for the list preview, and the unread count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchView {
    pub record: Match,
    pub other_user_id: Uuid,
    pub other_profile: Option<Profile>,
    pub last_message: Option<Message>,
    pub unread_count: u64,
}

/// Fetch the viewer's matches, newest first, and re-sync the chat
/// selection against the fresh list (a selection pointing at a vanished
/// match is force-cleared).
pub async fn load_matches(state: &AppState) -> AppResult<Vec<MatchView>> {
    let viewer_id = state.current_user_id()?;
    let records = state.backend.list_matches(viewer_id).await?;

    let mut views = Vec::with_capacity(records.len());
    for record in records {
        let Some(other_user_id) = record.other_user(viewer_id) else {
            continue;
        };
        let other_profile = state.backend.get_profile(other_user_id).await?;
        let messages = state.backend.list_messages(record.id).await?;
        let unread_count = messages
            .iter()
            .filter(|m| m.is_unread_for(viewer_id))
            .count() as u64;
        views.push(MatchView {
            record,
            other_user_id,
            other_profile,
            last_message: messages.into_iter().last(),
            unread_count,
        });
    }

    state.caches.set_matches(views.clone());
    if state.chat.sync_with_matches(&views) {
        state.caches.close_messages();
    }
    Ok(views)
}

/// Fetch the open chat's messages, oldest first. The result only lands in
/// the cache while that match is still the open one.
pub async fn load_messages(state: &AppState, match_id: Uuid) -> AppResult<Vec<Message>> {
    state.current_user_id()?;
    let messages = state.backend.list_messages(match_id).await?;
    state.caches.set_messages(match_id, messages.clone());
    Ok(messages)
}

/// Send a message in a match. The sent message is appended to the cached
/// list optimistically; the echo from the change feed is deduplicated by
/// id.
pub async fn send_message(
    state: &AppState,
    match_id: Uuid,
    content: impl Into<String>,
) -> AppResult<Message> {
    let sender_id = state.current_user_id()?;
    let message = state
        .backend
        .insert_message(match_id, sender_id, content.into())
        .await?;

    state.caches.append_message(&message);
    state.caches.invalidate_matches();
    Ok(message)
}

/// Mark the counterpart's messages in a match as read, mirroring the
/// mutation into the local cache immediately.
pub async fn mark_messages_read(state: &AppState, match_id: Uuid) -> AppResult<()> {
    let reader_id = state.current_user_id()?;
    state.backend.mark_messages_read(match_id, reader_id).await?;

    state.caches.mark_cached_messages_read(reader_id);
    state.caches.invalidate_matches();
    state
        .caches
        .invalidate_counter(CounterKind::UnreadMessages);
    Ok(())
}

/// Whether a match exists between the viewer and another user.
pub async fn check_match(state: &AppState, other_user_id: Uuid) -> AppResult<Option<Match>> {
    let viewer_id = state.current_user_id()?;
    state.backend.find_match(viewer_id, other_user_id).await
}

/// Refresh every counter from the store and mark them Ready.
pub async fn refresh_counters(state: &AppState) -> AppResult<()> {
    let viewer_id = state.current_user_id()?;

    let unread_messages = state.backend.unread_message_count(viewer_id).await?;
    let unread_notifications = state.backend.unread_notification_count(viewer_id).await?;
    let match_count = state.backend.match_count(viewer_id).await?;
    let likes_received = state.backend.likes_received_count(viewer_id).await?;

    state
        .caches
        .set_counter(CounterKind::UnreadMessages, unread_messages);
    state
        .caches
        .set_counter(CounterKind::UnreadNotifications, unread_notifications);
    state.caches.set_counter(CounterKind::MatchCount, match_count);
    state
        .caches
        .set_counter(CounterKind::LikesReceived, likes_received);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zim_backend::Backend;
    use crate::testutil::{fixture_profile, matched_pair, test_state};

    #[tokio::test]
    async fn match_views_are_viewer_relative() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let (other, matched) = matched_pair(&backend, viewer).await;
        backend
            .insert_message(matched.id, other, "hey there".to_string())
            .await
            .unwrap();

        let views = load_matches(&state).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].other_user_id, other);
        assert_eq!(
            views[0].last_message.as_ref().unwrap().content,
            "hey there"
        );
        assert_eq!(views[0].unread_count, 1);
    }

    #[tokio::test]
    async fn send_message_appends_optimistically() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let (_other, matched) = matched_pair(&backend, viewer).await;

        state.caches.open_messages(matched.id);
        load_messages(&state, matched.id).await.unwrap();

        let sent = send_message(&state, matched.id, "first!").await.unwrap();

        let cached = state.caches.messages_snapshot().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, sent.id);

        // Feed echo of the same message does not duplicate it
        assert!(!state.caches.append_message(&sent));
    }

    #[tokio::test]
    async fn mark_read_clears_unread_locally_and_remotely() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let (other, matched) = matched_pair(&backend, viewer).await;
        backend
            .insert_message(matched.id, other, "unread".to_string())
            .await
            .unwrap();

        state.caches.open_messages(matched.id);
        load_messages(&state, matched.id).await.unwrap();

        mark_messages_read(&state, matched.id).await.unwrap();

        let cached = state.caches.messages_snapshot().unwrap();
        assert!(cached.iter().all(|m| m.read_at.is_some()));
        assert_eq!(backend.unread_message_count(viewer).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn counters_reflect_ledger_truth() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let (other, matched) = matched_pair(&backend, viewer).await;
        backend
            .insert_message(matched.id, other, "ping".to_string())
            .await
            .unwrap();

        refresh_counters(&state).await.unwrap();

        use crate::cache::CounterKind::*;
        assert_eq!(state.caches.counter(MatchCount), Some(1));
        assert_eq!(state.caches.counter(UnreadMessages), Some(1));
        assert_eq!(state.caches.counter(LikesReceived), Some(1));
        // The "new match" notification
        assert_eq!(state.caches.counter(UnreadNotifications), Some(1));
    }

    #[tokio::test]
    async fn check_match_works_in_either_direction() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let (other, matched) = matched_pair(&backend, viewer).await;

        let found = check_match(&state, other).await.unwrap().unwrap();
        assert_eq!(found.id, matched.id);

        let stranger = backend
            .seed_profile(fixture_profile("Stranger", 30, "man", "Macon", "Georgia"))
            .await;
        assert!(check_match(&state, stranger.id).await.unwrap().is_none());
    }
}
