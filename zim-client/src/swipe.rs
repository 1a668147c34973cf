use uuid::Uuid;

use zim_shared::errors::{AppError, AppResult};

use crate::cache::CounterKind;
use crate::AppState;

/// Like a candidate from the discovery deck.
///
/// The insert is the single source-of-truth mutation and is at-most-once
/// per click: the caller must disable the control until this resolves,
/// since a duplicate insert trips the unique-pair constraint. On success
/// the candidate is removed locally without waiting for the store; whether
/// a match resulted is the reconciler's job to discover. On failure the
/// candidate stays in place for retry.
pub async fn like(state: &AppState, candidate_id: Uuid) -> AppResult<()> {
    let viewer_id = state.current_user_id()?;

    if !state.caches.contains_candidate(candidate_id) {
        return Err(AppError::stale_reference(
            "candidate is no longer in the discovery deck",
        ));
    }

    match state.backend.insert_like(viewer_id, candidate_id).await {
        Ok(like) => {
            tracing::debug!(like_id = %like.id, liked_id = %candidate_id, "like recorded");
            state.caches.remove_candidate(candidate_id);
            state.caches.invalidate_matches();
            state.caches.invalidate_liked();
            Ok(())
        }
        Err(err) => {
            tracing::warn!(
                liked_id = %candidate_id,
                error = %err,
                "like failed, leaving candidate in place"
            );
            Err(err)
        }
    }
}

/// Pass on a candidate: purely a local removal, idempotent. Passes are not
/// persisted, so a passed profile can resurface after a refresh or filter
/// change.
pub fn pass(state: &AppState, candidate_id: Uuid) -> bool {
    let removed = state.caches.remove_candidate(candidate_id);
    tracing::debug!(candidate_id = %candidate_id, removed, "candidate passed");
    removed
}

/// Remove a previously sent like. If the pair has matched, the match and
/// its messages go first via the composite backend call; the like deletion
/// always runs afterwards, even when that call fails, so a one-directional
/// orphan Like never blocks re-discovery.
pub async fn unlike(state: &AppState, profile_id: Uuid) -> AppResult<()> {
    let viewer_id = state.current_user_id()?;

    let existing = state.backend.find_match(viewer_id, profile_id).await?;
    if let Some(matched) = &existing {
        if let Err(err) = state
            .backend
            .delete_match_and_messages(matched.id, viewer_id)
            .await
        {
            tracing::error!(
                match_id = %matched.id,
                error = %err,
                "match cascade failed, continuing with unlike"
            );
        }
    }

    state.backend.delete_like(viewer_id, profile_id).await?;

    // The open chat must not keep pointing at the deleted conversation
    if let Some(matched) = &existing {
        if state.chat.selected_match_id() == Some(matched.id) {
            state.chat.clear();
            state.caches.close_messages();
        }
    }

    state.caches.invalidate_liked();
    state.caches.invalidate_matches();
    state.caches.invalidate_discover();
    state.caches.invalidate_counter(CounterKind::MatchCount);
    tracing::info!(profile_id = %profile_id, had_match = existing.is_some(), "unlike completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::select_candidates;
    use zim_backend::Backend;
    use crate::testutil::{fixture_profile, test_state};
    use zim_shared::errors::ErrorCode;
    use zim_shared::types::settings::FilterCriteria;

    #[tokio::test]
    async fn like_removes_candidate_from_deck() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let target = backend
            .seed_profile(fixture_profile("Rufaro", 26, "woman", "Atlanta", "Georgia"))
            .await;
        select_candidates(&state, &FilterCriteria::default())
            .await
            .unwrap();
        assert!(state.caches.contains_candidate(target.id));

        like(&state, target.id).await.unwrap();

        assert!(!state.caches.contains_candidate(target.id));
        assert!(backend.liked_ids(viewer).await.unwrap().contains(&target.id));
    }

    #[tokio::test]
    async fn reciprocal_like_produces_a_queryable_match() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let mut me = fixture_profile("Me", 30, "man", "Atlanta", "Georgia");
        me.id = viewer;
        backend.seed_profile(me).await;
        let other = backend
            .seed_profile(fixture_profile("Vimbai", 27, "woman", "Atlanta", "Georgia"))
            .await;
        // The counterpart liked the viewer earlier
        backend.insert_like(other.id, viewer).await.unwrap();

        select_candidates(&state, &FilterCriteria::default())
            .await
            .unwrap();
        like(&state, other.id).await.unwrap();

        let matched = backend.find_match(viewer, other.id).await.unwrap();
        assert!(matched.is_some());
        assert!(!state.caches.contains_candidate(other.id));
    }

    #[tokio::test]
    async fn liking_a_departed_candidate_is_a_stale_reference() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let target = backend
            .seed_profile(fixture_profile("Gone", 26, "woman", "Atlanta", "Georgia"))
            .await;
        select_candidates(&state, &FilterCriteria::default())
            .await
            .unwrap();

        // A concurrent pass already removed the candidate
        pass(&state, target.id);

        let err = like(&state, target.id).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::StaleReference);
    }

    #[tokio::test]
    async fn failed_like_leaves_the_deck_untouched() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let target = backend
            .seed_profile(fixture_profile("Dup", 26, "woman", "Atlanta", "Georgia"))
            .await;
        // A like already exists out-of-band, so the insert will conflict
        backend.insert_like(viewer, target.id).await.unwrap();

        // Deck fetched before the exclusion set knew about the like
        state.caches.set_discover(vec![
            zim_shared::types::models::Candidate::masked(target.clone()),
        ]);

        let err = like(&state, target.id).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::DuplicateLike);
        assert!(state.caches.contains_candidate(target.id));
    }

    #[tokio::test]
    async fn pass_is_idempotent_and_unpersisted() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let target = backend
            .seed_profile(fixture_profile("Maybe", 26, "woman", "Atlanta", "Georgia"))
            .await;
        select_candidates(&state, &FilterCriteria::default())
            .await
            .unwrap();

        assert!(pass(&state, target.id));
        assert!(!pass(&state, target.id));

        // Not remembered: the candidate comes back on refetch
        let candidates = select_candidates(&state, &FilterCriteria::default())
            .await
            .unwrap();
        assert!(candidates.iter().any(|c| c.id() == target.id));
    }

    #[tokio::test]
    async fn unlike_cascades_and_clears_open_chat() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let mut me = fixture_profile("Me", 30, "man", "Atlanta", "Georgia");
        me.id = viewer;
        backend.seed_profile(me).await;
        let other = backend
            .seed_profile(fixture_profile("Tsitsi", 27, "woman", "Atlanta", "Georgia"))
            .await;
        backend.insert_like(other.id, viewer).await.unwrap();
        backend.insert_like(viewer, other.id).await.unwrap();
        let matched = backend.find_match(viewer, other.id).await.unwrap().unwrap();
        backend
            .insert_message(matched.id, viewer, "hi".to_string())
            .await
            .unwrap();

        state.chat.select(matched.id);
        state.caches.open_messages(matched.id);

        unlike(&state, other.id).await.unwrap();

        assert!(backend.find_match(viewer, other.id).await.unwrap().is_none());
        assert!(backend.list_messages(matched.id).await.unwrap().is_empty());
        assert!(!backend.liked_ids(viewer).await.unwrap().contains(&other.id));
        assert!(state.chat.selected_match_id().is_none());
        assert!(state.caches.open_match_id().is_none());
    }

    #[tokio::test]
    async fn unlike_without_match_deletes_only_the_like() {
        let viewer = Uuid::new_v4();
        let (state, backend) = test_state(viewer).await;
        let other = backend
            .seed_profile(fixture_profile("OneWay", 27, "woman", "Atlanta", "Georgia"))
            .await;
        backend.insert_like(viewer, other.id).await.unwrap();

        unlike(&state, other.id).await.unwrap();
        assert!(!backend.liked_ids(viewer).await.unwrap().contains(&other.id));
    }
}
