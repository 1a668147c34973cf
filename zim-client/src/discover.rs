use serde::{Deserialize, Serialize};
use validator::Validate;

use zim_backend::DiscoverQuery;
use zim_shared::errors::AppResult;
use zim_shared::types::models::{Candidate, Like};
use zim_shared::types::settings::{FilterCriteria, GenderPreference};

use crate::AppState;

/// A row of the "profiles I liked" view: the like edge plus the liked
/// profile with full info (the viewer already liked them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedProfile {
    pub like: Like,
    pub profile: Candidate,
}

/// Compute the ordered set of discoverable profiles for the current user.
///
/// Exclusions: self, everyone the user already liked, and anything failing
/// the active filter. No ranking beyond the store's recency order; results
/// are capped at `discover_limit`. An empty result is the terminal
/// "no candidates" state, not an error.
pub async fn select_candidates(
    state: &AppState,
    filters: &FilterCriteria,
) -> AppResult<Vec<Candidate>> {
    let viewer_id = state.current_user_id()?;
    filters.validate()?;

    let exclude_ids = state.backend.liked_ids(viewer_id).await?;

    let query = DiscoverQuery {
        viewer_id,
        gender: match &filters.gender_preference {
            GenderPreference::Everyone => None,
            GenderPreference::Only(g) => Some(g.clone()),
        },
        age_min: filters.age_range[0],
        age_max: filters.age_range[1],
        state: filters.state_filter.clone(),
        city: filters.city_filter.clone(),
        exclude_ids,
        limit: state.config.discover_limit,
    };

    let profiles = state.backend.discover_profiles(&query).await?;
    let candidates: Vec<Candidate> = profiles.into_iter().map(Candidate::masked).collect();

    tracing::debug!(
        viewer_id = %viewer_id,
        count = candidates.len(),
        "discovery candidates selected"
    );
    state.caches.set_discover(candidates.clone());
    Ok(candidates)
}

/// The profiles the current user has liked, newest like first, decorated
/// with full info.
pub async fn load_liked_profiles(state: &AppState) -> AppResult<Vec<LikedProfile>> {
    let viewer_id = state.current_user_id()?;
    let rows = state.backend.liked_profiles(viewer_id).await?;
    let views: Vec<LikedProfile> = rows
        .into_iter()
        .map(|(like, profile)| LikedProfile {
            like,
            profile: Candidate::unmasked(profile),
        })
        .collect();
    state.caches.set_liked(views.clone());
    Ok(views)
}
