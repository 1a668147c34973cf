use async_trait::async_trait;
use uuid::Uuid;

use zim_shared::errors::AppResult;
use zim_shared::types::models::{Like, Match, Message, Notification, Profile};
use zim_shared::types::settings::UserSettings;

/// Query parameters for the discovery surface. Equality clauses are
/// skipped when the field is None; the age range is inclusive on both
/// ends; `exclude_ids` carries the viewer's outgoing-like exclusion set.
#[derive(Debug, Clone)]
pub struct DiscoverQuery {
    pub viewer_id: Uuid,
    pub gender: Option<String>,
    pub age_min: i32,
    pub age_max: i32,
    pub state: Option<String>,
    pub city: Option<String>,
    pub exclude_ids: Vec<Uuid>,
    pub limit: usize,
}

/// The relational datastore boundary: typed query and mutation operations
/// over the profile table and the interaction ledger. Implementations are
/// expected to enforce two invariants the client must not assume happen
/// synchronously:
///
/// - at most one Like per ordered (liker, liked) pair;
/// - a Match row exists exactly when both reciprocal Likes exist, created
///   the instant the second one is inserted.
#[async_trait]
pub trait Backend: Send + Sync {
    // --- profiles ---
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;
    async fn upsert_profile(&self, profile: Profile) -> AppResult<Profile>;
    /// Discoverable profiles matching the query: never the viewer, never an
    /// incomplete profile, never an excluded id. Recency order, capped at
    /// `query.limit`.
    async fn discover_profiles(&self, query: &DiscoverQuery) -> AppResult<Vec<Profile>>;

    // --- likes ---
    async fn liked_ids(&self, liker_id: Uuid) -> AppResult<Vec<Uuid>>;
    async fn liked_profiles(&self, liker_id: Uuid) -> AppResult<Vec<(Like, Profile)>>;
    async fn insert_like(&self, liker_id: Uuid, liked_id: Uuid) -> AppResult<Like>;
    /// Delete the directed like if present. Deleting an absent like is a
    /// no-op, so the unlike fallback path can always run to completion.
    async fn delete_like(&self, liker_id: Uuid, liked_id: Uuid) -> AppResult<()>;
    async fn likes_received_count(&self, liked_id: Uuid) -> AppResult<u64>;

    // --- matches ---
    async fn find_match(&self, a: Uuid, b: Uuid) -> AppResult<Option<Match>>;
    async fn list_matches(&self, user_id: Uuid) -> AppResult<Vec<Match>>;
    async fn match_count(&self, user_id: Uuid) -> AppResult<u64>;
    /// Composite cascade: delete all messages of the match, then the match
    /// itself, as one remote call. The caller still owns deleting the Like.
    async fn delete_match_and_messages(&self, match_id: Uuid, user_id: Uuid) -> AppResult<()>;

    // --- messages ---
    async fn list_messages(&self, match_id: Uuid) -> AppResult<Vec<Message>>;
    async fn insert_message(
        &self,
        match_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> AppResult<Message>;
    /// Set read_at on every unread message in the match not sent by the
    /// reader.
    async fn mark_messages_read(&self, match_id: Uuid, reader_id: Uuid) -> AppResult<()>;
    async fn unread_message_count(&self, user_id: Uuid) -> AppResult<u64>;

    // --- notifications ---
    async fn insert_notification(&self, notification: Notification) -> AppResult<Notification>;
    async fn unread_notification_count(&self, user_id: Uuid) -> AppResult<u64>;

    // --- settings ---
    async fn get_user_settings(&self, user_id: Uuid) -> AppResult<Option<UserSettings>>;
    async fn put_user_settings(&self, settings: UserSettings) -> AppResult<UserSettings>;
}
