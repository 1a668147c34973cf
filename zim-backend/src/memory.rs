use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

use zim_shared::errors::{AppError, AppResult, ErrorCode};
use zim_shared::types::event::{ChangeEvent, Row};
use zim_shared::types::models::{Like, Match, Message, Notification, Profile};
use zim_shared::types::settings::UserSettings;

use crate::feed::{ChangeFeed, FeedScope, FeedSubscription};
use crate::store::{Backend, DiscoverQuery};

const FEED_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    likes: Vec<Like>,
    matches: Vec<Match>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    settings: Vec<UserSettings>,
}

struct Subscriber {
    scope: FeedScope,
    tx: mpsc::Sender<ChangeEvent>,
}

/// In-memory stand-in for the managed platform: relational tables plus a
/// row-level change feed. Enforces the ledger invariants the real backend
/// owns — unique like pairs, match creation on the second reciprocal like,
/// and the unlike cascade — and publishes a change event for every commit.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile without going through upsert validation, for test
    /// fixtures. The completeness flag is still recomputed.
    pub async fn seed_profile(&self, mut profile: Profile) -> Profile {
        profile.profile_complete = profile.is_complete();
        let mut tables = self.tables.write().await;
        tables.profiles.push(profile.clone());
        drop(tables);
        self.publish(vec![ChangeEvent::insert(Row::Profile(profile.clone()))])
            .await;
        profile
    }

    async fn publish(&self, events: Vec<ChangeEvent>) {
        let mut subscribers = self.subscribers.lock().await;
        for event in events {
            let mut alive = Vec::with_capacity(subscribers.len());
            for sub in subscribers.drain(..) {
                if sub.scope.covers(&event) {
                    if sub.tx.send(event.clone()).await.is_err() {
                        // Receiver dropped: the subscription is gone
                        continue;
                    }
                }
                alive.push(sub);
            }
            *subscribers = alive;
        }
    }

    async fn match_for_pair(&self, a: Uuid, b: Uuid) -> Option<Match> {
        let tables = self.tables.read().await;
        tables
            .matches
            .iter()
            .find(|m| m.is_between(a, b))
            .cloned()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn upsert_profile(&self, mut profile: Profile) -> AppResult<Profile> {
        profile.profile_complete = profile.is_complete();
        profile.updated_at = Utc::now();

        let mut tables = self.tables.write().await;
        let event = match tables.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => {
                let old = existing.clone();
                *existing = profile.clone();
                ChangeEvent::update(Row::Profile(profile.clone()), Row::Profile(old))
            }
            None => {
                tables.profiles.push(profile.clone());
                ChangeEvent::insert(Row::Profile(profile.clone()))
            }
        };
        drop(tables);

        self.publish(vec![event]).await;
        Ok(profile)
    }

    async fn discover_profiles(&self, query: &DiscoverQuery) -> AppResult<Vec<Profile>> {
        let tables = self.tables.read().await;
        let mut results: Vec<Profile> = tables
            .profiles
            .iter()
            .filter(|p| p.id != query.viewer_id)
            .filter(|p| p.profile_complete)
            .filter(|p| query.gender.as_ref().map_or(true, |g| &p.gender == g))
            .filter(|p| p.age >= query.age_min && p.age <= query.age_max)
            .filter(|p| query.state.as_ref().map_or(true, |s| &p.state == s))
            .filter(|p| query.city.as_ref().map_or(true, |c| &p.city == c))
            .filter(|p| !query.exclude_ids.contains(&p.id))
            .cloned()
            .collect();
        // Recency order, like the backing view
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(query.limit);
        Ok(results)
    }

    async fn liked_ids(&self, liker_id: Uuid) -> AppResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .filter(|l| l.liker_id == liker_id)
            .map(|l| l.liked_id)
            .collect())
    }

    async fn liked_profiles(&self, liker_id: Uuid) -> AppResult<Vec<(Like, Profile)>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<(Like, Profile)> = tables
            .likes
            .iter()
            .filter(|l| l.liker_id == liker_id)
            .filter_map(|l| {
                tables
                    .profiles
                    .iter()
                    .find(|p| p.id == l.liked_id)
                    .map(|p| (l.clone(), p.clone()))
            })
            .collect();
        rows.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        Ok(rows)
    }

    async fn insert_like(&self, liker_id: Uuid, liked_id: Uuid) -> AppResult<Like> {
        let mut tables = self.tables.write().await;

        if !tables.profiles.iter().any(|p| p.id == liked_id) {
            return Err(AppError::new(
                ErrorCode::ProfileNotFound,
                "liked profile not found",
            ));
        }
        if tables
            .likes
            .iter()
            .any(|l| l.liker_id == liker_id && l.liked_id == liked_id)
        {
            return Err(AppError::new(
                ErrorCode::DuplicateLike,
                "like already exists for this pair",
            ));
        }

        let like = Like {
            id: Uuid::new_v4(),
            liker_id,
            liked_id,
            created_at: Utc::now(),
        };
        tables.likes.push(like.clone());
        let mut events = vec![ChangeEvent::insert(Row::Like(like.clone()))];

        // Reciprocal like present and no match yet: the platform creates
        // the match in the same commit.
        let reciprocal = tables
            .likes
            .iter()
            .any(|l| l.liker_id == liked_id && l.liked_id == liker_id);
        let already_matched = tables.matches.iter().any(|m| m.is_between(liker_id, liked_id));
        if reciprocal && !already_matched {
            let matched = Match {
                id: Uuid::new_v4(),
                user1_id: liked_id,
                user2_id: liker_id,
                created_at: Utc::now(),
            };
            tables.matches.push(matched.clone());
            tracing::info!(match_id = %matched.id, user1 = %liked_id, user2 = %liker_id, "reciprocal like produced a match");
            events.push(ChangeEvent::insert(Row::Match(matched.clone())));

            for user_id in [liker_id, liked_id] {
                let notification = Notification {
                    id: Uuid::new_v4(),
                    user_id,
                    kind: "new_match".to_string(),
                    body: "It's a match!".to_string(),
                    read: false,
                    created_at: Utc::now(),
                };
                tables.notifications.push(notification.clone());
                events.push(ChangeEvent::insert(Row::Notification(notification)));
            }
        }
        drop(tables);

        self.publish(events).await;
        Ok(like)
    }

    async fn delete_like(&self, liker_id: Uuid, liked_id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let position = tables
            .likes
            .iter()
            .position(|l| l.liker_id == liker_id && l.liked_id == liked_id);
        let event = position.map(|idx| {
            let removed = tables.likes.remove(idx);
            ChangeEvent::delete(Row::Like(removed))
        });
        drop(tables);

        // Deleting an absent like is a no-op
        if let Some(event) = event {
            self.publish(vec![event]).await;
        }
        Ok(())
    }

    async fn likes_received_count(&self, liked_id: Uuid) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.likes.iter().filter(|l| l.liked_id == liked_id).count() as u64)
    }

    async fn find_match(&self, a: Uuid, b: Uuid) -> AppResult<Option<Match>> {
        Ok(self.match_for_pair(a, b).await)
    }

    async fn list_matches(&self, user_id: Uuid) -> AppResult<Vec<Match>> {
        let tables = self.tables.read().await;
        let mut matches: Vec<Match> = tables
            .matches
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn match_count(&self, user_id: Uuid) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.matches.iter().filter(|m| m.involves(user_id)).count() as u64)
    }

    async fn delete_match_and_messages(&self, match_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.matches.iter().position(|m| m.id == match_id) else {
            return Err(AppError::new(ErrorCode::MatchNotFound, "match not found"));
        };
        if !tables.matches[position].involves(user_id) {
            return Err(AppError::new(
                ErrorCode::NotMatchMember,
                "caller is not a party of this match",
            ));
        }

        let mut events = Vec::new();
        let mut kept = Vec::with_capacity(tables.messages.len());
        for message in tables.messages.drain(..) {
            if message.match_id == match_id {
                events.push(ChangeEvent::delete(Row::Message(message)));
            } else {
                kept.push(message);
            }
        }
        tables.messages = kept;

        let removed = tables.matches.remove(position);
        events.push(ChangeEvent::delete(Row::Match(removed)));
        drop(tables);

        self.publish(events).await;
        Ok(())
    }

    async fn list_messages(&self, match_id: Uuid) -> AppResult<Vec<Message>> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.match_id == match_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn insert_message(
        &self,
        match_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> AppResult<Message> {
        let mut tables = self.tables.write().await;
        let Some(matched) = tables.matches.iter().find(|m| m.id == match_id) else {
            return Err(AppError::new(ErrorCode::MatchNotFound, "match not found"));
        };
        if !matched.involves(sender_id) {
            return Err(AppError::new(
                ErrorCode::NotMatchMember,
                "sender is not a party of this match",
            ));
        }

        let message = Message {
            id: Uuid::new_v4(),
            match_id,
            sender_id,
            content,
            created_at: Utc::now(),
            read_at: None,
        };
        tables.messages.push(message.clone());
        drop(tables);

        self.publish(vec![ChangeEvent::insert(Row::Message(message.clone()))])
            .await;
        Ok(message)
    }

    async fn mark_messages_read(&self, match_id: Uuid, reader_id: Uuid) -> AppResult<()> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let mut events = Vec::new();
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.match_id == match_id && m.is_unread_for(reader_id))
        {
            let old = message.clone();
            message.read_at = Some(now);
            events.push(ChangeEvent::update(
                Row::Message(message.clone()),
                Row::Message(old),
            ));
        }
        drop(tables);

        self.publish(events).await;
        Ok(())
    }

    async fn unread_message_count(&self, user_id: Uuid) -> AppResult<u64> {
        let tables = self.tables.read().await;
        let my_matches: Vec<Uuid> = tables
            .matches
            .iter()
            .filter(|m| m.involves(user_id))
            .map(|m| m.id)
            .collect();
        Ok(tables
            .messages
            .iter()
            .filter(|m| my_matches.contains(&m.match_id) && m.is_unread_for(user_id))
            .count() as u64)
    }

    async fn insert_notification(&self, notification: Notification) -> AppResult<Notification> {
        let mut tables = self.tables.write().await;
        tables.notifications.push(notification.clone());
        drop(tables);

        self.publish(vec![ChangeEvent::insert(Row::Notification(
            notification.clone(),
        ))])
        .await;
        Ok(notification)
    }

    async fn unread_notification_count(&self, user_id: Uuid) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as u64)
    }

    async fn get_user_settings(&self, user_id: Uuid) -> AppResult<Option<UserSettings>> {
        let tables = self.tables.read().await;
        Ok(tables
            .settings
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn put_user_settings(&self, mut settings: UserSettings) -> AppResult<UserSettings> {
        settings.updated_at = Utc::now();
        let mut tables = self.tables.write().await;
        match tables
            .settings
            .iter_mut()
            .find(|s| s.user_id == settings.user_id)
        {
            Some(existing) => *existing = settings.clone(),
            None => tables.settings.push(settings.clone()),
        }
        Ok(settings)
    }
}

#[async_trait]
impl ChangeFeed for InMemoryBackend {
    async fn subscribe(&self, scope: FeedScope) -> AppResult<FeedSubscription> {
        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        self.subscribers.lock().await.push(Subscriber { scope, tx });
        tracing::debug!(?scope, "change feed subscription established");
        Ok(FeedSubscription::new(scope, rx))
    }
}
