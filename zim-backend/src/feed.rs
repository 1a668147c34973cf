use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use zim_shared::errors::AppResult;
use zim_shared::types::event::{ChangeEvent, Row, Table};

/// A logical (table, predicate) scope for a change-feed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Profile rows other than the given user's own.
    ProfilesExcept(Uuid),
    /// Match rows where the given user is a party.
    MatchesOf(Uuid),
    /// Message rows belonging to one match.
    MessagesFor(Uuid),
    /// All like rows.
    Likes,
    /// Notification rows addressed to the given user.
    NotificationsOf(Uuid),
}

impl FeedScope {
    pub fn table(&self) -> Table {
        match self {
            Self::ProfilesExcept(_) => Table::Profiles,
            Self::MatchesOf(_) => Table::Matches,
            Self::MessagesFor(_) => Table::Messages,
            Self::Likes => Table::Likes,
            Self::NotificationsOf(_) => Table::Notifications,
        }
    }

    /// Whether an event falls inside this scope's predicate.
    pub fn covers(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table() {
            return false;
        }
        match (self, event.row()) {
            (Self::ProfilesExcept(me), Some(Row::Profile(p))) => p.id != *me,
            (Self::MatchesOf(me), Some(Row::Match(m))) => m.involves(*me),
            (Self::MessagesFor(match_id), Some(Row::Message(msg))) => msg.match_id == *match_id,
            (Self::Likes, Some(Row::Like(_))) => true,
            (Self::NotificationsOf(me), Some(Row::Notification(n))) => n.user_id == *me,
            _ => false,
        }
    }
}

/// A live subscription. Events arrive in backend commit order; dropping
/// the subscription unsubscribes.
pub struct FeedSubscription {
    scope: FeedScope,
    rx: mpsc::Receiver<ChangeEvent>,
}

impl FeedSubscription {
    pub fn new(scope: FeedScope, rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { scope, rx }
    }

    pub fn scope(&self) -> FeedScope {
        self.scope
    }

    /// Next event, or None once the feed side has gone away.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

/// Push-based row-level change notifications, scoped by table and
/// predicate. One subscription per logical scope at a time is the caller's
/// responsibility; the transport owns reconnection.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, scope: FeedScope) -> AppResult<FeedSubscription>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zim_shared::types::models::{Match, Message};

    #[test]
    fn scope_covers_matching_rows_only() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let m = Match {
            id: Uuid::new_v4(),
            user1_id: me,
            user2_id: other,
            created_at: Utc::now(),
        };
        let event = ChangeEvent::insert(Row::Match(m));

        assert!(FeedScope::MatchesOf(me).covers(&event));
        assert!(FeedScope::MatchesOf(other).covers(&event));
        assert!(!FeedScope::MatchesOf(Uuid::new_v4()).covers(&event));
        // Wrong table is never covered
        assert!(!FeedScope::Likes.covers(&event));
    }

    #[test]
    fn message_scope_is_per_match() {
        let match_id = Uuid::new_v4();
        let msg = Message {
            id: Uuid::new_v4(),
            match_id,
            sender_id: Uuid::new_v4(),
            content: "hey".to_string(),
            created_at: Utc::now(),
            read_at: None,
        };
        let event = ChangeEvent::insert(Row::Message(msg));

        assert!(FeedScope::MessagesFor(match_id).covers(&event));
        assert!(!FeedScope::MessagesFor(Uuid::new_v4()).covers(&event));
    }
}
