use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{Like, Match, Message, Notification, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    Likes,
    Matches,
    Messages,
    Notifications,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Likes => "likes",
            Self::Matches => "matches",
            Self::Messages => "messages",
            Self::Notifications => "notifications",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// A typed row payload carried by a change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum Row {
    Profile(Profile),
    Like(Like),
    Match(Match),
    Message(Message),
    Notification(Notification),
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Self::Profile(_) => Table::Profiles,
            Self::Like(_) => Table::Likes,
            Self::Match(_) => Table::Matches,
            Self::Message(_) => Table::Messages,
            Self::Notification(_) => Table::Notifications,
        }
    }
}

/// Row-level change notification delivered by the change feed, in backend
/// commit order within a subscription. Carries the new row for inserts and
/// updates, the old row for deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub table: Table,
    pub kind: ChangeKind,
    pub timestamp: DateTime<Utc>,
    pub new: Option<Row>,
    pub old: Option<Row>,
}

impl ChangeEvent {
    pub fn insert(row: Row) -> Self {
        Self {
            id: Uuid::now_v7(),
            table: row.table(),
            kind: ChangeKind::Insert,
            timestamp: Utc::now(),
            new: Some(row),
            old: None,
        }
    }

    pub fn update(new: Row, old: Row) -> Self {
        Self {
            id: Uuid::now_v7(),
            table: new.table(),
            kind: ChangeKind::Update,
            timestamp: Utc::now(),
            new: Some(new),
            old: Some(old),
        }
    }

    pub fn delete(old: Row) -> Self {
        Self {
            id: Uuid::now_v7(),
            table: old.table(),
            kind: ChangeKind::Delete,
            timestamp: Utc::now(),
            new: None,
            old: Some(old),
        }
    }

    /// The row the event is about: the new row when present, the old row
    /// for deletes.
    pub fn row(&self) -> Option<&Row> {
        self.new.as_ref().or(self.old.as_ref())
    }
}
