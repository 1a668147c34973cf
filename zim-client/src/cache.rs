use std::sync::RwLock;

use uuid::Uuid;

use zim_shared::types::models::{Candidate, Message};

use crate::discover::LikedProfile;
use crate::matches::MatchView;

/// Per-key cache state machine. `invalidate` keeps the last-known-good data
/// around (`Stale`) so views never blank out while a refetch is pending;
/// staleness is the accepted failure mode when the feed goes quiet.
#[derive(Debug, Clone, Default)]
pub enum CacheState<T> {
    #[default]
    Loading,
    Ready(T),
    Stale(T),
}

impl<T> CacheState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loading => None,
            Self::Ready(data) | Self::Stale(data) => Some(data),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn set_ready(&mut self, data: T) {
        *self = Self::Ready(data);
    }

    /// Ready -> Stale, preserving data. Loading stays Loading.
    pub fn invalidate(&mut self) {
        let current = std::mem::replace(self, Self::Loading);
        *self = match current {
            Self::Loading => Self::Loading,
            Self::Ready(data) | Self::Stale(data) => Self::Stale(data),
        };
    }
}

/// Message list for the one open chat, keyed by its match id so a late
/// event from a previous subscription cannot land in the wrong view.
#[derive(Debug)]
pub struct MessageCache {
    pub match_id: Uuid,
    pub state: CacheState<Vec<Message>>,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub unread_messages: CacheState<u64>,
    pub unread_notifications: CacheState<u64>,
    pub match_count: CacheState<u64>,
    pub likes_received: CacheState<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    UnreadMessages,
    UnreadNotifications,
    MatchCount,
    LikesReceived,
}

/// The locally cached views. Single-writer-per-key: optimistic UI mutations
/// and reconciler invalidations write the same keys, last write wins by
/// arrival. Locks are held only for the duration of the mutation, never
/// across an await point.
#[derive(Default)]
pub struct Caches {
    discover: RwLock<CacheState<Vec<Candidate>>>,
    matches: RwLock<CacheState<Vec<MatchView>>>,
    liked: RwLock<CacheState<Vec<LikedProfile>>>,
    messages: RwLock<Option<MessageCache>>,
    counters: RwLock<Counters>,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }

    // --- discover ---

    pub fn set_discover(&self, candidates: Vec<Candidate>) {
        self.discover.write().unwrap().set_ready(candidates);
    }

    pub fn invalidate_discover(&self) {
        self.discover.write().unwrap().invalidate();
    }

    pub fn discover_snapshot(&self) -> Option<Vec<Candidate>> {
        self.discover.read().unwrap().data().cloned()
    }

    pub fn discover_is_stale(&self) -> bool {
        self.discover.read().unwrap().is_stale()
    }

    pub fn contains_candidate(&self, candidate_id: Uuid) -> bool {
        self.discover
            .read()
            .unwrap()
            .data()
            .map_or(false, |list| list.iter().any(|c| c.id() == candidate_id))
    }

    /// Remove a candidate by id. Removing an absent id is a no-op, so
    /// concurrent removals (a pass racing a realtime delete) commute.
    pub fn remove_candidate(&self, candidate_id: Uuid) -> bool {
        let mut guard = self.discover.write().unwrap();
        match &mut *guard {
            CacheState::Ready(list) | CacheState::Stale(list) => {
                let before = list.len();
                list.retain(|c| c.id() != candidate_id);
                list.len() != before
            }
            CacheState::Loading => false,
        }
    }

    // --- matches ---

    pub fn set_matches(&self, views: Vec<MatchView>) {
        self.matches.write().unwrap().set_ready(views);
    }

    pub fn invalidate_matches(&self) {
        self.matches.write().unwrap().invalidate();
    }

    pub fn matches_snapshot(&self) -> Option<Vec<MatchView>> {
        self.matches.read().unwrap().data().cloned()
    }

    pub fn matches_is_stale(&self) -> bool {
        self.matches.read().unwrap().is_stale()
    }

    // --- liked profiles ---

    pub fn set_liked(&self, rows: Vec<LikedProfile>) {
        self.liked.write().unwrap().set_ready(rows);
    }

    pub fn invalidate_liked(&self) {
        self.liked.write().unwrap().invalidate();
    }

    pub fn liked_snapshot(&self) -> Option<Vec<LikedProfile>> {
        self.liked.read().unwrap().data().cloned()
    }

    // --- open chat messages ---

    pub fn open_messages(&self, match_id: Uuid) {
        *self.messages.write().unwrap() = Some(MessageCache {
            match_id,
            state: CacheState::Loading,
        });
    }

    pub fn close_messages(&self) {
        *self.messages.write().unwrap() = None;
    }

    pub fn open_match_id(&self) -> Option<Uuid> {
        self.messages.read().unwrap().as_ref().map(|c| c.match_id)
    }

    /// Ignored unless `match_id` is the open chat: a stale fetch for a
    /// previously open match must not overwrite the current view.
    pub fn set_messages(&self, match_id: Uuid, messages: Vec<Message>) -> bool {
        let mut guard = self.messages.write().unwrap();
        match guard.as_mut() {
            Some(cache) if cache.match_id == match_id => {
                cache.state.set_ready(messages);
                true
            }
            _ => false,
        }
    }

    pub fn messages_snapshot(&self) -> Option<Vec<Message>> {
        self.messages
            .read()
            .unwrap()
            .as_ref()
            .and_then(|c| c.state.data().cloned())
    }

    /// Append idempotently by message id. Returns false when the message
    /// was already present or targets a different match.
    pub fn append_message(&self, message: &Message) -> bool {
        let mut guard = self.messages.write().unwrap();
        let Some(cache) = guard.as_mut() else {
            return false;
        };
        if cache.match_id != message.match_id {
            return false;
        }
        match &mut cache.state {
            CacheState::Loading => {
                cache.state = CacheState::Ready(vec![message.clone()]);
                true
            }
            CacheState::Ready(list) | CacheState::Stale(list) => {
                if list.iter().any(|m| m.id == message.id) {
                    return false;
                }
                list.push(message.clone());
                true
            }
        }
    }

    /// Replace a cached message by id (read-receipt propagation).
    pub fn replace_message(&self, message: &Message) -> bool {
        let mut guard = self.messages.write().unwrap();
        let Some(cache) = guard.as_mut() else {
            return false;
        };
        if cache.match_id != message.match_id {
            return false;
        }
        match &mut cache.state {
            CacheState::Ready(list) | CacheState::Stale(list) => {
                match list.iter_mut().find(|m| m.id == message.id) {
                    Some(slot) => {
                        *slot = message.clone();
                        true
                    }
                    None => false,
                }
            }
            CacheState::Loading => false,
        }
    }

    /// Mark every cached message as read locally, mirroring the backend
    /// mutation without waiting for its update events.
    pub fn mark_cached_messages_read(&self, reader_id: Uuid) {
        let now = chrono::Utc::now();
        let mut guard = self.messages.write().unwrap();
        if let Some(cache) = guard.as_mut() {
            if let CacheState::Ready(list) | CacheState::Stale(list) = &mut cache.state {
                for message in list.iter_mut().filter(|m| m.is_unread_for(reader_id)) {
                    message.read_at = Some(now);
                }
            }
        }
    }

    // --- counters ---

    pub fn set_counter(&self, kind: CounterKind, value: u64) {
        let mut counters = self.counters.write().unwrap();
        self.counter_slot(&mut counters, kind).set_ready(value);
    }

    pub fn invalidate_counter(&self, kind: CounterKind) {
        let mut counters = self.counters.write().unwrap();
        self.counter_slot(&mut counters, kind).invalidate();
    }

    pub fn counter(&self, kind: CounterKind) -> Option<u64> {
        let mut counters = self.counters.write().unwrap();
        self.counter_slot(&mut counters, kind).data().copied()
    }

    fn counter_slot<'a>(
        &self,
        counters: &'a mut Counters,
        kind: CounterKind,
    ) -> &'a mut CacheState<u64> {
        match kind {
            CounterKind::UnreadMessages => &mut counters.unread_messages,
            CounterKind::UnreadNotifications => &mut counters.unread_notifications,
            CounterKind::MatchCount => &mut counters.match_count,
            CounterKind::LikesReceived => &mut counters.likes_received,
        }
    }
}
