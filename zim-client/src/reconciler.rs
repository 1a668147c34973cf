use std::sync::{Arc, Mutex};

use metrics::counter;
use tokio::task::JoinHandle;
use uuid::Uuid;

use zim_backend::{FeedScope, FeedSubscription};
use zim_shared::errors::AppResult;
use zim_shared::types::event::{ChangeEvent, ChangeKind, Row, Table};

use crate::cache::CounterKind;
use crate::{matches, AppState};

struct OpenMatch {
    match_id: Uuid,
    task: JoinHandle<()>,
}

/// Keeps the cached views converging to ledger truth as it changes
/// out-of-band. Created once per authenticated session at application
/// root; owns one standing subscription per table-of-interest plus one
/// switchable subscription for the open chat's messages.
pub struct Reconciler {
    state: Arc<AppState>,
    standing: Vec<JoinHandle<()>>,
    open_match: Mutex<Option<OpenMatch>>,
}

impl Reconciler {
    pub async fn spawn(state: Arc<AppState>) -> AppResult<Self> {
        let me = state.current_user_id()?;

        let scopes = [
            FeedScope::ProfilesExcept(me),
            FeedScope::MatchesOf(me),
            FeedScope::Likes,
            FeedScope::NotificationsOf(me),
        ];
        let mut standing = Vec::with_capacity(scopes.len());
        for scope in scopes {
            let subscription = state.feed.subscribe(scope).await?;
            standing.push(tokio::spawn(run_subscription(state.clone(), subscription)));
        }

        tracing::info!(user_id = %me, "realtime reconciler started");
        Ok(Self {
            state,
            standing,
            open_match: Mutex::new(None),
        })
    }

    /// Switch the message subscription to the given match, or detach it.
    ///
    /// The previous match's subscription is torn down before the new one
    /// attaches; two live subscriptions on the same logical scope would
    /// deliver duplicate events.
    pub async fn set_open_match(&self, match_id: Option<Uuid>) -> AppResult<()> {
        {
            let mut guard = self.open_match.lock().unwrap();
            if let Some(open) = guard.as_ref() {
                if Some(open.match_id) == match_id {
                    return Ok(());
                }
            }
            if let Some(previous) = guard.take() {
                previous.task.abort();
                tracing::debug!(match_id = %previous.match_id, "message subscription torn down");
            }
        }

        match match_id {
            Some(id) => {
                self.state.caches.open_messages(id);
                let subscription = self.state.feed.subscribe(FeedScope::MessagesFor(id)).await?;
                let task = tokio::spawn(run_subscription(self.state.clone(), subscription));
                *self.open_match.lock().unwrap() = Some(OpenMatch { match_id: id, task });
                tracing::debug!(match_id = %id, "message subscription attached");
            }
            None => {
                self.state.caches.close_messages();
            }
        }
        Ok(())
    }

    pub fn open_match_id(&self) -> Option<Uuid> {
        self.open_match.lock().unwrap().as_ref().map(|o| o.match_id)
    }
}

impl Drop for Reconciler {
    fn drop(&mut self) {
        for task in &self.standing {
            task.abort();
        }
        if let Ok(mut guard) = self.open_match.lock() {
            if let Some(open) = guard.take() {
                open.task.abort();
            }
        }
    }
}

async fn run_subscription(state: Arc<AppState>, mut subscription: FeedSubscription) {
    let scope = subscription.scope();
    while let Some(event) = subscription.recv().await {
        let labels = [("table", event.table.as_str()), ("kind", event.kind.as_str())];
        counter!("reconciler_events_total", &labels).increment(1);

        if let Err(err) = apply_event(&state, &event).await {
            // Availability over freshness: log, keep last-known-good caches
            counter!("reconciler_event_errors_total", &labels).increment(1);
            tracing::error!(?scope, error = %err, "event application failed");
        }
    }
    tracing::debug!(?scope, "subscription stream closed");
}

/// The consistency policy: which caches each feed event touches.
///
/// Match rows are reconciled by invalidate-and-refetch, never by applying
/// the event row as a patch, so a Match insert arriving before the Like
/// that caused it (cross-subscription order is not guaranteed) still
/// converges.
pub(crate) async fn apply_event(state: &Arc<AppState>, event: &ChangeEvent) -> AppResult<()> {
    match event.table {
        Table::Profiles => {
            state.caches.invalidate_discover();
            if matches!(event.kind, ChangeKind::Update | ChangeKind::Delete) {
                // A matched party's profile may have changed
                state.caches.invalidate_matches();
            }
        }
        Table::Matches => {
            state.caches.invalidate_matches();
            state.caches.invalidate_counter(CounterKind::MatchCount);
            state.caches.invalidate_counter(CounterKind::UnreadMessages);
            if event.kind == ChangeKind::Insert {
                // The new counterpart must stop surfacing as a candidate
                state.caches.invalidate_discover();
            }
            matches::load_matches(state).await?;
        }
        Table::Messages => match (event.kind, event.row()) {
            (ChangeKind::Insert, Some(Row::Message(message))) => {
                state.caches.append_message(message);
                state
                    .caches
                    .invalidate_counter(CounterKind::UnreadMessages);
                // Last-message preview on the match list
                state.caches.invalidate_matches();
            }
            (ChangeKind::Update, Some(Row::Message(message))) => {
                state.caches.replace_message(message);
            }
            _ => {}
        },
        Table::Likes => {
            state.caches.invalidate_discover();
            state.caches.invalidate_matches();
        }
        Table::Notifications => {
            state
                .caches
                .invalidate_counter(CounterKind::UnreadNotifications);
        }
    }
    Ok(())
}
