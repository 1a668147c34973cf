pub mod cache;
pub mod chat;
pub mod config;
pub mod discover;
pub mod matches;
pub mod reconciler;
pub mod swipe;

use std::sync::Arc;

use uuid::Uuid;

use zim_backend::{Backend, ChangeFeed, IdentitySession};
use zim_shared::errors::{AppError, AppResult};
use zim_shared::types::models::Message;
use zim_shared::types::settings::{FilterCriteria, LocationOverride};

use cache::Caches;
use chat::ChatState;
use config::ClientConfig;
use reconciler::Reconciler;

/// Shared client state: the platform handles plus the locally cached
/// views. Passed by reference to every operation; there are no ambient
/// globals.
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub feed: Arc<dyn ChangeFeed>,
    pub session: Arc<dyn IdentitySession>,
    pub config: ClientConfig,
    pub caches: Caches,
    pub chat: ChatState,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn Backend>,
        feed: Arc<dyn ChangeFeed>,
        session: Arc<dyn IdentitySession>,
        config: ClientConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            feed,
            session,
            config,
            caches: Caches::new(),
            chat: ChatState::new(),
        })
    }

    pub fn current_user_id(&self) -> AppResult<Uuid> {
        self.session
            .current_user()
            .map(|u| u.id)
            .ok_or_else(AppError::not_authenticated)
    }

    /// The active discovery filter: persisted settings overlaid with the
    /// session location override, falling back to configured defaults
    /// when the user has no settings row yet.
    pub async fn active_filters(
        &self,
        location: Option<&LocationOverride>,
    ) -> AppResult<FilterCriteria> {
        let user_id = self.current_user_id()?;
        let settings = self.backend.get_user_settings(user_id).await?;
        let mut criteria = FilterCriteria::resolve(settings.as_ref(), location);
        if settings.is_none() {
            criteria.age_range = [self.config.default_age_min, self.config.default_age_max];
        }
        Ok(criteria)
    }
}

/// Application-root handle: the shared state plus the reconciler whose
/// lifecycle is tied to the authenticated session, not to any screen.
pub struct ZimClient {
    state: Arc<AppState>,
    reconciler: Reconciler,
}

impl std::fmt::Debug for ZimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZimClient").finish_non_exhaustive()
    }
}

impl ZimClient {
    /// Wire up the client for the currently signed-in user and start the
    /// realtime reconciler. Fails with `NotAuthenticated` when nobody is
    /// signed in.
    pub async fn connect(
        backend: Arc<dyn Backend>,
        feed: Arc<dyn ChangeFeed>,
        session: Arc<dyn IdentitySession>,
        config: ClientConfig,
    ) -> AppResult<Self> {
        let state = AppState::new(backend, feed, session, config);
        let reconciler = Reconciler::spawn(state.clone()).await?;
        Ok(Self { state, reconciler })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Select a match for chatting: switches the message subscription
    /// (tearing down the previous one first) and loads the conversation.
    pub async fn open_chat(&self, match_id: Uuid) -> AppResult<Vec<Message>> {
        self.state.chat.select(match_id);
        self.reconciler.set_open_match(Some(match_id)).await?;
        matches::load_messages(&self.state, match_id).await
    }

    pub async fn close_chat(&self) -> AppResult<()> {
        self.state.chat.clear();
        self.reconciler.set_open_match(None).await
    }
}
