use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// The authenticated user as seen by the client. The id is the only field
/// the core logic depends on; everything else is opaque metadata from the
/// identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub metadata: serde_json::Value,
}

impl SessionUser {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            metadata: serde_json::Value::Null,
        }
    }
}

/// Identity session boundary: who is signed in, and a watch channel for
/// auth changes (sign-in, sign-out, token refresh with a different user).
pub trait IdentitySession: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;
    fn watch_auth(&self) -> watch::Receiver<Option<SessionUser>>;
}

/// A session with a fixed (but switchable) user, for tests and local runs.
pub struct StaticSession {
    tx: watch::Sender<Option<SessionUser>>,
}

impl StaticSession {
    pub fn signed_in(user_id: Uuid) -> Self {
        let (tx, _rx) = watch::channel(Some(SessionUser::new(user_id)));
        Self { tx }
    }

    pub fn signed_out() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn set_user(&self, user: Option<SessionUser>) {
        let _ = self.tx.send(user);
    }
}

impl IdentitySession for StaticSession {
    fn current_user(&self) -> Option<SessionUser> {
        self.tx.borrow().clone()
    }

    fn watch_auth(&self) -> watch::Receiver<Option<SessionUser>> {
        self.tx.subscribe()
    }
}
