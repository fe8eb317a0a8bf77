//! Session context: follows an auth-state stream and resolves the user's role.
//!
//! ```text
//! loading ──event(None)──▶ anonymous
//!    │
//!    └──event(Some(user))──▶ role_pending ──lookup done──▶ role_resolved
//! ```
//! Every new event restarts the flow from the top. A lookup that is still running when
//! a newer event arrives is dropped, so a stale role never overwrites newer state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::session::identity::Identity;
use crate::session::users::{Role, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Anonymous,
    RolePending,
    RoleResolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<Identity>,
    pub role: Option<Role>,
}

impl SessionSnapshot {
    pub fn loading() -> Self {
        Self {
            status: SessionStatus::Loading,
            user: None,
            role: None,
        }
    }

    fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            user: None,
            role: None,
        }
    }

    fn pending(user: Identity) -> Self {
        Self {
            status: SessionStatus::RolePending,
            user: Some(user),
            role: None,
        }
    }

    fn resolved(user: Identity, role: Option<Role>) -> Self {
        Self {
            status: SessionStatus::RoleResolved,
            user: Some(user),
            role,
        }
    }

    /// Only a resolved admin role grants privileges; a pending role never does.
    pub fn is_admin(&self) -> bool {
        self.status == SessionStatus::RoleResolved && self.role == Some(Role::Admin)
    }

    /// Settled means no role lookup is outstanding.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Anonymous | SessionStatus::RoleResolved
        )
    }
}

/// Sender side of an auth-state stream. The channel's initial value is not an event;
/// the first value sent after `attach` is.
pub type AuthStateSender = watch::Sender<Option<Identity>>;

pub struct SessionContext {
    state: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionContext {
    /// Subscribes to `auth` and starts resolving roles through `users`.
    pub fn attach(auth: watch::Receiver<Option<Identity>>, users: Arc<dyn UserStore>) -> Self {
        let (state_tx, state) = watch::channel(SessionSnapshot::loading());
        let task = tokio::spawn(follow_auth_state(auth, users, state_tx));
        Self { state, task }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Waits until no role lookup is outstanding and returns that state.
    /// Returns the last known state if the auth stream has gone away.
    pub async fn settled(&self) -> SessionSnapshot {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(SessionSnapshot::is_settled)
            .await
            .map(|snapshot| snapshot.clone());
        settled.unwrap_or_else(|_| state.borrow().clone())
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow_auth_state(
    mut auth: watch::Receiver<Option<Identity>>,
    users: Arc<dyn UserStore>,
    state: watch::Sender<SessionSnapshot>,
) {
    // Wait for the first event; until then the session stays loading.
    while auth.changed().await.is_ok() {
        // Re-enter from the top for as long as events keep superseding the lookup.
        loop {
            let Some(user) = auth.borrow_and_update().clone() else {
                state.send_replace(SessionSnapshot::anonymous());
                break;
            };

            state.send_replace(SessionSnapshot::pending(user.clone()));

            tokio::select! {
                role = users.fetch_role(&user.uid) => {
                    let role = role.unwrap_or_else(|e| {
                        warn!("Role lookup for {} failed: {e}", user.uid);
                        None
                    });
                    debug!("Resolved role {:?} for {}", role, user.uid);
                    state.send_replace(SessionSnapshot::resolved(user, role));
                    break;
                }
                changed = auth.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    debug!("Auth state changed during role lookup for {}", user.uid);
                }
            }
        }
    }
}
