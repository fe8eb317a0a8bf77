//! Login sessions keyed by an opaque bearer token.
//!
//! Each login session owns its auth-state stream, the `SessionContext` following it,
//! and the per-user working state: the job mirror, open chats and resume analyses.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::kind::ChatKind;
use crate::chat::session::{ActiveChat, ChatSession};
use crate::jobs::cache::JobCache;
use crate::resume::analysis::ResumeAnalysis;
use crate::session::context::{AuthStateSender, SessionContext, SessionSnapshot, SessionStatus};
use crate::session::identity::Identity;
use crate::session::users::UserStore;

pub struct LoginSession {
    auth: AuthStateSender,
    context: SessionContext,
    pub jobs: RwLock<JobCache>,
    pub chats: DashMap<Uuid, ActiveChat>,
    chats_opened: AtomicU64,
    /// Newest first.
    pub resume_history: RwLock<Vec<ResumeAnalysis>>,
    last_seen: AtomicI64,
}

impl LoginSession {
    fn new(users: Arc<dyn UserStore>) -> Self {
        let (auth, auth_rx) = watch::channel(None);
        Self {
            auth,
            context: SessionContext::attach(auth_rx, users),
            jobs: RwLock::new(JobCache::default()),
            chats: DashMap::new(),
            chats_opened: AtomicU64::new(0),
            resume_history: RwLock::new(Vec::new()),
            last_seen: AtomicI64::new(Utc::now().timestamp()),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.context.snapshot()
    }

    /// Publishes a new auth state and waits until the context has left `loading`.
    async fn publish(&self, identity: Option<Identity>) -> SessionSnapshot {
        let signing_out = identity.is_none();
        self.auth.send_replace(identity);
        let mut state = self.context.subscribe();
        let reached = state
            .wait_for(|s| {
                if signing_out {
                    s.status == SessionStatus::Anonymous
                } else {
                    s.status != SessionStatus::Loading && s.status != SessionStatus::Anonymous
                }
            })
            .await
            .map(|s| s.clone());
        reached.unwrap_or_else(|_| self.snapshot())
    }

    /// Registers a new chat, closing the oldest ones so at most `limit` stay open.
    pub fn open_chat(
        &self,
        kind: ChatKind,
        session: ChatSession,
        limit: usize,
    ) -> (Uuid, ActiveChat) {
        let chat_id = Uuid::new_v4();
        let chat = ActiveChat {
            kind,
            session,
            opened: self.chats_opened.fetch_add(1, Ordering::Relaxed),
        };
        self.chats.insert(chat_id, chat.clone());

        while self.chats.len() > limit.max(1) {
            let oldest = self
                .chats
                .iter()
                .min_by_key(|entry| entry.value().opened)
                .map(|entry| *entry.key());
            let Some(oldest) = oldest else { break };
            self.chats.remove(&oldest);
            debug!("Closed chat {oldest}, open chat limit is {limit}");
        }
        (chat_id, chat)
    }

    fn touch(&self) {
        self.last_seen.store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    fn idle_for(&self) -> Duration {
        let idle = Utc::now().timestamp() - self.last_seen.load(Ordering::Relaxed);
        Duration::from_secs(u64::try_from(idle).unwrap_or_default())
    }
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, Arc<LoginSession>>>,
}

impl SessionRegistry {
    /// Starts a login session for `identity` and returns its token.
    pub async fn open(
        &self,
        identity: Identity,
        users: Arc<dyn UserStore>,
    ) -> (Uuid, Arc<LoginSession>) {
        let token = Uuid::new_v4();
        let uid = identity.uid.clone();
        let session = Arc::new(LoginSession::new(users));
        session.publish(Some(identity)).await;
        self.sessions.insert(token, session.clone());
        info!("Opened login session for {uid}");
        (token, session)
    }

    /// Looks up a session and marks it as active.
    pub fn get(&self, token: Uuid) -> Option<Arc<LoginSession>> {
        let session = self.sessions.get(&token)?.value().clone();
        session.touch();
        Some(session)
    }

    /// Signs the session out and discards it. Returns the final (anonymous) state.
    pub async fn close(&self, token: Uuid) -> Option<SessionSnapshot> {
        let (_, session) = self.sessions.remove(&token)?;
        let snapshot = session.publish(None).await;
        info!("Closed login session");
        Some(snapshot)
    }

    /// Discards sessions idle for longer than `ttl`. Returns how many were removed.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            let keep = session.idle_for() <= ttl;
            if !keep {
                session.auth.send_replace(None);
            }
            keep
        });
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!("Swept {removed} idle login sessions");
        }
        removed
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
