/// Page sessions
///
/// A session is one mounted portfolio page: its project listing, its skill
/// listing and its contact form. Mounting starts both listing loads in the
/// background; unmounting aborts in-flight loads and pending category
/// transitions so nothing touches the session after it is gone.
use crate::{
    config::{ListingConfig, SessionConfig},
    contact::ContactForm,
    content::{AssetUrlResolver, ContentClient, Project, Skill},
    error::{PortfolioError, PortfolioResult},
    listing::{FilteredListView, ListOptions},
    metrics,
};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info};
use uuid::Uuid;

/// One mounted page
pub struct PortfolioSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    pub projects: FilteredListView<Project>,
    pub skills: FilteredListView<Skill>,
    pub contact: Mutex<ContactForm>,
    last_seen: Mutex<Instant>,
    loads: Mutex<Vec<JoinHandle<()>>>,
}

impl PortfolioSession {
    fn new(content: Arc<dyn ContentClient>, assets: AssetUrlResolver, listing: &ListingConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            projects: FilteredListView::new(
                content.clone(),
                assets.clone(),
                ListOptions::projects(listing.project_transition()),
            ),
            skills: FilteredListView::new(
                content,
                assets,
                ListOptions::skills(listing.skill_transition()),
            ),
            contact: Mutex::new(ContactForm::new()),
            last_seen: Mutex::new(Instant::now()),
            loads: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Start both listing loads without waiting for them
    async fn mount(self: &Arc<Self>) {
        let projects = {
            let session = Arc::clone(self);
            tokio::spawn(async move {
                session.projects.load_if_idle().await;
            })
        };
        let skills = {
            let session = Arc::clone(self);
            tokio::spawn(async move {
                session.skills.load_if_idle().await;
            })
        };
        self.loads.lock().await.extend([projects, skills]);
    }

    /// Abort in-flight loads and pending transitions
    async fn unmount(&self) {
        for handle in self.loads.lock().await.drain(..) {
            handle.abort();
        }
        self.projects.cancel_pending_transition().await;
        self.skills.cancel_pending_transition().await;
    }

    async fn touch(&self) {
        *self.last_seen.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_seen.lock().await.elapsed()
    }
}

/// Registry of mounted sessions
pub struct SessionRegistry {
    content: Arc<dyn ContentClient>,
    assets: AssetUrlResolver,
    listing: ListingConfig,
    idle_ttl: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<Uuid, Arc<PortfolioSession>>>,
}

impl SessionRegistry {
    pub fn new(
        content: Arc<dyn ContentClient>,
        assets: AssetUrlResolver,
        listing: ListingConfig,
        config: &SessionConfig,
    ) -> Self {
        Self {
            content,
            assets,
            listing,
            idle_ttl: Duration::from_secs(config.idle_ttl_secs),
            max_sessions: config.max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Mount a new page session and start its listing loads
    pub async fn mount(&self) -> PortfolioResult<Arc<PortfolioSession>> {
        let session = {
            let mut sessions = self.sessions.write().await;
            if sessions.len() >= self.max_sessions {
                return Err(PortfolioError::Unavailable(format!(
                    "session capacity of {} reached",
                    self.max_sessions
                )));
            }

            let session = Arc::new(PortfolioSession::new(
                self.content.clone(),
                self.assets.clone(),
                &self.listing,
            ));
            sessions.insert(session.id, session.clone());
            metrics::ACTIVE_SESSIONS.set(sessions.len() as i64);
            session
        };

        session.mount().await;
        info!(session = %session.id, "session mounted");
        Ok(session)
    }

    /// Look up a session, marking it as recently used
    pub async fn get(&self, id: Uuid) -> PortfolioResult<Arc<PortfolioSession>> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortfolioError::NotFound(format!("session {}", id)))?;
        session.touch().await;
        Ok(session)
    }

    /// Unmount and forget a session
    pub async fn unmount(&self, id: Uuid) -> PortfolioResult<()> {
        let session = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .remove(&id)
                .ok_or_else(|| PortfolioError::NotFound(format!("session {}", id)))?;
            metrics::ACTIVE_SESSIONS.set(sessions.len() as i64);
            session
        };

        session.unmount().await;
        info!(session = %id, "session unmounted");
        Ok(())
    }

    /// Unmount every session idle for longer than the TTL
    pub async fn sweep_idle(&self) -> usize {
        let expired = {
            let mut sessions = self.sessions.write().await;
            let mut expired = Vec::new();
            for (id, session) in sessions.iter() {
                if session.idle_for().await > self.idle_ttl {
                    expired.push(*id);
                }
            }
            let removed: Vec<_> = expired
                .into_iter()
                .filter_map(|id| sessions.remove(&id))
                .collect();
            metrics::ACTIVE_SESSIONS.set(sessions.len() as i64);
            removed
        };

        for session in &expired {
            debug!(session = %session.id, "unmounting idle session");
            session.unmount().await;
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
