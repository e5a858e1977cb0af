use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::metrics;

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::idle_session_sweep_job(Arc::clone(&self)));
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Unmount idle sessions (runs every sweep interval)
    async fn idle_session_sweep_job(scheduler: Arc<Self>) {
        let period = Duration::from_secs(scheduler.context.config.sessions.sweep_interval_secs);
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match tasks::sweep_idle_sessions(&scheduler.context).await {
                Ok(count) => {
                    metrics::record_background_job("session_sweep", "success");
                    if count > 0 {
                        info!("Unmounted {} idle sessions", count);
                    }
                }
                Err(e) => {
                    metrics::record_background_job("session_sweep", "failure");
                    error!("Failed to sweep idle sessions: {}", e);
                }
            }
        }
    }

    /// Content store health check (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => metrics::record_background_job("health_check", "success"),
                Err(e) => {
                    metrics::record_background_job("health_check", "failure");
                    error!("Health check failed: {}", e);
                }
            }
        }
    }
}
