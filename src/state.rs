use std::future::Future;
use std::sync::Arc;

use sqlx::PgPool;
use tokio_util::task::TaskTracker;

use crate::config::AppConfig;
use crate::mailer::Mailer;
use crate::middleware::RateLimiter;
use crate::models::Models;

/// Shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: &'static AppConfig,
    pub models: Models,
    pub limiter: Arc<RateLimiter>,
    pub mailer: Arc<dyn Mailer>,
    /// Tracks deferred work (notification dispatch) so shutdown can wait
    /// for it to drain instead of abandoning it mid-flight.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(config: &'static AppConfig, pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config,
            models: Models::new(pool, config),
            limiter: Arc::new(RateLimiter::new(
                config.api.rate_limit_rps,
                config.api.rate_limit_burst,
            )),
            mailer,
            tasks: TaskTracker::new(),
        }
    }

    /// Run deferred work fire-and-forget relative to the HTTP response.
    /// The task is tracked for shutdown draining; failures are logged, not
    /// retried.
    pub fn background<F>(&self, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.tasks.spawn(async move {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "background task failed");
            }
        });
    }
}
