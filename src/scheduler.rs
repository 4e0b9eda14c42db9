use crate::session::SessionStore;
use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

/// Initialize and start the session reaper.
///
/// Sessions idle past the store's timeout are dropped on every tick of
/// `cron_expr` (six fields: second minute hour day month day_of_week).
pub async fn start_session_reaper(sessions: Arc<SessionStore>, cron_expr: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    info!(
        "Scheduling session reaper (cron: {}, idle timeout: {} min)",
        cron_expr,
        sessions.idle_timeout().num_minutes()
    );

    let job = Job::new_async(cron_expr, move |_uuid, _l| {
        let sessions = Arc::clone(&sessions);

        Box::pin(async move {
            reap_sessions(&sessions);
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Session reaper started");

    Ok(scheduler)
}

/// Drop expired sessions now. Returns how many were removed.
pub fn reap_sessions(sessions: &SessionStore) -> usize {
    let removed = sessions.purge_expired();
    if removed > 0 {
        info!("Reaped {} expired session(s), {} active", removed, sessions.len());
    } else {
        debug!("No expired sessions ({} active)", sessions.len());
    }
    removed
}
