use time::Duration as TimeDuration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::services::countdown::{TimeWarning, TimerEvent};
use crate::services::runtime::finalize_session;

const EVICTION_INTERVAL_SECONDS: u64 = 60;

/// Spawns the per-second session driver and the finished-session eviction
/// loop. Both stop when the shutdown channel flips.
pub(crate) fn spawn(state: AppState, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(second_loop(state.clone(), shutdown.clone())),
        tokio::spawn(eviction_loop(state, shutdown)),
    ]
}

/// Wall clock for every live session: one tick advances freezes and
/// countdowns, and expired sessions are finalized right here so a
/// disconnected participant still gets scored on time.
async fn second_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => drive_second(&state).await,
        }
    }
}

async fn drive_second(state: &AppState) {
    for session in state.sessions().snapshot().await {
        let event = {
            let mut guard = session.lock().await;
            guard.tick_second()
        };

        match event {
            Some(TimerEvent::Expired) => {
                let session_id = session.lock().await.id().to_string();
                tracing::info!(session_id, "exam time expired, finalizing session");
                finalize_session(state, &session).await;
            }
            Some(TimerEvent::Warned(warning)) => {
                let guard = session.lock().await;
                tracing::debug!(
                    session_id = guard.id(),
                    remaining_seconds = guard.countdown().remaining_seconds(),
                    warning = match warning {
                        TimeWarning::FiveMinutes => "five_minutes",
                        TimeWarning::OneMinute => "one_minute",
                    },
                    "time warning raised"
                );
            }
            None => {}
        }
    }
}

async fn eviction_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let retention =
        TimeDuration::minutes(state.settings().exam().finished_session_retention_minutes as i64);
    let mut tick = interval(Duration::from_secs(EVICTION_INTERVAL_SECONDS));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                let evicted = state.sessions().evict_finished(retention).await;
                if evicted > 0 {
                    tracing::info!(evicted, "evicted finished exam sessions");
                }
            }
        }
    }
}
