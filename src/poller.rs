//! Periodic fetch → compute → publish loop.

use crate::error::AppError;
use crate::metrics::{MetricsSnapshot, chronological, compute_metrics};
use crate::source::SampleSource;
use crate::state::{DashboardState, DashboardView};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Run one polling tick.
///
/// Returns the new snapshot, or `None` when acquisition failed (the failure is
/// logged and recorded, the previous view stays published) or when a newer
/// tick already landed.
pub async fn run_tick<S>(
    source: &S,
    state: &Arc<RwLock<DashboardState>>,
    sequence: u64,
) -> Result<Option<MetricsSnapshot>, AppError>
where
    S: SampleSource,
{
    let threshold_cm = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.threshold_cm()
    };

    let fetched = source.fetch_samples().await;
    let now = OffsetDateTime::now_utc();

    let samples = match fetched {
        Ok(samples) => samples,
        Err(err) => {
            warn!(sequence, error = %err, "Sample fetch failed, keeping previous snapshot");
            let mut guard = state.write().map_err(|_| AppError::StateLock)?;
            guard.record_failure(sequence, now, err.to_string());
            return Ok(None);
        }
    };

    let history = chronological(&samples);
    let snapshot = compute_metrics(&history, threshold_cm);
    debug!(
        sequence,
        samples = history.len(),
        seconds_absent = snapshot.seconds_absent,
        seconds_present = snapshot.seconds_present,
        departures = snapshot.departure_count,
        current_distance_cm = snapshot.current_distance_cm,
        "Computed occupancy metrics"
    );

    let view = DashboardView {
        snapshot,
        history,
        updated_at: now,
    };

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    if guard.apply_view(sequence, view) {
        Ok(Some(snapshot))
    } else {
        warn!(sequence, "Discarding result of a stale tick");
        Ok(None)
    }
}

/// Spawn the polling task. The first tick fires immediately; later ticks that
/// fall behind are skipped rather than bunched up. Any change on `shutdown`
/// (or dropping its sender) stops the task, abandoning an in-flight fetch.
pub fn spawn_poller<S>(
    source: Arc<S>,
    state: Arc<RwLock<DashboardState>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: SampleSource + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sequence = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            sequence += 1;
            tokio::select! {
                result = run_tick(source.as_ref(), &state, sequence) => {
                    if let Err(err) = result {
                        warn!(sequence, error = %err, "Polling tick failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        info!(ticks = sequence, "Poller stopped");
    })
}
