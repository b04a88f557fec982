use crate::metrics::{MetricsSnapshot, Sample};
use time::OffsetDateTime;
use tokio::sync::watch;

/// What the display surface shows after a successful tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub snapshot: MetricsSnapshot,
    /// Chronological samples behind the snapshot, for the chart
    pub history: Vec<Sample>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickStatus {
    Ok,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub sequence: u64,
    pub at: OffsetDateTime,
    pub status: TickStatus,
}

/// Process-wide polling state shared by the poller and the API.
///
/// Outcomes carry the sequence number of the tick that produced them; anything
/// older than the newest recorded outcome is dropped so a slow tick can never
/// overwrite fresher data.
#[derive(Debug)]
pub struct DashboardState {
    threshold_cm: f64,
    view: Option<DashboardView>,
    view_tx: watch::Sender<Option<DashboardView>>,
    last_tick: Option<TickOutcome>,
}

impl DashboardState {
    pub fn new(threshold_cm: f64) -> Self {
        let (view_tx, _view_rx) = watch::channel(None);
        Self {
            threshold_cm,
            view: None,
            view_tx,
            last_tick: None,
        }
    }

    pub fn threshold_cm(&self) -> f64 {
        self.threshold_cm
    }

    /// Latest snapshot, or the zero snapshot before the first successful tick.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.view
            .as_ref()
            .map(|view| view.snapshot)
            .unwrap_or_default()
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<Option<DashboardView>> {
        self.view_tx.subscribe()
    }

    pub fn last_tick(&self) -> Option<&TickOutcome> {
        self.last_tick.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        match self.last_tick.as_ref().map(|tick| &tick.status) {
            Some(TickStatus::Failed { reason }) => Some(reason),
            _ => None,
        }
    }

    /// Publish the view computed by tick `sequence`. Returns false if a newer
    /// tick already recorded its outcome.
    pub fn apply_view(&mut self, sequence: u64, view: DashboardView) -> bool {
        if self.is_stale(sequence) {
            return false;
        }
        self.last_tick = Some(TickOutcome {
            sequence,
            at: view.updated_at,
            status: TickStatus::Ok,
        });
        self.view = Some(view.clone());
        self.view_tx.send_replace(Some(view));
        true
    }

    /// Record a failed tick. The previously published view stays in place.
    pub fn record_failure(&mut self, sequence: u64, at: OffsetDateTime, reason: String) -> bool {
        if self.is_stale(sequence) {
            return false;
        }
        self.last_tick = Some(TickOutcome {
            sequence,
            at,
            status: TickStatus::Failed { reason },
        });
        true
    }

    fn is_stale(&self, sequence: u64) -> bool {
        self.last_tick
            .as_ref()
            .is_some_and(|tick| sequence <= tick.sequence)
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(crate::metrics::DEFAULT_ABSENCE_THRESHOLD_CM)
    }
}
