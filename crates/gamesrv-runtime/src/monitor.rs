//! Periodic liveness probing.
//!
//! Crashes are only noticed when a supervisor probes its child. The monitor
//! probes every server on a fixed interval so that unexpected exits are
//! reconciled (and published as events) even when nobody asks for status.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::registry::SupervisorRegistry;

/// Default probing interval, matching a once-per-second presence refresh.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn a task probing every supervisor in `registry` until cancelled.
pub fn spawn_status_monitor(
    registry: Arc<SupervisorRegistry>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let running = registry
                        .statuses()
                        .iter()
                        .filter(|(_, status)| status.is_running())
                        .count();
                    debug!(running, "Status monitor tick");
                }
            }
        }

        debug!("Status monitor stopped");
    })
}
