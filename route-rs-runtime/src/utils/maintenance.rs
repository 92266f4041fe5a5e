use crate::dispatcher::ArpDispatcher;
use crate::interface::{InterfaceTable, Transmit};
use crate::telemetry::ArpTelemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time;
use tracing::{debug, warn};

/// Drives `ArpDispatcher::maintain` once every `period` until `shutdown` fires or its sender is
/// dropped. The first pass runs immediately. Returns the number of passes run.
///
/// Each pass is handed the instant its tick was scheduled for, so a loop that falls behind
/// still sees time advance in `period` steps.
pub async fn run_maintenance<T, I, N>(
    dispatcher: Arc<ArpDispatcher<T, I, N>>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> usize
where
    T: Transmit,
    I: InterfaceTable,
    N: ArpTelemetry,
{
    let mut interval = time::interval(period);
    let mut passes = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            tick = interval.tick() => {
                let report = dispatcher.maintain(tick.into_std());
                passes += 1;
                if !report.is_empty() {
                    debug!(
                        expired = report.expired.len(),
                        retried = report.retried.len(),
                        unreachable = report.unreachable.len(),
                        "maintenance pass"
                    );
                }
                for err in &report.errors {
                    warn!(error = %err, "maintenance request failed");
                }
            }
        }
    }

    debug!(passes, "maintenance stopped");
    passes
}
