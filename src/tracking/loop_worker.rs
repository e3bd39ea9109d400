use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;

use super::detector::{MediaSource, PlaybackDetector};
use super::reporter::{FlushOutcome, FlushTrigger, ReportTransport, ReportingChannel};
use super::session::Session;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Page lifecycle signals that force an early flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    VisibilityChanged { hidden: bool },
    Unload,
}

/// Drives one tracking context until it is cancelled or its page unloads.
///
/// Sampling, periodic flushes and lifecycle flushes all run on this one task,
/// so they never interleave. Returns the session as it stood at teardown.
pub async fn tracking_loop<T: ReportTransport>(
    mut session: Session,
    source: Arc<dyn MediaSource>,
    channel: ReportingChannel<T>,
    config: TrackerConfig,
    mut page_events: mpsc::UnboundedReceiver<PageEvent>,
    cancel_token: CancellationToken,
) -> Session {
    let detector = PlaybackDetector::new(config.min_ready_state);

    let mut sample_ticker = time::interval(config.sample_interval);
    sample_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut report_ticker = time::interval_at(
        Instant::now() + config.report_interval,
        config.report_interval,
    );
    report_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut events_open = true;

    log_info!(
        "tracking context {} started for {:?}",
        session.context_id,
        session.domain
    );

    loop {
        tokio::select! {
            _ = sample_ticker.tick() => {
                let probes = source.probe();
                if session.tick(&detector, &probes) {
                    log_debug!(
                        "context {} active, pending {:.1}s",
                        session.context_id,
                        session.pending_seconds
                    );
                }
            }
            _ = report_ticker.tick() => {
                flush(&channel, &mut session, FlushTrigger::Interval);
            }
            event = page_events.recv(), if events_open => match event {
                Some(PageEvent::VisibilityChanged { hidden: true }) => {
                    flush(&channel, &mut session, FlushTrigger::VisibilityLost);
                }
                Some(PageEvent::VisibilityChanged { hidden: false }) => {}
                Some(PageEvent::Unload) => {
                    flush(&channel, &mut session, FlushTrigger::Unload);
                    log_info!("tracking context {} unloaded", session.context_id);
                    break;
                }
                None => events_open = false,
            },
            _ = cancel_token.cancelled() => {
                flush(&channel, &mut session, FlushTrigger::Unload);
                log_info!("tracking context {} shutting down", session.context_id);
                break;
            }
        }
    }

    session
}

fn flush<T: ReportTransport>(
    channel: &ReportingChannel<T>,
    session: &mut Session,
    trigger: FlushTrigger,
) {
    match channel.flush(session, trigger) {
        FlushOutcome::TransportUnavailable => {
            log_warn!(
                "context {} could not report {:.1}s ({trigger:?}); retrying on next flush",
                session.context_id,
                session.pending_seconds
            );
        }
        FlushOutcome::SendFailed => {
            log_error!(
                "context {} failed to send {:.1}s ({trigger:?}); keeping it pending",
                session.context_id,
                session.pending_seconds
            );
        }
        FlushOutcome::Dispatched { .. } | FlushOutcome::NothingPending | FlushOutcome::NoDomain => {}
    }
}
