use serde::Serialize;

use crate::ledger::{CarbonMessage, CarbonReport};

use super::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("ledger transport is unavailable")]
    Unavailable,
    #[error("failed to send report: {0}")]
    Send(String),
}

/// Outbound path from a tracking context to the ledger owner.
///
/// `send` is fire-and-forget: `Ok` only means the message was handed over,
/// not that the ledger merged it.
pub trait ReportTransport: Send + Sync {
    /// Synchronous liveness check; must not block or panic.
    fn is_available(&self) -> bool;

    fn send(&self, message: CarbonMessage) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FlushTrigger {
    Interval,
    VisibilityLost,
    Unload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    NothingPending,
    NoDomain,
    TransportUnavailable,
    SendFailed,
    /// Handed to the transport; whether the ledger merges it is unknown.
    Dispatched { seconds: f64 },
}

pub struct ReportingChannel<T> {
    transport: T,
}

impl<T: ReportTransport> ReportingChannel<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn flush(&self, session: &mut Session, trigger: FlushTrigger) -> FlushOutcome {
        let Some(quality) = session.quality_tier else {
            return FlushOutcome::NothingPending;
        };
        if !session.has_pending() {
            return FlushOutcome::NothingPending;
        }
        let Some(domain) = session.domain.clone() else {
            return FlushOutcome::NoDomain;
        };
        if !self.transport.is_available() {
            return FlushOutcome::TransportUnavailable;
        }

        let seconds = session.pending_seconds;
        let message = CarbonMessage::UpdateCarbon(CarbonReport {
            domain,
            duration: seconds,
            quality,
        });

        match self.transport.send(message) {
            Ok(()) => {
                // Delivery outcome unknown. Pending is cleared as soon as the
                // send is accepted, so a report lost after this point is lost
                // for good. Making this stronger needs an acknowledged
                // transport, not a change here.
                session.mark_flushed();
                log::debug!(
                    "context {} flushed {seconds:.1}s ({trigger:?})",
                    session.context_id
                );
                FlushOutcome::Dispatched { seconds }
            }
            Err(TransportError::Unavailable) => FlushOutcome::TransportUnavailable,
            Err(err) => {
                log::debug!("context {} flush failed, will retry: {err}", session.context_id);
                FlushOutcome::SendFailed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::quality::QualityTier;
    use crate::tracking::detector::{tests::playing, PlaybackDetector};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    #[derive(Clone, Default)]
    pub(crate) struct RecordingTransport {
        pub sent: Arc<Mutex<Vec<CarbonMessage>>>,
        pub fail_sends: Arc<AtomicBool>,
        pub offline: Arc<AtomicBool>,
    }

    impl ReportTransport for RecordingTransport {
        fn is_available(&self) -> bool {
            !self.offline.load(Ordering::SeqCst)
        }

        fn send(&self, message: CarbonMessage) -> Result<(), TransportError> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(TransportError::Send("context invalidated".into()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn watched_session(seconds: u32) -> Session {
        let detector = PlaybackDetector::default();
        let mut session = Session::new(Some("youtube.com".into()), 1.0);
        for second in 1..=seconds {
            session.tick(&detector, &[playing(1, second as f64, 1080)]);
        }
        session
    }

    #[test]
    fn successful_send_clears_pending() {
        let transport = RecordingTransport::default();
        let channel = ReportingChannel::new(transport.clone());
        let mut session = watched_session(5);

        let outcome = channel.flush(&mut session, FlushTrigger::Interval);
        assert_eq!(outcome, FlushOutcome::Dispatched { seconds: 5.0 });
        assert_eq!(session.pending_seconds, 0.0);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(
            sent.as_slice(),
            &[CarbonMessage::UpdateCarbon(CarbonReport {
                domain: "youtube.com".into(),
                duration: 5.0,
                quality: QualityTier::P1080,
            })]
        );
    }

    #[test]
    fn failed_send_keeps_pending_for_retry() {
        let transport = RecordingTransport::default();
        transport.fail_sends.store(true, Ordering::SeqCst);
        let channel = ReportingChannel::new(transport.clone());
        let mut session = watched_session(3);

        assert_eq!(
            channel.flush(&mut session, FlushTrigger::VisibilityLost),
            FlushOutcome::SendFailed
        );
        assert_eq!(session.pending_seconds, 3.0);

        transport.fail_sends.store(false, Ordering::SeqCst);
        assert_eq!(
            channel.flush(&mut session, FlushTrigger::Interval),
            FlushOutcome::Dispatched { seconds: 3.0 }
        );
    }

    #[test]
    fn unavailable_transport_is_a_silent_skip() {
        let transport = RecordingTransport::default();
        transport.offline.store(true, Ordering::SeqCst);
        let channel = ReportingChannel::new(transport.clone());
        let mut session = watched_session(2);

        assert_eq!(
            channel.flush(&mut session, FlushTrigger::Unload),
            FlushOutcome::TransportUnavailable
        );
        assert_eq!(session.pending_seconds, 2.0);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn nothing_to_send_is_a_noop() {
        let transport = RecordingTransport::default();
        let channel = ReportingChannel::new(transport.clone());

        let mut fresh = Session::new(Some("youtube.com".into()), 1.0);
        assert_eq!(
            channel.flush(&mut fresh, FlushTrigger::Interval),
            FlushOutcome::NothingPending
        );

        let mut flushed = watched_session(1);
        channel.flush(&mut flushed, FlushTrigger::Interval);
        assert_eq!(
            channel.flush(&mut flushed, FlushTrigger::Interval),
            FlushOutcome::NothingPending
        );
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }
}
