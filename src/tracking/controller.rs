use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;

use super::detector::MediaSource;
use super::domain::TrackedDomains;
use super::loop_worker::{tracking_loop, PageEvent};
use super::reporter::{ReportTransport, ReportingChannel};
use super::session::Session;

/// Owns the tracking task for one page context.
pub struct TrackerController {
    config: TrackerConfig,
    tracked: TrackedDomains,
    handle: Option<JoinHandle<Session>>,
    cancel_token: Option<CancellationToken>,
    events_tx: Option<mpsc::UnboundedSender<PageEvent>>,
}

impl TrackerController {
    pub fn new(config: TrackerConfig, tracked: TrackedDomains) -> Self {
        Self {
            config,
            tracked,
            handle: None,
            cancel_token: None,
            events_tx: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts tracking `host`. Returns `Ok(false)` without spawning anything
    /// when the host is not a tracked domain.
    pub fn start_tracking<T>(
        &mut self,
        host: &str,
        source: Arc<dyn MediaSource>,
        transport: T,
    ) -> Result<bool>
    where
        T: ReportTransport + 'static,
    {
        if self.handle.is_some() {
            bail!("tracking already active");
        }

        let Some(domain) = self.tracked.resolve(host) else {
            info!("Not tracking {host}: domain not of interest");
            return Ok(false);
        };

        let session = Session::new(Some(domain), self.config.tick_secs());
        let cancel_token = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(tracking_loop(
            session,
            source,
            ReportingChannel::new(transport),
            self.config.clone(),
            events_rx,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.events_tx = Some(events_tx);
        Ok(true)
    }

    /// Forwards a page lifecycle event to the running context, if any.
    pub fn page_event(&self, event: PageEvent) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event);
        }
    }

    /// Cancels the context, which performs a final flush, and waits for it.
    pub async fn stop_tracking(&mut self) -> Result<Option<Session>> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.events_tx = None;

        match self.handle.take() {
            Some(handle) => {
                let mut session = handle
                    .await
                    .context("tracking loop task failed to join")?;
                session.clear();
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }
}
