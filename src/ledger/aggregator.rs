//! Long-lived owner of the carbon ledger.
//!
//! Tracking contexts never touch the store directly. They push
//! `UPDATE_CARBON` messages into an unbounded queue and this task applies them
//! one at a time as additive merges, then notifies subscribers. Because merges
//! only add, concurrent contexts need no ordering between them.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::tracking::{ReportTransport, TransportError};

use super::message::{CarbonMessage, CarbonReport};
use super::record::{LedgerChange, LedgerRecord};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

enum LedgerCommand {
    Apply(CarbonMessage),
    Snapshot(oneshot::Sender<LedgerRecord>),
    Reset(oneshot::Sender<Result<LedgerRecord>>),
}

#[derive(Clone)]
pub struct AggregatorHandle {
    commands: mpsc::UnboundedSender<LedgerCommand>,
    changes: broadcast::Sender<LedgerChange>,
    cancel_token: CancellationToken,
}

impl AggregatorHandle {
    /// Spawns the aggregator task. The ledger record is bootstrapped before
    /// the first message is handled.
    pub fn spawn(db: Database) -> (Self, JoinHandle<()>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(aggregator_loop(
            db,
            command_rx,
            changes.clone(),
            cancel_token.clone(),
        ));

        (
            Self {
                commands,
                changes,
                cancel_token,
            },
            handle,
        )
    }

    /// Transport handed to tracking contexts.
    pub fn transport(&self) -> LedgerTransport {
        LedgerTransport {
            commands: self.commands.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerChange> {
        self.changes.subscribe()
    }

    /// Accepts a raw JSON message as sent by an out-of-process tracker.
    pub fn submit_json(&self, raw: &str) -> Result<()> {
        let message: CarbonMessage =
            serde_json::from_str(raw).context("malformed carbon message")?;
        self.commands
            .send(LedgerCommand::Apply(message))
            .map_err(|_| anyhow!("ledger aggregator has stopped"))
    }

    /// Current ledger, after every message queued before this call.
    pub async fn snapshot(&self) -> Result<LedgerRecord> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(LedgerCommand::Snapshot(reply_tx))
            .map_err(|_| anyhow!("ledger aggregator has stopped"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("ledger aggregator dropped snapshot request"))
    }

    /// Clears all stats and the CO2 total. Idempotent.
    pub async fn reset(&self) -> Result<LedgerRecord> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(LedgerCommand::Reset(reply_tx))
            .map_err(|_| anyhow!("ledger aggregator has stopped"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("ledger aggregator dropped reset request"))?
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

/// Fire-and-forget sender used by tracking contexts.
#[derive(Clone)]
pub struct LedgerTransport {
    commands: mpsc::UnboundedSender<LedgerCommand>,
}

impl ReportTransport for LedgerTransport {
    fn is_available(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, message: CarbonMessage) -> Result<(), TransportError> {
        self.commands
            .send(LedgerCommand::Apply(message))
            .map_err(|_| TransportError::Unavailable)
    }
}

async fn aggregator_loop(
    db: Database,
    mut command_rx: mpsc::UnboundedReceiver<LedgerCommand>,
    changes: broadcast::Sender<LedgerChange>,
    cancel_token: CancellationToken,
) {
    if let Err(err) = db.ensure_ledger().await {
        warn!("Failed to bootstrap ledger record: {err:#}");
    }

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else {
                    break;
                };
                handle_command(&db, &changes, command).await;
            }
            _ = cancel_token.cancelled() => {
                // Refuse new messages but apply the ones already accepted.
                command_rx.close();
                while let Some(command) = command_rx.recv().await {
                    handle_command(&db, &changes, command).await;
                }
                break;
            }
        }
    }

    info!("Ledger aggregator shutting down");
}

async fn handle_command(
    db: &Database,
    changes: &broadcast::Sender<LedgerChange>,
    command: LedgerCommand,
) {
    match command {
        LedgerCommand::Apply(CarbonMessage::UpdateCarbon(report)) => {
            apply_report(db, changes, report).await;
        }
        LedgerCommand::Snapshot(reply) => {
            let record = db.load_ledger().await.unwrap_or_else(|err| {
                warn!("Failed to load ledger, reporting empty: {err:#}");
                LedgerRecord::default()
            });
            let _ = reply.send(record);
        }
        LedgerCommand::Reset(reply) => {
            let result = db.reset_ledger().await.map(|(before, after)| {
                publish(changes, &before, &after);
                info!("Ledger reset");
                after
            });
            let _ = reply.send(result);
        }
    }
}

async fn apply_report(
    db: &Database,
    changes: &broadcast::Sender<LedgerChange>,
    report: CarbonReport,
) {
    if !report.is_mergeable() {
        debug!(
            "Skipping report with domain {:?} and duration {}",
            report.domain, report.duration
        );
        return;
    }

    let domain = report.domain.clone();
    let quality = report.quality;
    let duration = report.duration;

    match db.merge_carbon_report(report).await {
        Ok((before, after)) => {
            info!(
                "Updated stats for {domain} [{quality}]: +{duration:.2}s, +{:.4}g CO2",
                after.total_co2 - before.total_co2
            );
            publish(changes, &before, &after);
        }
        Err(err) => {
            error!("Failed to merge report for {domain}: {err:#}");
        }
    }
}

fn publish(changes: &broadcast::Sender<LedgerChange>, before: &LedgerRecord, after: &LedgerRecord) {
    let changed_keys = before.changed_keys(after);
    if changed_keys.is_empty() {
        return;
    }

    // No subscribers is fine.
    let _ = changes.send(LedgerChange {
        changed_keys,
        record: after.clone(),
        changed_at: Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityTier;
    use crate::ledger::record::{KEY_DAILY_STATS, KEY_TOTAL_CO2};
    use tempfile::TempDir;

    fn report(domain: &str, duration: f64, quality: QualityTier) -> CarbonMessage {
        CarbonMessage::UpdateCarbon(CarbonReport {
            domain: domain.into(),
            duration,
            quality,
        })
    }

    fn spawn_in(temp_dir: &TempDir) -> (AggregatorHandle, JoinHandle<()>) {
        let db = Database::new(temp_dir.path().join("ledger.sqlite3")).unwrap();
        AggregatorHandle::spawn(db)
    }

    #[tokio::test]
    async fn merges_reports_from_independent_contexts() {
        let temp_dir = TempDir::new().unwrap();
        let (aggregator, _task) = spawn_in(&temp_dir);

        let first_tab = aggregator.transport();
        let second_tab = aggregator.transport();
        first_tab
            .send(report("youtube.com", 1800.0, QualityTier::P480))
            .unwrap();
        second_tab
            .send(report("youtube.com", 1800.0, QualityTier::P480))
            .unwrap();
        second_tab
            .send(report("twitch.tv", 3600.0, QualityTier::P1080))
            .unwrap();

        let record = aggregator.snapshot().await.unwrap();
        assert_eq!(record.seconds_for("youtube.com"), 3600.0);
        assert_eq!(record.seconds_for("twitch.tv"), 3600.0);
        assert_eq!(record.total_co2, 250.0);
    }

    #[tokio::test]
    async fn order_of_reports_does_not_change_result() {
        let a = report("youtube.com", 7.0, QualityTier::P2160);
        let b = report("youtube.com", 4.0, QualityTier::P360);

        let forward_dir = TempDir::new().unwrap();
        let (forward, _t1) = spawn_in(&forward_dir);
        forward.transport().send(a.clone()).unwrap();
        forward.transport().send(b.clone()).unwrap();

        let backward_dir = TempDir::new().unwrap();
        let (backward, _t2) = spawn_in(&backward_dir);
        backward.transport().send(b).unwrap();
        backward.transport().send(a).unwrap();

        assert_eq!(
            forward.snapshot().await.unwrap(),
            backward.snapshot().await.unwrap()
        );
    }

    #[tokio::test]
    async fn invalid_reports_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let (aggregator, _task) = spawn_in(&temp_dir);

        let transport = aggregator.transport();
        transport.send(report("", 10.0, QualityTier::P720)).unwrap();
        transport
            .send(report("youtube.com", 0.0, QualityTier::P720))
            .unwrap();
        transport
            .send(report("youtube.com", -3.0, QualityTier::P720))
            .unwrap();

        assert_eq!(aggregator.snapshot().await.unwrap(), LedgerRecord::default());
    }

    #[tokio::test]
    async fn subscribers_see_changed_keys() {
        let temp_dir = TempDir::new().unwrap();
        let (aggregator, _task) = spawn_in(&temp_dir);
        let mut changes = aggregator.subscribe();

        aggregator
            .submit_json(
                r#"{"type":"UPDATE_CARBON","payload":{"domain":"youtube.com","duration":5,"quality":"720p"}}"#,
            )
            .unwrap();

        let change = changes.recv().await.unwrap();
        assert!(change.changed_keys.contains(&KEY_DAILY_STATS));
        assert!(change.changed_keys.contains(&KEY_TOTAL_CO2));
        assert_eq!(change.record.seconds_for("youtube.com"), 5.0);
    }

    #[tokio::test]
    async fn report_without_quality_is_billed_at_default_rate() {
        let temp_dir = TempDir::new().unwrap();
        let (aggregator, _task) = spawn_in(&temp_dir);

        aggregator
            .submit_json(r#"{"type":"UPDATE_CARBON","payload":{"domain":"youtube.com","duration":3600}}"#)
            .unwrap();
        aggregator
            .submit_json(
                r#"{"type":"UPDATE_CARBON","payload":{"domain":"youtube.com","duration":3600,"quality":null}}"#,
            )
            .unwrap();

        let record = aggregator.snapshot().await.unwrap();
        assert_eq!(record.seconds_for("youtube.com"), 7200.0);
        assert_eq!(record.total_co2, 180.0);
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let (aggregator, _task) = spawn_in(&temp_dir);

        aggregator
            .transport()
            .send(report("tiktok.com", 120.0, QualityTier::P1080))
            .unwrap();

        let once = aggregator.reset().await.unwrap();
        let twice = aggregator.reset().await.unwrap();
        assert_eq!(once, twice);
        assert!(twice.daily_stats.is_empty());
        assert_eq!(twice.total_co2, 0.0);
    }

    #[tokio::test]
    async fn transport_reports_unavailable_after_shutdown() {
        let temp_dir = TempDir::new().unwrap();
        let (aggregator, task) = spawn_in(&temp_dir);
        let transport = aggregator.transport();
        assert!(transport.is_available());

        aggregator.shutdown();
        task.await.unwrap();

        assert!(!transport.is_available());
        assert!(transport
            .send(report("youtube.com", 1.0, QualityTier::P480))
            .is_err());
    }
}
