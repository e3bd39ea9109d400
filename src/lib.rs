pub mod carbon;
pub mod config;
pub mod db;
pub mod ledger;
pub mod quality;
pub mod settings;
pub mod tracking;
pub mod utils;

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use tokio::task::JoinHandle;

pub use carbon::{EcosystemStatus, HealthView, RecoverySession};
pub use config::TrackerConfig;
pub use db::Database;
pub use ledger::{AggregatorHandle, CarbonMessage, CarbonReport, EcoSummary, LedgerRecord};
pub use quality::{classify, QualityTier};
pub use settings::{OverlaySettings, SettingsStore};
pub use tracking::{TrackedDomains, TrackerController};
pub use utils::init_logging;

/// Long-lived host process: owns the store, the ledger aggregator and the
/// overlay settings. Tracking contexts and presentation surfaces attach to it.
pub struct EcoShield {
    pub db: Database,
    pub aggregator: AggregatorHandle,
    pub settings: SettingsStore,
    pub config: TrackerConfig,
    aggregator_task: JoinHandle<()>,
}

impl EcoShield {
    /// Opens (or creates) the data directory and starts the aggregator.
    /// Must be called from within a tokio runtime.
    pub fn bootstrap(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).with_context(|| {
            format!("failed to create data directory {}", data_dir.display())
        })?;

        let db = Database::new(data_dir.join("ecoshield.sqlite3"))?;
        let (aggregator, aggregator_task) = AggregatorHandle::spawn(db.clone());
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;

        info!("EcoShield started with data in {}", data_dir.display());

        Ok(Self {
            db,
            aggregator,
            settings,
            config: TrackerConfig::from_env(),
            aggregator_task,
        })
    }

    /// A controller for one page context, reporting into this host's ledger.
    pub fn tracker(&self, tracked: TrackedDomains) -> TrackerController {
        TrackerController::new(self.config.clone(), tracked)
    }

    /// Current ledger rendered for a surface with its own health view.
    pub async fn summary(&self, view: &mut HealthView) -> Result<EcoSummary> {
        let record = self.aggregator.snapshot().await?;
        view.observe_total(record.total_co2);
        Ok(EcoSummary::build(&record, view))
    }

    pub async fn shutdown(self) -> Result<()> {
        self.aggregator.shutdown();
        self.aggregator_task
            .await
            .context("ledger aggregator task failed to join")?;
        Ok(())
    }
}
