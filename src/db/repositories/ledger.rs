use anyhow::{Context, Result};
use chrono::Utc;
use log::warn;
use rusqlite::Connection;

use crate::db::connection::Database;
use crate::ledger::{CarbonReport, LedgerRecord};

use super::kv_store::{get_entry, put_entry};

pub const LEDGER_KEY: &str = "ledger";

/// Reads the ledger document. A missing record, or one that no longer has the
/// ledger shape, is treated as an empty ledger. Store errors propagate so a
/// merge never overwrites a record it could not read.
fn read_ledger(conn: &Connection) -> Result<LedgerRecord> {
    match get_entry(conn, LEDGER_KEY)? {
        Some(entry) => Ok(serde_json::from_value(entry.value).unwrap_or_else(|err| {
            warn!("Ledger record is malformed, starting from empty: {err}");
            LedgerRecord::default()
        })),
        None => Ok(LedgerRecord::default()),
    }
}

fn write_ledger(conn: &Connection, record: &LedgerRecord) -> Result<()> {
    let value = serde_json::to_value(record).context("failed to encode ledger")?;
    put_entry(conn, LEDGER_KEY, &value, Utc::now())
}

impl Database {
    pub async fn load_ledger(&self) -> Result<LedgerRecord> {
        self.execute(|conn| read_ledger(conn)).await
    }

    /// Writes an empty ledger if none exists yet. Returns the current record.
    pub async fn ensure_ledger(&self) -> Result<LedgerRecord> {
        self.execute(|conn| {
            let tx = conn.transaction()?;
            let existing = get_entry(&tx, LEDGER_KEY)?;
            let record = match existing {
                Some(_) => read_ledger(&tx)?,
                None => {
                    let record = LedgerRecord::default();
                    write_ledger(&tx, &record)?;
                    record
                }
            };
            tx.commit().context("failed to commit ledger bootstrap")?;
            Ok(record)
        })
        .await
    }

    /// Applies one report inside a single transaction. Returns the record
    /// before and after the merge.
    pub async fn merge_carbon_report(
        &self,
        report: CarbonReport,
    ) -> Result<(LedgerRecord, LedgerRecord)> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let before = read_ledger(&tx)?;
            let mut after = before.clone();
            after.merge(&report);
            write_ledger(&tx, &after)?;
            tx.commit().context("failed to commit ledger merge")?;
            Ok((before, after))
        })
        .await
    }

    pub async fn reset_ledger(&self) -> Result<(LedgerRecord, LedgerRecord)> {
        self.execute(|conn| {
            let tx = conn.transaction()?;
            let before = read_ledger(&tx).unwrap_or_else(|err| {
                warn!("Failed to read ledger before reset: {err:#}");
                LedgerRecord::default()
            });
            let after = LedgerRecord::default();
            write_ledger(&tx, &after)?;
            tx.commit().context("failed to commit ledger reset")?;
            Ok((before, after))
        })
        .await
    }
}
