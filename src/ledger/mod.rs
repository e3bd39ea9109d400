pub mod aggregator;
pub mod message;
pub mod record;
pub mod summary;

pub use aggregator::{AggregatorHandle, LedgerTransport};
pub use message::{CarbonMessage, CarbonReport, EcoUpdate};
pub use record::{DailyStats, LedgerChange, LedgerRecord};
pub use summary::{format_grams, format_watch_time, DomainUsage, EcoSummary, DAILY_TARGET_GRAMS};
