mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use models::StoreEntry;
pub use repositories::ledger::LEDGER_KEY;
