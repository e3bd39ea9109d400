pub mod store_entry;

pub use store_entry::StoreEntry;
