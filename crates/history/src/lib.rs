pub mod store;

pub use store::{HistoryStore, HISTORY_COLUMNS};
