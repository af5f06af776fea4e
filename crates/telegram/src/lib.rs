pub mod notifier;

pub use notifier::{report_message, TelegramNotifier};
