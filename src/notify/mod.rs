//! Rendering and delivery of surebet alerts.

pub mod format;
pub mod telegram;

pub use format::{format_opportunities, format_opportunity, no_data_message};
pub use telegram::TelegramNotifier;
