//! # Notifier
//!
//! Alert delivery, off the frame loop.
//!
//! - `NotifierHandle`: bounded queue + worker task in front of a channel
//! - Channels: log output, Telegram Bot API
//! - `SubscriberStore`: Telegram chat ids persisted as JSON

pub mod channels;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod store;

pub use channels::{AnyChannel, LogChannel, TelegramChannel};
pub use error::{NotifierError, NotifierResult};
pub use handle::{AlertSender, NotifierHandle};
pub use metrics::{NotifierMetrics, NotifierSnapshot};
pub use store::SubscriberStore;
