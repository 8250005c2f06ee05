//! Notification providers

pub mod channel;
pub mod replay;

pub use channel::{ChannelProvider, NotificationSink};
pub use replay::{ReplayProvider, parse_capture};
