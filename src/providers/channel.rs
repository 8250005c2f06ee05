//! Channel provider fed by platform Bluetooth callbacks

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::provider::Provider;
use crate::types::Notification;
use crate::{Result, TelemetryError};

/// Sending half handed to the platform Bluetooth glue.
///
/// Call [`push`](Self::push) from the characteristic value-update callback.
/// Dropping every sink ends the stream.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    tx: mpsc::Sender<Notification>,
}

impl NotificationSink {
    /// Queue a notification, waiting while the channel is full.
    pub async fn send(&self, notification: Notification) -> Result<()> {
        self.tx.send(notification).await.map_err(|_| TelemetryError::ChannelClosed)
    }

    /// Queue a notification from a synchronous callback.
    ///
    /// Fails with [`TelemetryError::Connection`] when the channel is full
    /// rather than blocking the Bluetooth stack's callback thread.
    pub fn push(&self, notification: Notification) -> Result<()> {
        self.tx.try_send(notification).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                TelemetryError::connection_failed("notification channel full, chunk dropped")
            }
            mpsc::error::TrySendError::Closed(_) => TelemetryError::ChannelClosed,
        })
    }

    /// Route a raw characteristic value update.
    pub fn push_characteristic(&self, uuid: &str, value: Vec<u8>) -> Result<()> {
        self.push(Notification::from_characteristic(uuid, value))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Provider reading from a bounded notification channel.
pub struct ChannelProvider {
    rx: mpsc::Receiver<Notification>,
    nominal_rate: f64,
}

impl ChannelProvider {
    /// Create a provider and the sink that feeds it.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, nominal_rate: f64) -> (NotificationSink, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        debug!(capacity, nominal_rate, "Notification channel created");
        (NotificationSink { tx }, Self { rx, nominal_rate })
    }
}

#[async_trait::async_trait]
impl Provider for ChannelProvider {
    async fn next_notification(&mut self) -> Result<Option<Notification>> {
        let notification = self.rx.recv().await;
        if notification.is_none() {
            debug!("All notification sinks dropped");
        } else {
            trace!("Notification dequeued");
        }
        Ok(notification)
    }

    fn nominal_rate(&self) -> f64 {
        self.nominal_rate
    }
}
