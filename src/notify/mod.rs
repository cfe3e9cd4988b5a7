//! Notification Module
//!
//! Fire-and-forget change notifications. Operations hand a `Notification`
//! to a `Notifier`, which queues it without waiting; a background
//! dispatcher serializes queued notifications and publishes them to a
//! `NotificationChannel`.

mod queue;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::NotificationError;
use crate::models::Notification;

pub use queue::{MemoryQueue, QueuedMessage};

// == Notification Channel ==
/// Message channel that notifications are published to.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NotificationError>;
}

// == Notifier ==
/// Non-blocking handle for queuing notifications.
///
/// The dispatcher stops once every clone of the notifier is dropped and
/// the queue has drained.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Creates a notifier and the receiving end of its queue.
    ///
    /// `spawn_dispatcher` is the usual consumer; the raw receiver is useful
    /// when notifications are consumed in-process.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// Queues a notification, logging instead of failing when it cannot be queued.
    pub fn notify(&self, notification: Notification) {
        let action = notification.action();
        match self.try_notify(notification) {
            Ok(()) => debug!(action, "notification queued"),
            Err(e) => warn!(action, error = %e, "notification dropped"),
        }
    }

    /// Queues a notification without waiting for a free slot.
    pub fn try_notify(&self, notification: Notification) -> Result<(), NotificationError> {
        self.tx.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => NotificationError::QueueFull,
            TrySendError::Closed(_) => NotificationError::QueueClosed,
        })
    }
}

// == Dispatcher ==
/// Spawns the dispatcher task and returns the notifier feeding it.
///
/// # Arguments
/// * `channel` - Destination of published notifications
/// * `topic` - Topic every notification is published under
/// * `buffer` - Number of notifications that may wait for the dispatcher
pub fn spawn_dispatcher(
    channel: Arc<dyn NotificationChannel>,
    topic: impl Into<String>,
    buffer: usize,
) -> (Notifier, JoinHandle<()>) {
    let topic = topic.into();
    let (notifier, mut rx) = Notifier::channel(buffer);

    let handle = tokio::spawn(async move {
        info!("Notification dispatcher publishing to '{}'", topic);

        while let Some(notification) = rx.recv().await {
            let action = notification.action();
            let result = match serde_json::to_vec(&notification) {
                Ok(payload) => channel.publish(&topic, payload).await,
                Err(e) => Err(NotificationError::from(e)),
            };

            if let Err(e) = result {
                warn!(action, error = %e, "notification publish failed");
            }
        }

        info!("Notification dispatcher stopped");
    });

    (notifier, handle)
}
