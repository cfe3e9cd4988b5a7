//! Bounded in-process message queue.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::NotificationError;
use crate::models::Notification;
use crate::notify::NotificationChannel;

/// A published message as retained by `MemoryQueue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl QueuedMessage {
    /// Decodes the payload back into the notification it carries.
    pub fn notification(&self) -> Result<Notification, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Queue holding the most recent `capacity` messages; the oldest is
/// dropped when a new message arrives at capacity.
#[derive(Debug)]
pub struct MemoryQueue {
    messages: Mutex<VecDeque<QueuedMessage>>,
    capacity: usize,
}

impl MemoryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Snapshot of retained messages, oldest first.
    pub async fn messages(&self) -> Vec<QueuedMessage> {
        self.messages.lock().await.iter().cloned().collect()
    }

    /// Removes and returns every retained message, oldest first.
    pub async fn drain(&self) -> Vec<QueuedMessage> {
        self.messages.lock().await.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl NotificationChannel for MemoryQueue {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NotificationError> {
        let mut messages = self.messages.lock().await;
        if messages.len() >= self.capacity {
            messages.pop_front();
            debug!(topic, "queue at capacity, oldest message dropped");
        }
        messages.push_back(QueuedMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
