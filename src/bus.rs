use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;

use crate::errors::TransportError;
use crate::protocol::SwarmMessage;

/// Publish/subscribe transport between agents.
///
/// Delivery semantics every implementation must honor: at-most-once, no
/// buffering before subscription, no persistence. A message published to
/// a channel with zero subscribers is dropped silently; the bus is an
/// ephemeral signaling fabric, not a durable log. Every subscriber to a
/// channel receives its own copy of each message (fan-out), and within
/// one channel a subscriber sees messages in publish order.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a message to a channel.
    async fn publish(&self, channel: &str, message: SwarmMessage) -> Result<(), TransportError>;

    /// Open a lazy, unbounded stream of messages published to `channel`
    /// from this moment on. Not restartable.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, TransportError>;

    /// Release all transport resources. Every open subscription ends.
    async fn close(&self);
}

/// A live subscription to one channel. Dropping it unsubscribes.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SwarmMessage>,
}

impl Subscription {
    /// Next message, or `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<SwarmMessage> {
        self.rx.recv().await
    }

    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<SwarmMessage> {
        self.rx.try_recv().ok()
    }
}

#[derive(Default)]
struct Registry {
    closed: bool,
    channels: HashMap<String, Vec<mpsc::UnboundedSender<SwarmMessage>>>,
}

/// In-process bus: per-channel lists of unbounded mpsc senders, one per
/// subscriber. The registry lock is only ever held to clone senders,
/// never across an await.
#[derive(Default)]
pub struct InProcessBus {
    registry: Mutex<Registry>,
}

impl InProcessBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBus for InProcessBus {
    async fn publish(&self, channel: &str, message: SwarmMessage) -> Result<(), TransportError> {
        let mut registry = self.registry.lock().await;
        if registry.closed {
            return Err(TransportError::Closed);
        }
        let Some(senders) = registry.channels.get_mut(channel) else {
            trace!(channel, "no subscribers, message dropped");
            return Ok(());
        };
        // Prune subscribers that went away; a failed send means the
        // receiving half was dropped.
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        trace!(channel, subscribers = senders.len(), "message delivered");
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, TransportError> {
        let mut registry = self.registry.lock().await;
        if registry.closed {
            return Err(TransportError::Closed);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        registry.channels.entry(channel.to_string()).or_default().push(tx);
        Ok(Subscription { rx })
    }

    async fn close(&self) {
        let mut registry = self.registry.lock().await;
        registry.closed = true;
        // Dropping every sender terminates every subscriber stream.
        registry.channels.clear();
    }
}
