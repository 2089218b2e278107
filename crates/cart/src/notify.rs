//! User-facing notifications.
//!
//! Notifications are the only feedback the shopper gets when a cart
//! operation fails. Delivery is fire-and-forget.

use tokio::sync::mpsc;

/// Fixed user-facing messages, one per failure kind.
pub mod messages {
    /// Adding a product failed (catalog or storage error).
    pub const ADD_FAILED: &str = "Erro na adição do produto";
    /// Removing a product failed (unknown id or storage error).
    pub const REMOVE_FAILED: &str = "Erro na remoção do produto";
    /// Changing a quantity failed (invalid amount, unknown id, catalog or storage error).
    pub const UPDATE_FAILED: &str = "Erro na alteração de quantidade do produto";
    /// The requested quantity exceeds the available stock.
    pub const OUT_OF_STOCK: &str = "Quantidade solicitada fora de estoque";
}

/// Capability for surfacing a message to the shopper.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that emits each message as a `warn` tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "rocketshoes_cart::notify", "{message}");
    }
}

/// Notifier that forwards messages to a channel a UI can drain.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str) {
        // Receiver gone means nobody is listening anymore.
        if self.tx.send(message.to_string()).is_err() {
            tracing::debug!(dropped = message, "Notification dropped, receiver closed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(messages::OUT_OF_STOCK);
        notifier.notify(messages::ADD_FAILED);

        assert_eq!(rx.try_recv().unwrap(), messages::OUT_OF_STOCK);
        assert_eq!(rx.try_recv().unwrap(), messages::ADD_FAILED);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        notifier.notify(messages::REMOVE_FAILED);
    }
}
