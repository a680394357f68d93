//! Event system for engine notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! We use `tokio::sync::broadcast` for the event bus: events are
//! values, every subscriber gets its own copy, and a slow subscriber
//! lags instead of blocking the reader.

use tokio::sync::broadcast;

use crate::document::DocumentId;

/// Events emitted by the command reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A command ran and was recorded (or was transient)
    CommandExecuted { name: String, document: DocumentId },
    /// An undo moved this many commands to the redo stack
    Undone { count: usize },
    /// A redo moved this many commands back
    Redone { count: usize },
    /// Dispatch failed; the user should hear about it
    Beep { reason: String },
    /// A chord prefix was typed and the reader is waiting for more keys
    PrefixPending { keys: String },
    /// The active document's selections changed
    SelectionChanged(DocumentId),
    /// A document was bound to the active mode
    DocumentBound(DocumentId),
    /// Configuration was reloaded
    ConfigChanged,
}

/// Event bus for broadcasting editor events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        // Capacity of 256 events in the buffer
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(reader.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let EditorEvent::Beep { reason } = event {
///             eprintln!("\x07{}", reason);
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<EditorEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<EditorEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next event if one is already queued.
    pub fn try_next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(EditorEvent::ConfigChanged);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, EditorEvent::ConfigChanged);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(EditorEvent::Undone { count: 3 });

        assert_eq!(rx1.recv().await.unwrap(), EditorEvent::Undone { count: 3 });
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_handler_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        bus.emit(EditorEvent::Beep {
            reason: "No binding".to_string(),
        });
        drop(bus);

        assert!(matches!(handler.next().await, Some(EditorEvent::Beep { .. })));
        assert!(handler.next().await.is_none());
    }

    #[test]
    fn test_try_next() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        assert!(handler.try_next().is_none());
        bus.emit(EditorEvent::ConfigChanged);
        assert_eq!(handler.try_next(), Some(EditorEvent::ConfigChanged));
    }
}
