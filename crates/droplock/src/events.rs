//! # Host Event Bus
//!
//! Everything that can start a cycle arrives here as a `HostEvent`.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │  stdin /    │─────>│   Event     │─────>│  MapServer  │
//! │  operators  │      │   Channel   │      │ (one thread)│
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Any number of producers, exactly one consumer: the server drains events
//! one at a time, so no two reload cycles ever overlap.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Events delivered to the map server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// Databases are loaded; the server is going online.
    ServerOnline,
    /// An operator typed an @command.
    Command {
        /// Who issued it (for the log).
        requester: String,
        /// The raw line, e.g. `@reloadlockeddrops`.
        line: String,
    },
    /// The server is stopping.
    Shutdown,
}

/// Bounded event channel.
pub struct EventBus {
    /// Sender end - held by event producers.
    sender: Sender<HostEvent>,
    /// Receiver end - held by the server loop.
    receiver: Receiver<HostEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before producers block.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates the receiver handle for the server loop.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<HostEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the channel is full or the server is gone.
    #[inline]
    pub fn send(&self, event: HostEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }

    /// Sends an event, waiting for room.
    ///
    /// Returns `false` if the server is gone.
    #[inline]
    pub fn send_blocking(&self, event: HostEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Handle for receiving events.
pub struct EventReceiver {
    receiver: Receiver<HostEvent>,
}

impl EventReceiver {
    /// Waits for the next event. `None` once every sender is gone.
    #[inline]
    pub fn recv(&self) -> Option<HostEvent> {
        self.receiver.recv().ok()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<HostEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receives all pending events (non-blocking).
    pub fn drain(&self) -> Vec<HostEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> HostEvent {
        HostEvent::Command {
            requester: "console".to_string(),
            line: line.to_string(),
        }
    }

    #[test]
    fn test_events_arrive_in_order() {
        let bus = EventBus::new(8);
        let sender = bus.sender();
        let receiver = bus.receiver();

        assert!(sender.send(HostEvent::ServerOnline));
        assert!(sender.send(command("@reloadlockeddrops")));
        assert!(sender.send_blocking(HostEvent::Shutdown));
        assert_eq!(receiver.pending_count(), 3);

        assert_eq!(
            receiver.drain(),
            vec![
                HostEvent::ServerOnline,
                command("@reloadlockeddrops"),
                HostEvent::Shutdown,
            ]
        );
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_full_channel_rejects() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        assert!(sender.send(HostEvent::ServerOnline));
        assert!(!sender.send(HostEvent::Shutdown));
    }

    #[test]
    fn test_producer_thread() {
        let bus = EventBus::new(4);
        let sender = bus.sender();
        let receiver = bus.receiver();

        let producer = std::thread::spawn(move || {
            for i in 0..10 {
                sender.send_blocking(command(&format!("@line{i}")));
            }
        });

        let mut received = 0;
        while received < 10 {
            if receiver.recv().is_some() {
                received += 1;
            }
        }
        producer.join().unwrap();
        assert_eq!(received, 10);
    }
}
