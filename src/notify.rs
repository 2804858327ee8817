use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for booking events, per table plus one venue-wide feed.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Event>>,
    all: broadcast::Sender<Event>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            all: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Subscribe to events touching one table. Creates the channel if needed.
    pub fn subscribe(&self, table_id: Ulid) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(table_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Subscribe to every event (e.g. a confirmation-email sender).
    pub fn subscribe_all(&self) -> broadcast::Receiver<Event> {
        self.all.subscribe()
    }

    /// Send an event to the venue feed and to each listed table. No-op if nobody is listening.
    pub fn send(&self, table_ids: &[Ulid], event: &Event) {
        let _ = self.all.send(event.clone());
        for table_id in table_ids {
            if let Some(sender) = self.channels.get(table_id) {
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Remove a table's channel (e.g. when the table is removed).
    pub fn remove(&self, table_id: &Ulid) {
        self.channels.remove(table_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let tid = Ulid::new();
        let mut rx = hub.subscribe(tid);

        let event = Event::TableCreated {
            id: tid,
            capacity: 4,
        };
        hub.send(&[tid], &event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn venue_feed_sees_every_table() {
        let hub = NotifyHub::new();
        let mut all = hub.subscribe_all();
        let a = Ulid::new();
        let b = Ulid::new();
        hub.send(&[a], &Event::TableRemoved { id: a });
        hub.send(&[b], &Event::TableRemoved { id: b });

        assert_eq!(all.recv().await.unwrap(), Event::TableRemoved { id: a });
        assert_eq!(all.recv().await.unwrap(), Event::TableRemoved { id: b });
    }

    #[tokio::test]
    async fn other_tables_not_notified() {
        let hub = NotifyHub::new();
        let watched = Ulid::new();
        let mut rx = hub.subscribe(watched);
        let other = Ulid::new();
        hub.send(&[other], &Event::TableRemoved { id: other });
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        let tid = Ulid::new();
        // No subscriber, must not panic
        hub.send(&[tid], &Event::TableRemoved { id: tid });
    }
}
