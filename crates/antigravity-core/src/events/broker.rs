//! Event stream broker (C5): fan-out of new events to live subscribers.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use antigravity_types::models::Event;

/// A single SSE frame. Each variant serializes to the exact shape §6
/// prescribes: `connected` is an object, history is a bare array, a live
/// event is the event object itself — no shared envelope.
#[derive(Debug, Clone)]
pub enum Frame {
    Connected(DateTime<Utc>),
    History(Vec<Event>),
    Single(Event),
}

impl Frame {
    pub fn to_json(&self) -> serde_json::Value {
        #[derive(Serialize)]
        struct Connected<'a> {
            #[serde(rename = "type")]
            kind: &'a str,
            timestamp: DateTime<Utc>,
        }

        match self {
            Self::Connected(ts) => {
                serde_json::to_value(Connected { kind: "connected", timestamp: *ts })
                    .unwrap_or(serde_json::Value::Null)
            }
            Self::History(events) => {
                serde_json::to_value(events).unwrap_or(serde_json::Value::Array(Vec::new()))
            }
            Self::Single(event) => serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// The broker's capability over one live consumer: `write` plus
/// closed-channel liveness detection (the async equivalent of `onClose`).
#[derive(Clone)]
pub struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<Frame>,
}

/// Returned by [`Subscriber::write`] when the transport has gone away.
#[derive(Debug)]
pub struct Dead;

impl Subscriber {
    pub fn write(&self, frame: Frame) -> Result<(), Dead> {
        self.tx.send(frame).map_err(|_| Dead)
    }
}

/// Live subscriber set, guarded by its own lock. Broadcasting snapshots the
/// live senders and iterates lock-free, matching §4.5/§5.
pub struct EventBroker {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroker {
    pub fn new() -> Self {
        Self { subscribers: Mutex::new(Vec::new()), next_id: AtomicU64::new(1) }
    }

    /// Subscribe a new live consumer. Writes the one-shot `connected` frame,
    /// optionally a history batch, then joins the live set — in that order,
    /// per §4.5.
    pub fn subscribe(&self, history: Option<Vec<Event>>) -> mpsc::UnboundedReceiver<Frame> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Subscriber { id: self.next_id.fetch_add(1, Ordering::Relaxed), tx };

        let _ = subscriber.write(Frame::Connected(Utc::now()));
        if let Some(hist) = history {
            let _ = subscriber.write(Frame::History(hist));
        }

        self.subscribers.lock().push(subscriber);
        rx
    }

    /// Fan out `event` to every live subscriber as a single-event frame.
    /// Dead subscribers are reaped after the broadcast pass.
    pub fn broadcast(&self, event: Event) {
        let frame = Frame::Single(event);
        let snapshot: Vec<Subscriber> = self.subscribers.lock().clone();

        let mut dead = Vec::new();
        for sub in &snapshot {
            if sub.write(frame.clone()).is_err() {
                dead.push(sub.id);
            }
        }

        if !dead.is_empty() {
            self.subscribers.lock().retain(|s| !dead.contains(&s.id));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antigravity_types::models::{EventType, Severity};

    fn sample_event(id: u64) -> Event {
        Event {
            id,
            timestamp: Utc::now(),
            timestamp_ms: Utc::now().timestamp_millis(),
            event_type: EventType::Request,
            severity: Severity::Info,
            account: None,
            model: None,
            request_id: None,
            message: "probe".to_string(),
            details: serde_json::Value::Null,
        }
    }

    #[test]
    fn subscribe_emits_connected_then_history_in_order() {
        let broker = EventBroker::new();
        let mut rx = broker.subscribe(Some(vec![sample_event(1)]));
        assert!(matches!(rx.try_recv().unwrap(), Frame::Connected(_)));
        assert!(matches!(rx.try_recv().unwrap(), Frame::History(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_reaches_live_subscriber_in_order() {
        let broker = EventBroker::new();
        let mut rx = broker.subscribe(None);
        rx.try_recv().unwrap(); // drain connected frame

        broker.broadcast(sample_event(1));
        broker.broadcast(sample_event(2));

        let Frame::Single(first) = rx.try_recv().unwrap() else { panic!("expected single frame") };
        let Frame::Single(second) = rx.try_recv().unwrap() else { panic!("expected single frame") };
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn dropped_receiver_is_reaped_on_next_broadcast() {
        let broker = EventBroker::new();
        let rx = broker.subscribe(None);
        drop(rx);
        assert_eq!(broker.subscriber_count(), 1);
        broker.broadcast(sample_event(1));
        assert_eq!(broker.subscriber_count(), 0);
    }
}
