//! Event bus routing helpers.

use crate::error::{EventBusError, EventBusResult};
use crate::payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::warn;

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    replay: Arc<Mutex<VecDeque<EventEnvelope>>>,
    replay_capacity: usize,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Construct a bus with a custom replay capacity.
    ///
    /// A zero capacity is bumped to one because `tokio::broadcast` rejects empty channels.
    #[must_use]
    pub fn with_capacity(replay_capacity: usize) -> Self {
        let replay_capacity = replay_capacity.max(1);
        let (sender, _) = broadcast::channel(replay_capacity);
        Self {
            sender,
            replay: Arc::new(Mutex::new(VecDeque::with_capacity(replay_capacity))),
            replay_capacity,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Construct a bus with the default replay capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Subscribe to the bus, replaying buffered events newer than `last_event_id`.
    #[must_use]
    pub fn subscribe(&self, last_event_id: Option<EventId>) -> EventStream {
        let receiver = self.sender.subscribe();
        let backlog: VecDeque<EventEnvelope> = last_event_id
            .map(|since| self.backlog_since(since).into())
            .unwrap_or_default();
        let replayed_through = backlog.back().map(|env| env.id);
        EventStream {
            backlog,
            receiver,
            replayed_through,
            dropped: 0,
        }
    }

    /// Publish a new event to all subscribers and record it in the replay ring.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::NoSubscribers`] when nobody is listening. The
    /// event is still recorded and can be replayed later.
    pub fn publish(&self, event: Event) -> EventBusResult<EventId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let event_kind = event.kind();
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };
        {
            let mut replay = self.lock_replay();
            if replay.len() == self.replay_capacity {
                let _ = replay.pop_front();
            }
            replay.push_back(envelope.clone());
        }
        self.sender
            .send(envelope)
            .map(|_| id)
            .map_err(|_| EventBusError::NoSubscribers {
                event_id: id,
                event_kind,
            })
    }

    /// Last event id observed in the replay buffer.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.lock_replay().back().map(|env| env.id)
    }

    /// Collect a backlog of events emitted after the specified id.
    #[must_use]
    pub fn backlog_since(&self, id: EventId) -> Vec<EventEnvelope> {
        let replay = self.lock_replay();
        replay.iter().filter(|env| env.id > id).cloned().collect()
    }

    fn lock_replay(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.replay
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream wrapper that yields events from the replay backlog first, then from
/// the live broadcast channel.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
    replayed_through: Option<EventId>,
    dropped: u64,
}

impl EventStream {
    /// Receive the next event. Returns `None` once every bus handle is dropped.
    ///
    /// Events lost to lag are skipped with a warning; the stream resumes with
    /// the oldest event still buffered and [`Self::dropped`] grows by the gap.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(envelope) = self.backlog.pop_front() {
            return Some(envelope);
        }

        loop {
            match self.receiver.recv().await {
                Ok(envelope) => {
                    if self
                        .replayed_through
                        .is_some_and(|replayed| envelope.id <= replayed)
                    {
                        continue;
                    }
                    return Some(envelope);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.dropped = self.dropped.saturating_add(skipped);
                    warn!(skipped, "event stream lagged; events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Number of events this stream skipped because it fell behind the bus.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}
