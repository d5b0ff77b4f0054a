use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use super::websocket::OverlayEvent;
use crate::backend::render::RenderedMessage;

pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

struct BufferState {
    messages: VecDeque<RenderedMessage>,
    /// Scheduled removals by message id
    pending: HashMap<u64, JoinHandle<()>>,
}

/// Bounded, insertion-ordered list of displayed messages.
///
/// Appending past `max_messages` marks the oldest unmarked message and
/// removes it after the grace period, giving the overlay time to play an exit
/// animation. The bound therefore holds once pending removals have fired,
/// not at every instant.
#[derive(Clone)]
pub struct OverlayBuffer {
    state: Arc<Mutex<BufferState>>,
    max_messages: usize,
    grace: Duration,
    events: broadcast::Sender<OverlayEvent>,
}

impl OverlayBuffer {
    pub fn new(max_messages: usize, grace: Duration, events: broadcast::Sender<OverlayEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState {
                messages: VecDeque::new(),
                pending: HashMap::new(),
            })),
            max_messages,
            grace,
            events,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub async fn append(&self, message: RenderedMessage) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        state.messages.push_back(message.clone());
        self.publish(OverlayEvent::MessageAdded { message });

        if state.messages.len() <= self.max_messages {
            return;
        }

        let victim = state
            .messages
            .iter()
            .map(|m| m.id)
            .find(|id| !state.pending.contains_key(id));

        if let Some(id) = victim {
            log::debug!("Evicting message {} in {:?}", id, self.grace);
            self.publish(OverlayEvent::MessageEvicting { id });

            let buffer = self.clone();
            let grace = self.grace;
            let handle = tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                buffer.remove(id).await;
            });
            state.pending.insert(id, handle);
        }
    }

    /// Remove a message now. Returns false if it was already gone.
    pub async fn remove(&self, id: u64) -> bool {
        let mut state = self.state.lock().await;
        // Dropping the handle detaches it; this may be the task calling us
        state.pending.remove(&id);

        match state.messages.iter().position(|m| m.id == id) {
            Some(index) => {
                state.messages.remove(index);
                self.publish(OverlayEvent::MessageRemoved { id });
                true
            }
            None => false,
        }
    }

    /// Cancel a scheduled removal; the message stays. Idempotent.
    pub async fn cancel_eviction(&self, id: u64) -> bool {
        match self.state.lock().await.pending.remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending removal
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let count = state.pending.len();
        for (_, handle) in state.pending.drain() {
            handle.abort();
        }
        if count > 0 {
            log::info!("Cancelled {} pending evictions", count);
        }
    }

    pub async fn snapshot(&self) -> Vec<RenderedMessage> {
        self.state.lock().await.messages.iter().cloned().collect()
    }

    /// Current messages and a receiver for every change after them.
    ///
    /// Both are taken under the buffer lock, so no append lands in both.
    pub async fn snapshot_and_subscribe(&self) -> (Vec<RenderedMessage>, broadcast::Receiver<OverlayEvent>) {
        let state = self.state.lock().await;
        (state.messages.iter().cloned().collect(), self.events.subscribe())
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn pending_evictions(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    fn publish(&self, event: OverlayEvent) {
        // No receivers just means no overlay is open
        let _ = self.events.send(event);
    }
}
