use std::collections::{BinaryHeap, HashMap};
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::storage::engine::MemoryBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlEvent {
    pub key: String,
    pub expires_at: Instant,
}

// For min-heap (earliest expiry first)
impl Ord for TtlEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse because BinaryHeap is max-heap
        other
            .expires_at
            .cmp(&self.expires_at)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for TtlEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy)]
struct Schedule {
    deadline: Instant,
    queued_at: Instant,
}

#[derive(Debug, Default)]
struct Queue {
    heap: BinaryHeap<TtlEvent>,
    schedules: HashMap<String, Schedule>,
}

impl Queue {
    fn push(&mut self, key: String, at: Instant) {
        self.heap.push(TtlEvent { key, expires_at: at });
    }

    // Drops events that no longer match their key's schedule.
    fn compact(&mut self) {
        let heap = self
            .schedules
            .iter()
            .map(|(key, schedule)| TtlEvent {
                key: key.clone(),
                expires_at: schedule.queued_at,
            })
            .collect();
        self.heap = heap;
    }
}

/// Deadlines registered by `expire`, at most one queued event per key.
/// Extending a deadline only updates the schedule; the event is re-queued
/// at the new deadline when the old one comes due.
#[derive(Debug, Default)]
pub struct TtlManager {
    queue: Mutex<Queue>,
}

impl TtlManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, key: String, expires_at: Instant) {
        let mut queue = self.queue.lock();
        match queue.schedules.get_mut(&key) {
            Some(schedule) => {
                schedule.deadline = expires_at;
                if expires_at < schedule.queued_at {
                    schedule.queued_at = expires_at;
                    queue.push(key, expires_at);
                }
            }
            None => {
                queue.schedules.insert(
                    key.clone(),
                    Schedule {
                        deadline: expires_at,
                        queued_at: expires_at,
                    },
                );
                queue.push(key, expires_at);
            }
        }

        if queue.heap.len() > queue.schedules.len() * 2 {
            queue.compact();
        }
    }

    /// Forgets the deadline of a deleted key.
    pub fn cancel(&self, key: &str) {
        self.queue.lock().schedules.remove(key);
    }

    pub fn pop_due(&self, now: Instant) -> Vec<String> {
        let mut due = Vec::new();
        let mut queue = self.queue.lock();
        while queue.heap.peek().map_or(false, |event| event.expires_at <= now) {
            let Some(event) = queue.heap.pop() else {
                break;
            };
            let Some(schedule) = queue.schedules.get(&event.key).copied() else {
                continue;
            };
            if schedule.queued_at != event.expires_at {
                continue;
            }
            if schedule.deadline > now {
                if let Some(live) = queue.schedules.get_mut(&event.key) {
                    live.queued_at = schedule.deadline;
                }
                queue.push(event.key, schedule.deadline);
            } else {
                queue.schedules.remove(&event.key);
                due.push(event.key);
            }
        }
        due
    }

    /// Queued events, stale ones included.
    pub fn pending(&self) -> usize {
        self.queue.lock().heap.len()
    }
}

/// Periodically reaps expired keys. The task ends once the backend is dropped.
pub fn start_background_task(engine: Weak<MemoryBackend>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(engine) = engine.upgrade() else {
                tracing::debug!("Memory backend dropped, stopping expiry sweeper");
                break;
            };

            let reaped = engine.sweep_expired();
            if reaped > 0 {
                tracing::debug!(reaped, "Reaped expired keys");
            }
        }
    })
}
