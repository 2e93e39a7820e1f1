use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

/// Bounded FIFO that drops its oldest element on overflow.
///
/// Producers never wait: the chain subscription must not be backpressured,
/// and stale entries are worth less than fresh ones. Consumers await
/// elements in publication order.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "queue capacity must be positive");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Enqueue an element, discarding the oldest one if the queue is full.
    pub async fn publish(&self, item: T) {
        {
            let mut items = self.items.lock().await;
            if items.len() == self.capacity {
                items.pop_front();
            }
            items.push_back(item);
        }
        self.notify.notify_one();
    }

    /// Await the next element in FIFO order. Cancellation-safe: a dropped
    /// `recv` future never loses an element.
    pub async fn recv(&self) -> T {
        loop {
            if let Some(item) = self.items.lock().await.pop_front() {
                return item;
            }
            self.notify.notified().await;
        }
    }

    /// Take the next element if one is immediately available.
    pub async fn try_recv(&self) -> Option<T> {
        self.items.lock().await.pop_front()
    }

    /// Current backlog, for observability.
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}
