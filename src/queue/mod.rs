//! In-memory work queues shared by the worker pools.
//!
//! The pipeline uses two queues:
//! - the page queue, holding [`PageId`]s seeded once before the crawl phase
//! - the download queue, holding [`ImageDescriptor`]s produced by page workers
//!
//! Both are [`WorkQueue`]s: thread-safe FIFOs whose [`WorkQueue::try_pop`]
//! never blocks. A worker that sees `None` exits, so a pool terminates when
//! its queue drains. This is only sound because every producer for a queue
//! has stopped before that queue's consumers start.
//!
//! # Example
//!
//! ```
//! use picgrab::queue::WorkQueue;
//!
//! let queue = WorkQueue::new();
//! queue.push("first");
//! queue.push("second");
//!
//! assert_eq!(queue.try_pop(), Some("first"));
//! assert_eq!(queue.try_pop(), Some("second"));
//! assert_eq!(queue.try_pop(), None);
//! ```

mod item;

pub use item::{ImageDescriptor, PageId};

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Non-blocking multi-producer, multi-consumer FIFO.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends an item to the back of the queue.
    pub fn push(&self, item: T) {
        self.guard().push_back(item);
    }

    /// Appends every item from the iterator, preserving order.
    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.guard().extend(items);
    }

    /// Removes and returns the front item, or `None` when the queue is empty.
    ///
    /// Never waits for a producer.
    #[must_use]
    pub fn try_pop(&self) -> Option<T> {
        self.guard().pop_front()
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    // Each critical section is one VecDeque call; poisoning leaves no partial state.
    fn guard(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> FromIterator<T> for WorkQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}
