// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Blocking FIFO shared between the application and one worker
//!
//! Each queue owns its own lock and condition variable. Producers never
//! block; consumers sleep on the condition variable until an item arrives or
//! the queue is closed.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::common::{TransportError, TransportResult};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Thread-safe FIFO with close semantics
///
/// Once closed, `push` fails with [`TransportError::Closed`] while already
/// queued items stay readable through [`MessageQueue::pop`] and
/// [`MessageQueue::snapshot`].
pub struct MessageQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
    capacity: Option<usize>,
}

impl<T> MessageQueue<T> {
    /// Create a queue, bounded when `capacity` is set
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Create an unbounded queue
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Append to the tail without blocking
    pub fn push(&self, item: T) -> TransportResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if let Some(capacity) = self.capacity {
            if state.items.len() >= capacity {
                return Err(TransportError::QueueFull { capacity });
            }
        }
        state.items.push_back(item);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Remove the head, blocking while the queue is empty
    ///
    /// Drains remaining items after close, then returns `Closed`.
    pub fn pop(&self) -> TransportResult<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(TransportError::Closed);
            }
            self.available.wait(&mut state);
        }
    }

    /// Like [`MessageQueue::pop`], giving up with `Timeout` after `timeout`
    ///
    /// A timeout too large to represent as a deadline waits indefinitely.
    pub fn pop_timeout(&self, timeout: Duration) -> TransportResult<T> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.pop();
        };
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(TransportError::Closed);
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return match state.items.pop_front() {
                    Some(item) => Ok(item),
                    None if state.closed => Err(TransportError::Closed),
                    None => Err(TransportError::Timeout),
                };
            }
        }
    }

    /// Remove the head if there is one
    pub fn try_pop(&self) -> TransportResult<Option<T>> {
        let mut state = self.state.lock();
        match state.items.pop_front() {
            Some(item) => Ok(Some(item)),
            None if state.closed => Err(TransportError::Closed),
            None => Ok(None),
        }
    }

    /// Remove the head after a successful [`MessageQueue::peek_wait`]
    pub fn commit_front(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Refuse further pushes and wake every waiter
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

impl<T: Clone> MessageQueue<T> {
    /// Block until the queue has a head and return a copy, leaving it queued
    ///
    /// Returns `Closed` as soon as the queue is closed, even with items left:
    /// the consumer is being stopped and the leftovers stay inspectable.
    pub fn peek_wait(&self) -> TransportResult<T> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(TransportError::Closed);
            }
            if let Some(front) = state.items.front() {
                return Ok(front.clone());
            }
            self.available.wait(&mut state);
        }
    }

    /// Copy of the queued items, head first
    pub fn snapshot(&self) -> Vec<T> {
        self.state.lock().items.iter().cloned().collect()
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}
