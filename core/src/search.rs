//! Ordering guard for overlapping searches.
//!
//! Two list requests issued in quick succession may resolve out of order.
//! Each request takes a ticket before it is sent; when its response arrives it
//! is applied only if no newer ticket has been issued since.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LatestOnly {
    latest: AtomicU64,
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether the response for `ticket` is still the newest one wanted.
    pub fn accept(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Run `fetch` under a fresh ticket and return its result only if it is
    /// still current when `fetch` returns.
    pub fn run<R>(&self, fetch: impl FnOnce() -> R) -> Option<R> {
        let ticket = self.issue();
        let result = fetch();
        self.accept(ticket).then_some(result)
    }
}
