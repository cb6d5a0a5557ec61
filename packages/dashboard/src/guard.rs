//! Stale-response guard.
//!
//! Every selection takes a [`Ticket`] from a monotonically increasing
//! generation counter. A result may be published only while its ticket is
//! still the latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};

/// Proof of which selection a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// Generation number of this ticket.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// Hands out tickets and answers whether a ticket is still current.
#[derive(Debug, Default)]
pub struct SelectionGuard {
    generation: AtomicU64,
}

impl SelectionGuard {
    /// Creates a guard with no selection issued yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    /// Starts a new selection, invalidating every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` belongs to the most recent selection.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_invalidates_older() {
        let guard = SelectionGuard::new();
        let a = guard.begin();
        assert!(guard.is_current(a));

        let b = guard.begin();
        assert!(b > a);
        assert!(!guard.is_current(a));
        assert!(guard.is_current(b));
        assert_eq!(b.generation(), 2);
    }
}
