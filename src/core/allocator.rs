//! Monotonic identifier allocation backed by a persisted singleton.

use serde::{Deserialize, Serialize};

use crate::types::{FIRST_REQUEST_ID, RequestId};

/// Persisted allocator state. The backing store holds exactly one instance;
/// finding more than one on load is fatal corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorState {
    /// Next identifier to hand out.
    pub next_id: RequestId,
}

/// In-memory identifier source.
///
/// Callers persist [`AllocatorState`] for `peek() + 1` before treating the
/// peeked id as allocated, so a restart resumes past every id ever handed
/// out. Ids allocated for records that were never stored stay as gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next: RequestId,
}

impl IdAllocator {
    /// Fresh allocator starting at [`FIRST_REQUEST_ID`].
    pub fn new() -> Self {
        Self {
            next: FIRST_REQUEST_ID,
        }
    }

    /// Resumes from a persisted state.
    pub fn resume(state: AllocatorState) -> Self {
        Self {
            next: state.next_id.max(FIRST_REQUEST_ID),
        }
    }

    /// Id the next call to [`IdAllocator::advance`] will return.
    pub fn peek(&self) -> RequestId {
        self.next
    }

    /// Hands out the next id.
    pub fn advance(&mut self) -> RequestId {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }

    /// Moves past `id` if it is at or ahead of the cursor. Used when
    /// recovering records and when callers supply pre-allocated ids.
    pub fn observe(&mut self, id: RequestId) {
        self.next = self.next.max(id.saturating_add(1));
    }

    /// Snapshot of the current state for persistence.
    pub fn state(&self) -> AllocatorState {
        AllocatorState { next_id: self.next }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
