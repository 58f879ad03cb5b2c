// ── Priority allocation ──
//
// "Connect" means "give this network the highest saved priority and let
// the supplicant pick it." The allocator hands out strictly increasing
// priorities and learns from every priority it observes in the store,
// so it stays above values written by other clients too, as long as
// they are within the managed band.

/// Monotonic priority source for the managed band `[0, ceiling]`.
#[derive(Debug)]
pub struct PriorityAllocator {
    next: i32,
    ceiling: i32,
}

impl PriorityAllocator {
    pub fn new(ceiling: i32) -> Self {
        Self { next: 0, ceiling }
    }

    /// Highest priority handed out so far, exceeding everything
    /// observed. The counter advances even if the caller fails to
    /// persist the value.
    pub fn allocate(&mut self) -> i32 {
        let allocated = self.next;
        self.next += 1;
        allocated
    }

    /// Learn from a priority seen in the store. Values outside the
    /// managed band belong to other clients and are ignored.
    pub fn observe(&mut self, priority: i32) {
        if priority < 0 || priority > self.ceiling {
            return;
        }
        if self.next <= priority {
            self.next = priority + 1;
        }
    }

    /// Whether the next allocation would leave the managed band, i.e.
    /// saved priorities need compacting first.
    pub fn needs_compaction(&self) -> bool {
        self.next > self.ceiling
    }

    /// Restart from zero after a compaction renumbered the store.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
