//! Per-group simulation state and the double-buffered event queue
//! (`spec.md` §4.C).
//!
//! Both the serial and parallel execution modes share this layout. The
//! fields are relaxed atomics even in serial mode — on a single thread
//! that costs nothing observable, and it means [`crate::tick::Mode`] only
//! has to decide *how many threads* drain the frontier, not *what* the
//! shared state looks like, mirroring how the teacher's own `ExternalBus`/
//! `VramBus` split keeps one bus layout regardless of which device drives
//! it (`examples/ajoneil-missingno/core/src/game_boy/memory.rs`).

use std::sync::atomic::{AtomicI16, AtomicI32, AtomicU8, AtomicUsize, Ordering};

/// One group's simulation state: `spec.md` §3 `InkState`.
pub struct GroupCell {
    /// Number of predecessor groups currently driving this group high.
    pub active_inputs: AtomicI16,
    /// Set while this group is enqueued in the write-side buffer for the
    /// current tick; guarantees at-most-one enqueue per group per tick.
    pub visited: AtomicU8,
    /// Packed `Ink` byte (kind + on/off bit), `Ink::to_byte`/`from_byte`.
    pub ink: AtomicU8,
}

impl GroupCell {
    pub fn new(ink_byte: u8) -> GroupCell {
        GroupCell {
            active_inputs: AtomicI16::new(0),
            visited: AtomicU8::new(0),
            ink: AtomicU8::new(ink_byte),
        }
    }
}

/// Two equally sized index buffers plus a write cursor, `spec.md` §3
/// `updateQ`/`qSize`. At the start of a tick one buffer is the frontier
/// (read side); evaluation appends to the other (write side); the roles
/// swap at the end of the tick.
pub struct EventQueue {
    buffers: [Vec<AtomicI32>; 2],
    write_side: AtomicUsize,
    write_len: AtomicUsize,
    /// Length of the current read-side frontier. Only ever written by
    /// [`EventQueue::swap`] and read by [`EventQueue::frontier`], both
    /// called from the single-threaded tick driver between parallel
    /// drain phases — never concurrently, so a plain `usize` is enough.
    read_len: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> EventQueue {
        EventQueue {
            buffers: [
                (0..capacity).map(|_| AtomicI32::new(-1)).collect(),
                (0..capacity).map(|_| AtomicI32::new(-1)).collect(),
            ],
            write_side: AtomicUsize::new(1),
            write_len: AtomicUsize::new(0),
            read_len: 0,
        }
    }

    fn read_side(&self) -> usize {
        1 - self.write_side.load(Ordering::Acquire)
    }

    /// Appends `gid` to the write-side buffer at a fresh slot. Safe to
    /// call from multiple threads concurrently: the fetch-add hands out
    /// disjoint slots.
    fn push_write(&self, gid: i32) {
        let idx = self.write_len.fetch_add(1, Ordering::Relaxed);
        self.buffers[self.write_side.load(Ordering::Relaxed)][idx].store(gid, Ordering::Relaxed);
    }

    /// Seeds the initial frontier before the first tick (`spec.md` §4.B
    /// step 5: gates that are active with no inputs start enqueued).
    pub fn seed(&mut self, gids: impl IntoIterator<Item = i32>) {
        for gid in gids {
            self.push_write(gid);
        }
        self.swap();
    }

    /// Injects `gid` directly into the *current* read-side frontier,
    /// guarded by the same `visited` CAS as [`try_emit`]. For a host
    /// driving a source group (`Write`/`Clock`) externally between ticks,
    /// so the change is visible in the very next `tick()` call rather
    /// than one swap later. Only safe to call between ticks, never while
    /// a tick is draining the frontier.
    pub fn inject_if_unvisited(&mut self, cell: &GroupCell, gid: i32) -> bool {
        if cell
            .visited
            .compare_exchange(0, 1, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        let side = self.read_side();
        self.buffers[side][self.read_len].store(gid, Ordering::Relaxed);
        self.read_len += 1;
        true
    }

    /// The current frontier: the read-side contents up to its length.
    pub fn frontier(&self) -> Vec<i32> {
        let side = self.read_side();
        self.buffers[side][..self.read_len]
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }

    pub fn frontier_len(&self) -> usize {
        self.read_len
    }

    /// Swaps read/write sides: the write side becomes the new frontier,
    /// its length is latched, and the (old) read side resets to become
    /// the next write side.
    pub fn swap(&mut self) {
        self.read_len = self.write_len.load(Ordering::Acquire);
        self.write_side.store(self.read_side(), Ordering::Release);
        self.write_len.store(0, Ordering::Relaxed);
    }
}

/// At-most-once enqueue primitive, `spec.md` §4.C `tryEmit`.
///
/// Under parallel mode the visited flag is a compare-and-swap and the
/// queue index a fetch-add; under serial mode these are the same atomics,
/// just never contended. Returns `true` if this call performed the
/// enqueue (i.e. this group was not already pending this tick).
pub fn try_emit(cell: &GroupCell, queue: &EventQueue, gid: i32) -> bool {
    if cell
        .visited
        .compare_exchange(0, 1, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        queue.push_write(gid);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_emit_is_at_most_once_per_tick() {
        let cell = GroupCell::new(0);
        let mut queue = EventQueue::new(4);
        queue.swap(); // make buffer 0 the write side for this test

        assert!(try_emit(&cell, &queue, 7));
        assert!(!try_emit(&cell, &queue, 7));
        queue.swap();
        assert_eq!(queue.frontier(), vec![7]);
    }

    #[test]
    fn visited_clears_across_ticks() {
        let cell = GroupCell::new(0);
        let mut queue = EventQueue::new(4);
        queue.swap();
        assert!(try_emit(&cell, &queue, 3));
        cell.visited.store(0, Ordering::Relaxed);
        queue.swap();
        assert!(try_emit(&cell, &queue, 3));
    }
}
