//! The event-driven tick engine, `spec.md` §4.D.
//!
//! Evaluation branches once per group per tick on its [`Ink`] kind
//! (`spec.md` §9: "model groups as a tagged kind plus a shared state
//! record"); the serial/parallel split lives entirely in how the
//! frontier is drained, mirroring how `original_source/openVCB.h` keeps
//! one `tick()` body and only switches `tryEmit`'s atomics under
//! `#ifdef OVCB_MT`.

use std::sync::atomic::{AtomicI16, AtomicU16, Ordering};

use crate::ink::Ink;
use crate::preprocess::adjacency::SparseMat;
use crate::state::{try_emit, EventQueue, GroupCell};

/// Adjusts every successor of `idx` by `±1` and tries to enqueue it onto the
/// write-side buffer, for a group whose bit changed while `drain` is
/// already running (the successor becomes visible on the *next* tick, once
/// the buffers swap).
pub fn propagate(adjacency: &SparseMat, groups: &[GroupCell], queue: &EventQueue, idx: usize, new_on: bool) {
    let delta: i16 = if new_on { 1 } else { -1 };
    for &successor in adjacency.successors(idx) {
        groups[successor as usize]
            .active_inputs
            .fetch_add(delta, Ordering::Relaxed);
        try_emit(&groups[successor as usize], queue, successor);
    }
}

/// Same successor update as [`propagate`], for a bit flipped between ticks
/// by `crate::latch`'s toggle/write rather than by `drain`. Injects
/// directly into the *current* read-side frontier (`EventQueue::
/// inject_if_unvisited`) so the change is visible on the very next `tick()`
/// call instead of one swap later — there is no in-flight `drain` here to
/// hand the update to.
pub fn propagate_between_ticks(
    adjacency: &SparseMat,
    groups: &[GroupCell],
    queue: &mut EventQueue,
    idx: usize,
    new_on: bool,
) {
    let delta: i16 = if new_on { 1 } else { -1 };
    for &successor in adjacency.successors(idx) {
        groups[successor as usize]
            .active_inputs
            .fetch_add(delta, Ordering::Relaxed);
        queue.inject_if_unvisited(&groups[successor as usize], successor);
    }
}

/// Selects how the frontier is drained each tick. `Serial` never spawns a
/// thread; `Parallel` splits the frontier into `thread_count` chunks and
/// drains them with `std::thread::scope` (`spec.md` §5).
pub trait Mode {
    fn drain(frontier: &[i32], eval: impl Fn(i32) + Sync);
}

/// Single-threaded cooperative draining. No operation on a tick is safe
/// from another thread while it runs (`spec.md` §5).
pub struct Serial;

impl Mode for Serial {
    fn drain(frontier: &[i32], eval: impl Fn(i32) + Sync) {
        for &g in frontier {
            eval(g);
        }
    }
}

/// Cooperative parallel draining over a fixed thread count. Successor
/// updates use the same relaxed atomics as serial mode; correctness
/// relies only on `tryEmit`'s CAS and the barrier implied by
/// `thread::scope` returning before the next tick begins (`spec.md` §5).
pub struct Parallel;

impl Parallel {
    /// Thread count is read from the environment-independent default of
    /// `std::thread::available_parallelism`, falling back to 1.
    fn thread_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl Mode for Parallel {
    fn drain(frontier: &[i32], eval: impl Fn(i32) + Sync) {
        if frontier.is_empty() {
            return;
        }
        let chunk_size = frontier.len().div_ceil(Self::thread_count()).max(1);
        std::thread::scope(|scope| {
            for chunk in frontier.chunks(chunk_size) {
                let eval = &eval;
                scope.spawn(move || {
                    for &g in chunk {
                        eval(g);
                    }
                });
            }
        });
    }
}

/// Per-group data the tick engine needs beyond [`GroupCell`]: the static
/// graph shape plus a little extra state for kinds whose evaluation looks
/// past a single `activeInputs` read.
pub struct TickEngine {
    adjacency: SparseMat,
    in_degree: Vec<i32>,
    /// `activeInputs` as last observed by this group's own evaluation —
    /// used only by `Latch` to detect a rising edge (`spec.md` §4.D).
    last_active_inputs: Vec<AtomicI16>,
    /// Half-period in ticks of each `Clock` group; 0 for non-clocks.
    clock_half_period: Vec<u16>,
    /// Ticks elapsed since this clock last flipped.
    clock_phase: Vec<AtomicU16>,
    events_processed: u64,
}

/// Outcome of a `tick` call (`spec.md` §4.D step 3, §7 "budget exceeded
/// is not an error").
pub struct TickReport {
    pub ticks_completed: u32,
    pub events_processed: u64,
}

impl TickEngine {
    pub fn new(
        adjacency: SparseMat,
        in_degree: Vec<i32>,
        clock_half_period: Vec<u16>,
    ) -> TickEngine {
        let n = adjacency.n;
        TickEngine {
            adjacency,
            in_degree,
            last_active_inputs: (0..n).map(|_| AtomicI16::new(0)).collect(),
            clock_phase: (0..n).map(|_| AtomicU16::new(0)).collect(),
            clock_half_period,
            events_processed: 0,
        }
    }

    /// Advances up to `max_ticks` ticks, or until cumulative processed
    /// events reach `max_events`, whichever comes first.
    pub fn tick<M: Mode>(
        &mut self,
        groups: &[GroupCell],
        queue: &mut EventQueue,
        max_ticks: u32,
        max_events: u64,
    ) -> TickReport {
        let mut ticks_completed = 0;
        let start_events = self.events_processed;

        for _ in 0..max_ticks {
            if self.events_processed - start_events >= max_events {
                break;
            }

            let frontier = queue.frontier();
            if frontier.is_empty() && !self.has_autonomous_clocks() {
                break;
            }
            let processed = self.drain::<M>(groups, queue, &frontier);
            queue.swap();
            self.events_processed += processed;
            ticks_completed += 1;
        }

        TickReport {
            ticks_completed,
            events_processed: self.events_processed - start_events,
        }
    }

    fn has_autonomous_clocks(&self) -> bool {
        self.clock_half_period.iter().any(|&p| p > 0)
    }

    /// Drains one frontier: evaluates every group named in it, and for
    /// each whose on/off bit actually changes, propagates `±1` to every
    /// successor and tries to enqueue it (`spec.md` §4.D step 2).
    fn drain<M: Mode>(&self, groups: &[GroupCell], queue: &EventQueue, frontier: &[i32]) -> u64 {
        let eval = |g: i32| {
            let idx = g as usize;
            let cell = &groups[idx];
            let old_byte = cell.ink.load(Ordering::Relaxed);
            let kind = Ink::from_byte(old_byte);
            let old_on = old_byte & 0x80 != 0;
            let active_inputs = cell.active_inputs.load(Ordering::Relaxed);

            let new_on = self.evaluate(kind, idx, active_inputs, old_on);

            cell.visited.store(0, Ordering::Relaxed);
            if kind == Ink::Clock {
                // Autonomous: re-enqueues itself every tick regardless of
                // whether it flipped this time (`spec.md` §4.D).
                try_emit(cell, queue, g);
            }

            if new_on == old_on {
                return;
            }
            cell.ink.store(kind.to_byte(new_on), Ordering::Relaxed);
            propagate(&self.adjacency, groups, queue, idx, new_on);
        };

        M::drain(frontier, eval);
        frontier.len() as u64
    }

    /// The compiled successor graph, exposed so a bit flipped outside the
    /// tick loop (`crate::latch`'s toggle/write) can propagate through it
    /// the same way `drain` does.
    pub fn adjacency(&self) -> &SparseMat {
        &self.adjacency
    }

    /// In-degree per group, exposed so [`crate::project::Project::drive`]
    /// can refuse to externally drive a group the graph itself also
    /// updates (`spec.md` §4.D determinism note).
    pub fn in_degree(&self, idx: usize) -> i32 {
        self.in_degree[idx]
    }

    /// Computes the new on/off bit for one group (`spec.md` §4.D step 2a).
    /// `Latch` and `Clock` are stateful: their next bit depends on `old_on`
    /// as well as `active_inputs`, unlike every other kind.
    fn evaluate(&self, kind: Ink, idx: usize, active_inputs: i16, old_on: bool) -> bool {
        match kind {
            Ink::Trace | Ink::Read | Ink::Write | Ink::Bundle => active_inputs > 0,
            Ink::Buffer | Ink::Or => active_inputs > 0,
            Ink::Not | Ink::Nor => active_inputs == 0,
            Ink::And => {
                let in_degree = self.in_degree[idx];
                in_degree > 0 && active_inputs as i32 == in_degree
            }
            Ink::Nand => {
                let in_degree = self.in_degree[idx];
                !(in_degree > 0 && active_inputs as i32 == in_degree)
            }
            Ink::Xor => active_inputs & 1 != 0,
            Ink::Xnor => active_inputs & 1 == 0,
            Ink::Latch => {
                let previous = self.last_active_inputs[idx].swap(active_inputs, Ordering::Relaxed);
                let rising_edge = previous <= 0 && active_inputs > 0;
                if rising_edge { !old_on } else { old_on }
            }
            Ink::Clock => {
                let half_period = self.clock_half_period[idx].max(1);
                let phase = self.clock_phase[idx].fetch_add(1, Ordering::Relaxed) + 1;
                if phase >= half_period {
                    self.clock_phase[idx].store(0, Ordering::Relaxed);
                    !old_on
                } else {
                    old_on
                }
            }
            Ink::Led => active_inputs > 0,
            _ => old_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::adjacency::SparseMat;
    use crate::state::GroupCell;

    fn engine_for(adjacency: SparseMat, kinds: &[Ink], clock_half_period: &[u16]) -> TickEngine {
        let in_degree = adjacency.in_degrees();
        TickEngine::new(adjacency, in_degree, clock_half_period.to_vec())
    }

    fn cells(kinds: &[Ink]) -> Vec<GroupCell> {
        kinds.iter().map(|k| GroupCell::new(k.to_byte(false))).collect()
    }

    #[test]
    fn buffer_turns_on_when_its_source_turns_on() {
        // group 0 (Write) -> group 1 (Buffer). A host drives a Write
        // group by setting activeInputs directly, since Write has no
        // in-edges to receive it from (`can_sense` excludes it).
        let adjacency = SparseMat::from_edges(2, [(0, 1)]);
        let kinds = [Ink::Write, Ink::Buffer];
        let mut engine = engine_for(adjacency, &kinds, &[0, 0]);
        let groups = cells(&kinds);
        let mut queue = EventQueue::new(4);

        groups[0].active_inputs.store(1, Ordering::Relaxed);
        queue.seed([0]);

        let report = engine.tick::<Serial>(&groups, &mut queue, 2, 100);
        assert!(report.ticks_completed >= 1);
        assert_eq!(groups[1].active_inputs.load(Ordering::Relaxed), 1);
        assert!(groups[0].ink.load(Ordering::Relaxed) & 0x80 != 0);
        assert!(groups[1].ink.load(Ordering::Relaxed) & 0x80 != 0);
    }

    #[test]
    fn nand_of_two_high_inputs_goes_low() {
        // groups 0, 1 drive group 2 (Nand), in-degree 2.
        let adjacency = SparseMat::from_edges(3, [(0, 2), (1, 2)]);
        let kinds = [Ink::Write, Ink::Write, Ink::Nand];
        let mut engine = engine_for(adjacency, &kinds, &[0, 0, 0]);
        let groups = cells(&kinds);
        let mut queue = EventQueue::new(8);

        groups[2].ink.store(Ink::Nand.to_byte(true), Ordering::Relaxed); // starts active
        groups[2].active_inputs.store(2, Ordering::Relaxed);
        queue.seed([2]);

        engine.tick::<Serial>(&groups, &mut queue, 1, 100);
        assert_eq!(Ink::from_byte(groups[2].ink.load(Ordering::Relaxed)), Ink::Nand);
        assert!(groups[2].ink.load(Ordering::Relaxed) & 0x80 == 0); // now off
    }

    #[test]
    fn latch_toggles_only_on_rising_edge() {
        let adjacency = SparseMat::from_edges(1, []);
        let kinds = [Ink::Latch];
        let mut engine = engine_for(adjacency, &kinds, &[0]);
        let groups = cells(&kinds);
        let mut queue = EventQueue::new(4);

        groups[0].active_inputs.store(1, Ordering::Relaxed);
        queue.seed([0]);
        engine.tick::<Serial>(&groups, &mut queue, 1, 100);
        assert!(groups[0].ink.load(Ordering::Relaxed) & 0x80 != 0);

        // activeInputs stays at 1 (no new edge): a second evaluation must
        // not toggle again.
        queue.seed([0]);
        engine.tick::<Serial>(&groups, &mut queue, 1, 100);
        assert!(groups[0].ink.load(Ordering::Relaxed) & 0x80 != 0);
    }

    #[test]
    fn clock_alternates_every_half_period_without_input() {
        let adjacency = SparseMat::from_edges(1, []);
        let kinds = [Ink::Clock];
        let mut engine = engine_for(adjacency, &kinds, &[1]);
        let groups = cells(&kinds);
        let mut queue = EventQueue::new(4);
        queue.seed([0]);

        let before = groups[0].ink.load(Ordering::Relaxed) & 0x80 != 0;
        engine.tick::<Serial>(&groups, &mut queue, 1, 100);
        let after = groups[0].ink.load(Ordering::Relaxed) & 0x80 != 0;
        assert_ne!(before, after);
    }
}
