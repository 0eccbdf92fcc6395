//! Virtual-memory overlay: latch banks projected onto simulation state,
//! `spec.md` §4.E / `original_source/openVCB.h`'s `LatchInterface`.

use std::sync::atomic::Ordering;

use crate::preprocess::adjacency::SparseMat;
use crate::state::{EventQueue, GroupCell};
use crate::tick::propagate_between_ticks;

/// Maximum bits a single latch bank can project, matching
/// `original_source/openVCB.h`'s `gids[64]`.
pub const MAX_BITS: usize = 64;

/// A rectangle of latch pixels walked in `stride`-sized steps, each cell
/// resolving to one group id. `spec.md` §3: produced by preprocessing from
/// caller-supplied geometry, consumed by VMem I/O and `toggle`.
#[derive(Debug, Clone)]
pub struct LatchInterface {
    pub pos: (usize, usize),
    pub stride: (i32, i32),
    pub size: (usize, usize),
    pub num_bits: usize,
    /// Group id for each of the first `num_bits` cells; `-1` if the cell
    /// at that offset resolved to no group (e.g. it fell outside the
    /// image, or the pixel there is not latch ink).
    pub gids: [i32; MAX_BITS],
}

impl LatchInterface {
    /// Walks the rectangle and records the group id at each cell
    /// (`spec.md` §4.B step 6). `index_image` is row-major `width`-wide.
    pub fn discover(
        pos: (usize, usize),
        stride: (i32, i32),
        size: (usize, usize),
        num_bits: usize,
        index_image: &[i32],
        width: usize,
        height: usize,
    ) -> LatchInterface {
        let num_bits = num_bits.min(MAX_BITS);
        let mut gids = [-1i32; MAX_BITS];

        for (bit, gid) in gids.iter_mut().enumerate().take(num_bits) {
            let (row, col) = (bit / size.1.max(1), bit % size.1.max(1));
            let x = pos.0 as i32 + stride.0 * col as i32;
            let y = pos.1 as i32 + stride.1 * row as i32;
            if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
                continue;
            }
            *gid = index_image[y as usize * width + x as usize];
        }

        LatchInterface {
            pos,
            stride,
            size,
            num_bits,
            gids,
        }
    }

    /// Reads the bank's current value: bit `b` is the on/off state of
    /// `gids[b]`, or 0 if that slot has no group.
    pub fn read(&self, groups: &[GroupCell]) -> u64 {
        let mut value = 0u64;
        for (bit, &gid) in self.gids[..self.num_bits].iter().enumerate() {
            if gid < 0 {
                continue;
            }
            let on = groups[gid as usize].ink.load(Ordering::Relaxed) & 0x80 != 0;
            if on {
                value |= 1 << bit;
            }
        }
        value
    }

    /// Writes `value`'s low `num_bits` bits into the bank, flipping and
    /// enqueueing only the latches whose bit actually changes.
    pub fn write(&self, value: u64, groups: &[GroupCell], adjacency: &SparseMat, queue: &mut EventQueue) {
        for (bit, &gid) in self.gids[..self.num_bits].iter().enumerate() {
            if gid < 0 {
                continue;
            }
            let wanted = value & (1 << bit) != 0;
            self.set_bit(gid as usize, wanted, groups, adjacency, queue);
        }
    }

    /// Flips the stored bit at latch bit `bit` unconditionally and
    /// enqueues it, the `toggleLatch` primitive (`spec.md` §4.D).
    pub fn toggle(&self, bit: usize, groups: &[GroupCell], adjacency: &SparseMat, queue: &mut EventQueue) {
        if bit >= self.num_bits || self.gids[bit] < 0 {
            return;
        }
        let gid = self.gids[bit] as usize;
        let current = groups[gid].ink.load(Ordering::Relaxed) & 0x80 != 0;
        self.set_bit(gid, !current, groups, adjacency, queue);
    }

    /// Flips a single group's bit and propagates the change to its
    /// successors immediately: this happens between ticks, so there is no
    /// `drain` in flight to hand the update to, and the flip must land in
    /// the current frontier itself (`propagate_between_ticks`), not the
    /// write-side buffer a plain `tryEmit` would use.
    fn set_bit(&self, gid: usize, wanted: bool, groups: &[GroupCell], adjacency: &SparseMat, queue: &mut EventQueue) {
        let cell = &groups[gid];
        let byte = cell.ink.load(Ordering::Relaxed);
        let current = byte & 0x80 != 0;
        if current == wanted {
            return;
        }
        cell.ink.store((byte & !0x80) | if wanted { 0x80 } else { 0 }, Ordering::Relaxed);
        propagate_between_ticks(adjacency, groups, queue, gid, wanted);
        queue.inject_if_unvisited(cell, gid as i32);
    }
}

/// Looks up the latch pixel's group id in the index image, flips it, and
/// propagates the change to its successors (`original_source/openVCB.h`'s
/// `Project::toggleLatch(pos)`).
pub fn toggle_latch_at(
    pos: (usize, usize),
    index_image: &[i32],
    width: usize,
    groups: &[GroupCell],
    adjacency: &SparseMat,
    queue: &mut EventQueue,
) {
    let gid = index_image[pos.1 * width + pos.0];
    if gid < 0 {
        return;
    }
    let cell = &groups[gid as usize];
    let byte = cell.ink.load(Ordering::Relaxed);
    let new_on = byte & 0x80 == 0;
    cell.ink.store((byte & !0x80) | if new_on { 0x80 } else { 0 }, Ordering::Relaxed);
    propagate_between_ticks(adjacency, groups, queue, gid as usize, new_on);
    queue.inject_if_unvisited(cell, gid);
}

/// Keeps the addressed VMem word and the data latch bank in sync between
/// ticks (`spec.md` §4.E). Owns no state itself beyond `last_address`: the
/// bits live in the latch banks and `vmem`.
pub struct VMemController {
    pub addr: LatchInterface,
    pub data: LatchInterface,
    last_address: usize,
}

impl VMemController {
    pub fn new(addr: LatchInterface, data: LatchInterface) -> VMemController {
        VMemController {
            addr,
            data,
            last_address: usize::MAX,
        }
    }

    /// Runs one between-tick VMem sync step. If the address bank changed,
    /// the addressed word is pushed into the data latches; otherwise, if
    /// the data latches changed under logic, the addressed word is pulled
    /// from them.
    pub fn sync(&mut self, vmem: &mut [u64], groups: &[GroupCell], adjacency: &SparseMat, queue: &mut EventQueue) {
        let address = self.addr.read(groups) as usize;
        if vmem.is_empty() {
            return;
        }
        let address = address % vmem.len();

        if address != self.last_address {
            self.data.write(vmem[address], groups, adjacency, queue);
            self.last_address = address;
        } else {
            let observed = self.data.read(groups);
            if observed != vmem[address] {
                vmem[address] = observed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_groups(n: usize) -> Vec<GroupCell> {
        (0..n).map(|_| GroupCell::new(crate::ink::Ink::Latch.to_byte(false))).collect()
    }

    #[test]
    fn discover_walks_stride_into_index_image() {
        // 1-row image of 4 latch groups, ids 0..4.
        let index_image = vec![0, 1, 2, 3];
        let iface = LatchInterface::discover((0, 0), (1, 0), (1, 4), 4, &index_image, 4, 1);
        assert_eq!(&iface.gids[..4], &[0, 1, 2, 3]);
    }

    #[test]
    fn toggle_flips_and_enqueues() {
        let groups = make_groups(1);
        let adjacency = SparseMat::from_edges(1, []);
        let mut queue = EventQueue::new(4);
        let index_image = vec![0];
        let iface = LatchInterface::discover((0, 0), (1, 0), (1, 1), 1, &index_image, 1, 1);

        assert_eq!(iface.read(&groups), 0);
        iface.toggle(0, &groups, &adjacency, &mut queue);
        assert_eq!(iface.read(&groups), 1);
    }

    #[test]
    fn toggle_propagates_to_a_reader() {
        // group 0 (Latch) -> group 1 (Trace, the reader).
        let groups = vec![
            GroupCell::new(crate::ink::Ink::Latch.to_byte(false)),
            GroupCell::new(crate::ink::Ink::Trace.to_byte(false)),
        ];
        let adjacency = SparseMat::from_edges(2, [(0, 1)]);
        let mut queue = EventQueue::new(4);
        let index_image = vec![0];
        let iface = LatchInterface::discover((0, 0), (1, 0), (1, 1), 1, &index_image, 1, 1);

        iface.toggle(0, &groups, &adjacency, &mut queue);
        assert_eq!(groups[1].active_inputs.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn write_only_enqueues_changed_bits() {
        let groups = make_groups(2);
        let adjacency = SparseMat::from_edges(2, []);
        let mut queue = EventQueue::new(4);
        let index_image = vec![0, 1];
        let iface = LatchInterface::discover((0, 0), (1, 0), (1, 2), 2, &index_image, 2, 1);

        iface.write(0b01, &groups, &adjacency, &mut queue);
        assert_eq!(iface.read(&groups), 0b01);
        iface.write(0b01, &groups, &adjacency, &mut queue); // no-op, already matches
        assert_eq!(iface.read(&groups), 0b01);
    }

    #[test]
    fn vmem_sync_pushes_word_on_address_change() {
        let groups = make_groups(3); // group 0: addr bit 0; groups 1,2: data bits
        let adjacency = SparseMat::from_edges(3, []);
        let mut queue = EventQueue::new(8);
        let index_image = vec![0, 1, 2];
        let addr = LatchInterface::discover((0, 0), (1, 0), (1, 1), 1, &index_image, 3, 1);
        let data = LatchInterface::discover((1, 0), (1, 0), (1, 2), 2, &index_image, 3, 1);
        let mut controller = VMemController::new(addr, data);
        let mut vmem = vec![0u64, 0b11];

        controller.sync(&mut vmem, &groups, &adjacency, &mut queue);
        assert_eq!(controller.data.read(&groups), 0); // address 0 -> word 0

        controller.addr.toggle(0, &groups, &adjacency, &mut queue); // address becomes 1
        controller.sync(&mut vmem, &groups, &adjacency, &mut queue);
        assert_eq!(controller.data.read(&groups), 0b11); // address 1 -> word 0b11
    }
}
