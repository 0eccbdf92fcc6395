//! The public surface tying preprocessing, tick simulation, and the VMem
//! overlay together, `spec.md` §3 `Project`.

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::assembler::{assemble_vmem, dump_vmem_to_text};
use crate::config::{LatchConfig, ProjectConfig};
use crate::error::{AssemblyError, PreprocessError};
use crate::ink::Ink;
use crate::latch::{toggle_latch_at, LatchInterface, VMemController};
use crate::pixel::Image;
use crate::preprocess::preprocess;
use crate::state::{EventQueue, GroupCell};
use crate::tick::{Mode, Serial, TickEngine, TickReport};

/// Owns every per-project buffer: the image, the compiled graph, the
/// simulation state, the VMem overlay, and the assembly symbol table
/// (`spec.md` §3). All buffers are created together by [`Project::new`]
/// and released together when the `Project` drops; nothing is allocated
/// during simulation (`spec.md` §5 "Resources").
pub struct Project<M: Mode = Serial> {
    width: usize,
    height: usize,
    index_image: Vec<i32>,
    groups: Vec<GroupCell>,
    queue: EventQueue,
    engine: TickEngine,
    vmem: Vec<u64>,
    vmem_controller: VMemController,
    assembly_symbols: HashMap<String, usize>,
    invalid_pixels: Vec<(usize, usize, Ink)>,
    _mode: PhantomData<M>,
}

impl<M: Mode> Project<M> {
    /// Compiles `image` into a runnable project per `config`
    /// (`spec.md` §4.B, §4.E).
    pub fn new(image: &Image, config: &ProjectConfig) -> Result<Project<M>, PreprocessError> {
        let compiled = preprocess(image, config.use_gorder)?;

        let groups: Vec<GroupCell> = compiled
            .initial_ink
            .iter()
            .map(|&byte| GroupCell::new(byte))
            .collect();

        let mut queue = EventQueue::new(compiled.num_groups.max(1));
        queue.seed(compiled.initial_frontier.iter().copied());

        let engine = TickEngine::new(compiled.adjacency, compiled.in_degree, compiled.clock_half_period);

        let addr = discover(&config.vm_addr, &compiled.index_image, image.width, image.height);
        let data = discover(&config.vm_data, &compiled.index_image, image.width, image.height);
        let vmem_controller = VMemController::new(addr, data);

        Ok(Project {
            width: image.width,
            height: image.height,
            index_image: compiled.index_image,
            groups,
            queue,
            engine,
            vmem: vec![0u64; config.vmem_size],
            vmem_controller,
            assembly_symbols: HashMap::new(),
            invalid_pixels: compiled.invalid_pixels,
            _mode: PhantomData,
        })
    }

    /// Advances the simulation by up to `max_ticks`, or until `max_events`
    /// cumulative events are processed (`spec.md` §4.D). Does not sync
    /// VMem itself; callers driving a VMem-backed project should call
    /// `tick(1, ..)` in a loop and call [`Project::sync_vmem`] between
    /// calls, matching `spec.md` §4.E's "between ticks" wording.
    pub fn tick(&mut self, max_ticks: u32, max_events: u64) -> TickReport {
        self.engine.tick::<M>(&self.groups, &mut self.queue, max_ticks, max_events)
    }

    /// Runs one VMem address/data sync step (`spec.md` §4.E).
    pub fn sync_vmem(&mut self) {
        self.vmem_controller
            .sync(&mut self.vmem, &self.groups, self.engine.adjacency(), &mut self.queue);
    }

    /// Reads the on/off state of the group at pixel `(x, y)`, or `None` if
    /// that pixel owns no group.
    pub fn sample(&self, x: usize, y: usize) -> Option<bool> {
        let gid = self.index_image[y * self.width + x];
        if gid < 0 {
            return None;
        }
        use std::sync::atomic::Ordering;
        Some(self.groups[gid as usize].ink.load(Ordering::Relaxed) & 0x80 != 0)
    }

    /// Flips the latch pixel at `(x, y)` and enqueues it
    /// (`original_source/openVCB.h`'s `toggleLatch`).
    pub fn toggle_latch(&mut self, pos: (usize, usize)) {
        toggle_latch_at(
            pos,
            &self.index_image,
            self.width,
            &self.groups,
            self.engine.adjacency(),
            &mut self.queue,
        );
    }

    /// The group id owning pixel `(x, y)`, or `None` if it owns no group.
    pub fn group_id_at(&self, x: usize, y: usize) -> Option<i32> {
        let gid = self.index_image[y * self.width + x];
        (gid >= 0).then_some(gid)
    }

    /// Drives the group at `(x, y)` externally by setting its
    /// `activeInputs` directly and enqueueing it. This is how a host
    /// toggles a `Write` or `Clock` pixel: those kinds have no in-edges
    /// (`Ink::can_sense` excludes them), so nothing in the graph ever
    /// updates their `activeInputs` on their behalf. Groups the graph
    /// *does* drive (anything with at least one predecessor) silently
    /// ignore the call — overwriting `activeInputs` on one of those would
    /// race with whatever predecessor's `drain` pass last wrote it
    /// (`spec.md` §4.D determinism note).
    pub fn drive(&mut self, x: usize, y: usize, active_inputs: i16) {
        if let Some(gid) = self.group_id_at(x, y) {
            if self.engine.in_degree(gid as usize) != 0 {
                return;
            }
            use std::sync::atomic::Ordering;
            self.groups[gid as usize]
                .active_inputs
                .store(active_inputs, Ordering::Relaxed);
            self.queue.inject_if_unvisited(&self.groups[gid as usize], gid);
        }
    }

    /// Assembles `source` into this project's VMem buffer
    /// (`spec.md` §4.E `assembleVmem`).
    pub fn assemble(&mut self, source: &str) -> Result<(), AssemblyError> {
        let (vmem, symbols) = assemble_vmem(source, self.vmem.len())?;
        self.vmem = vmem;
        self.assembly_symbols = symbols;
        Ok(())
    }

    /// Dumps the current VMem buffer as whitespace-separated hex words
    /// (`spec.md` §6 `dumpVMemToText`).
    pub fn dump_vmem_to_text(&self) -> String {
        dump_vmem_to_text(&self.vmem)
    }

    pub fn vmem(&self) -> &[u64] {
        &self.vmem
    }

    pub fn assembly_symbols(&self) -> &HashMap<String, usize> {
        &self.assembly_symbols
    }

    /// Pixels downgraded during preprocessing because their placement
    /// could not be resolved (`spec.md` §7 `InvalidPlacement`).
    pub fn invalid_pixels(&self) -> &[(usize, usize, Ink)] {
        &self.invalid_pixels
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

fn discover(
    config: &LatchConfig,
    index_image: &[i32],
    width: usize,
    height: usize,
) -> LatchInterface {
    LatchInterface::discover(
        config.pos,
        config.stride,
        config.size,
        config.num_bits,
        index_image,
        width,
        height,
    )
}
