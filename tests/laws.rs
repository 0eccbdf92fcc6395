//! Cross-cutting laws a correct implementation must satisfy, as opposed to
//! the scenario-shaped checks in `end_to_end.rs`.

mod common;

use common::{config_without_vmem, image};
use vcb_core::preprocess::preprocess;
use vcb_core::{Ink, LatchConfig, Project, ProjectConfig, Serial};

fn sample_image() -> vcb_core::Image {
    image(
        3,
        3,
        &[
            (Ink::None, 0), (Ink::Trace, 0), (Ink::None, 0),
            (Ink::Trace, 0), (Ink::Nand, 0), (Ink::None, 0),
            (Ink::None, 0), (Ink::None, 0), (Ink::None, 0),
        ],
    )
}

#[test]
fn preprocessing_is_idempotent_without_gorder() {
    let layout = sample_image();
    let a = preprocess(&layout, false).unwrap();
    let b = preprocess(&layout, false).unwrap();

    assert_eq!(a.index_image, b.index_image);
    assert_eq!(a.num_groups, b.num_groups);
    assert_eq!(a.adjacency.ptr, b.adjacency.ptr);
    assert_eq!(a.adjacency.rows, b.adjacency.rows);
    assert_eq!(a.in_degree, b.in_degree);
    assert_eq!(a.initial_ink, b.initial_ink);
    assert_eq!(a.initial_frontier, b.initial_frontier);
    assert_eq!(a.clock_half_period, b.clock_half_period);
}

fn run_and_sample(layout: &vcb_core::Image, config: &ProjectConfig) -> Vec<Option<bool>> {
    let mut project = Project::<Serial>::new(layout, config).unwrap();
    project.drive(1, 0, 1);
    project.drive(0, 1, 1);
    project.tick(5, 1000);
    (0..layout.height)
        .flat_map(|y| (0..layout.width).map(move |x| (x, y)))
        .map(|(x, y)| project.sample(x, y))
        .collect()
}

#[test]
fn serial_tick_is_deterministic() {
    let layout = sample_image();
    let config = config_without_vmem();
    assert_eq!(run_and_sample(&layout, &config), run_and_sample(&layout, &config));
}

#[test]
fn quiescent_project_is_a_tick_no_op() {
    // No active-with-no-inputs gate and nothing driven: the initial
    // frontier is empty, so the very first tick call should do nothing.
    let layout = image(3, 1, &[(Ink::Write, 0), (Ink::Trace, 0), (Ink::Trace, 0)]);
    let config = config_without_vmem();
    let mut project = Project::<Serial>::new(&layout, &config).unwrap();

    let before: Vec<_> = (0..3).map(|x| project.sample(x, 0)).collect();
    let report = project.tick(10, 1000);
    let after: Vec<_> = (0..3).map(|x| project.sample(x, 0)).collect();

    assert_eq!(report.ticks_completed, 0);
    assert_eq!(report.events_processed, 0);
    assert_eq!(before, after);
}

#[test]
fn vmem_latch_round_trip() {
    // pixel 0: address bit 0. pixel 1: data bit 0. pixel 2: unused filler.
    let layout = image(3, 1, &[(Ink::Latch, 0), (Ink::Latch, 0), (Ink::Latch, 0)]);
    let no_stride_bit = |pos| LatchConfig {
        pos,
        stride: (1, 0),
        size: (1, 1),
        num_bits: 1,
    };
    let config = ProjectConfig {
        use_gorder: false,
        vmem_size: 2,
        vm_addr: no_stride_bit((0, 0)),
        vm_data: no_stride_bit((1, 0)),
    };
    let mut project = Project::<Serial>::new(&layout, &config).unwrap();

    project.assemble("1\n0").unwrap();
    assert_eq!(project.vmem()[0], 1);
    assert_eq!(project.vmem()[1], 0);

    // Push: with the address bank still at 0, syncing carries vmem[0] into
    // the data latch.
    project.sync_vmem();
    project.tick(1, 100);
    assert_eq!(project.sample(1, 0), Some(true));

    // Pull: flipping the data latch "under logic" feeds back into vmem on
    // the next sync, since the address hasn't moved.
    project.toggle_latch((1, 0));
    project.tick(1, 100);
    project.sync_vmem();
    assert_eq!(project.vmem()[0], 0);
}
