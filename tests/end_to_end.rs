//! The six end-to-end scenarios of `spec.md` §8.

mod common;

use common::{config_without_vmem, image};
use vcb_core::{Ink, Project, Serial};

#[test]
fn single_trace_comes_on_after_one_tick() {
    // [Write, Trace, Trace]
    let image = image(3, 1, &[(Ink::Write, 0), (Ink::Trace, 0), (Ink::Trace, 0)]);
    let config = config_without_vmem();
    let mut project = Project::<Serial>::new(&image, &config).unwrap();

    project.drive(0, 0, 1);
    project.tick(1, 100);

    assert_eq!(project.sample(1, 0), Some(true));
    assert_eq!(project.sample(2, 0), Some(true));
}

#[test]
fn nand_of_two_inputs_matches_truth_table() {
    //   . A .
    //   B N .
    //   . . .
    // A (above) and B (left) are `Write` pixels driven directly by the
    // host; only `Write`/`Clock` groups have no in-edges, so they are the
    // only kinds `Project::drive` is allowed to touch.
    let layout = image(
        3,
        3,
        &[
            (Ink::None, 0), (Ink::Write, 0), (Ink::None, 0),
            (Ink::Write, 0), (Ink::Nand, 0), (Ink::None, 0),
            (Ink::None, 0), (Ink::None, 0), (Ink::None, 0),
        ],
    );
    let config = config_without_vmem();

    for (a, b, expected) in [(false, false, true), (false, true, true), (true, false, true), (true, true, false)] {
        let mut project = Project::<Serial>::new(&layout, &config).unwrap();
        project.drive(1, 0, if a { 1 } else { 0 });
        project.drive(0, 1, if b { 1 } else { 0 });
        project.tick(2, 100);
        assert_eq!(
            project.sample(1, 1),
            Some(expected),
            "A={a} B={b} expected {expected}"
        );
    }
}

#[test]
fn crossing_keeps_axes_independent() {
    //   . V .
    //   H X H
    //   . V .
    let layout = image(
        3,
        3,
        &[
            (Ink::None, 0), (Ink::Trace, 0), (Ink::None, 0),
            (Ink::Trace, 0), (Ink::Cross, 0), (Ink::Trace, 0),
            (Ink::None, 0), (Ink::Trace, 0), (Ink::None, 0),
        ],
    );
    let config = config_without_vmem();
    let mut project = Project::<Serial>::new(&layout, &config).unwrap();

    project.drive(0, 1, 1); // drive the horizontal trace high
    project.tick(1, 100);

    assert_eq!(project.sample(2, 1), Some(true)); // horizontal propagated through
    assert_eq!(project.sample(1, 0), Some(false)); // vertical untouched
    assert_eq!(project.sample(1, 2), Some(false));
}

#[test]
fn bundle_channels_stay_isolated() {
    // Trace(channel 0) - Bundle - Trace(channel 1)
    let layout = image(3, 1, &[(Ink::Trace, 0), (Ink::Bundle, 0), (Ink::Trace, 1)]);
    let config = config_without_vmem();
    let mut project = Project::<Serial>::new(&layout, &config).unwrap();

    project.drive(0, 0, 1); // drive channel 0 high
    project.tick(2, 100);

    assert_eq!(project.sample(1, 0), Some(true)); // bundle's channel-0 picked it up
    assert_eq!(project.sample(2, 0), Some(false)); // channel 1's trace unaffected
}

#[test]
fn toggling_a_latch_is_observed_by_a_reader_next_tick() {
    // Latch - Trace (reader)
    let layout = image(2, 1, &[(Ink::Latch, 0), (Ink::Trace, 0)]);
    let config = config_without_vmem();
    let mut project = Project::<Serial>::new(&layout, &config).unwrap();

    project.toggle_latch((0, 0));
    project.tick(2, 100);

    assert_eq!(project.sample(1, 0), Some(true));
}

#[test]
fn clock_alternates_every_tick_without_input() {
    let layout = image(1, 1, &[(Ink::Clock, 0)]);
    let config = config_without_vmem();
    let mut project = Project::<Serial>::new(&layout, &config).unwrap();

    let mut states = Vec::new();
    for _ in 0..4 {
        project.tick(1, 100);
        states.push(project.sample(0, 0).unwrap());
    }
    assert_eq!(states, vec![true, false, true, false]);
}
