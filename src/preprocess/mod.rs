//! Image → component graph compilation, `spec.md` §4.B.
//!
//! This is the heaviest of the five components: connected-component
//! extraction (`regions`), the CSC adjacency build (`adjacency`), and an
//! optional cache-friendly relabeling pass (`gorder`).

pub mod adjacency;
pub mod gorder;
pub mod regions;

use crate::error::PreprocessError;
use crate::ink::Ink;
use crate::pixel::Image;
use adjacency::SparseMat;
use regions::Region;

const NO_REGION: usize = usize::MAX;
/// Bundles carry up to 64 independent logical channels per cell
/// (`spec.md` §3 `Bundle`, `original_source/openVCB.h`'s
/// `LatchInterface::gids[64]`).
pub const BUNDLE_CHANNELS: usize = 64;

/// Everything [`crate::project::Project`] needs to start simulating:
/// the compiled graph and the initial state derived from it.
pub struct Preprocessed {
    /// Group id per pixel, or `-1` for pixels that own no group. Bundle
    /// cells map to their channel-0 representative group.
    pub index_image: Vec<i32>,
    pub num_groups: usize,
    pub adjacency: SparseMat,
    pub in_degree: Vec<i32>,
    /// Packed ink byte (`Ink::to_byte`) per group, off except nothing —
    /// initial on/off state is always off; activity is expressed only
    /// through `initial_frontier` (`spec.md` §4.B step 5).
    pub initial_ink: Vec<u8>,
    /// Groups to enqueue before the first tick: gates that are active
    /// with zero driving predecessors, and every `Clock`.
    pub initial_frontier: Vec<i32>,
    /// Pixels whose ink was downgraded to an `Invalid*` variant because
    /// it could not be resolved (`spec.md` §7 `InvalidPlacement`).
    pub invalid_pixels: Vec<(usize, usize, Ink)>,
    /// Half-period, in ticks, of every `Clock` group (0 for non-clocks).
    /// Encoded in the clock pixel's `meta`; a `meta` of zero defaults to a
    /// half-period of 1 tick (`spec.md` §8 scenario 6 uses period 2, i.e.
    /// half-period 1).
    pub clock_half_period: Vec<u16>,
}

/// Preprocesses a decoded pixel image into a [`Preprocessed`] graph.
///
/// `use_gorder` requests the cache-friendly group relabeling of
/// `spec.md` §4.B step 3.
pub fn preprocess(image: &Image, use_gorder: bool) -> Result<Preprocessed, PreprocessError> {
    if image.width == 0 || image.height == 0 {
        return Err(PreprocessError::MalformedInput {
            width: image.width,
            height: image.height,
            reason: "image has a zero dimension",
        });
    }
    if image.pixels.len() != image.width * image.height {
        return Err(PreprocessError::MalformedInput {
            width: image.width,
            height: image.height,
            reason: "pixel buffer length does not match width * height",
        });
    }

    let (regions, region_of) = regions::find_regions(image);
    let invalid_pixels = downgrade_unresolvable_crossings(image);

    let numbering = number_groups(image, &regions);
    let mut index_image = vec![-1i32; image.pixels.len()];
    for (region_id, region) in regions.iter().enumerate() {
        let base = numbering.base_id[region_id];
        for &pixel in &region.pixels {
            index_image[pixel] = base as i32;
        }
    }

    let edges = build_edges(image, &region_of, &regions, &numbering);
    let mut adjacency = SparseMat::from_edges(numbering.num_groups, edges);

    let mut index_image = index_image;
    if use_gorder {
        let permutation = gorder_permutation(&numbering, &adjacency);
        apply_permutation(&mut index_image, &mut adjacency, &permutation);
        return Ok(finish(
            index_image,
            adjacency,
            &numbering,
            &permutation,
            invalid_pixels,
        ));
    }

    let identity: Vec<usize> = (0..numbering.num_groups).collect();
    Ok(finish(
        index_image,
        adjacency,
        &numbering,
        &identity,
        invalid_pixels,
    ))
}

struct Numbering {
    num_groups: usize,
    /// First group id for region `i` (bundles occupy
    /// `[base, base + 64)`; everything else occupies `[base, base + 1)`).
    base_id: Vec<usize>,
    /// Ink kind of the group starting at each base id (parallel to the
    /// eventual group-indexed arrays, before any gorder permutation).
    kind_by_group: Vec<Ink>,
    /// Clock half-period per group, 0 for non-`Clock` groups; parallel to
    /// `kind_by_group`.
    clock_half_period_by_group: Vec<u16>,
}

/// Assigns dense group ids, wire/ink groups before gate/stateful groups
/// (`spec.md` §3), expanding each `Bundle` region into 64 channel groups.
fn number_groups(image: &Image, regions: &[Region]) -> Numbering {
    let (wires, rest): (Vec<usize>, Vec<usize>) = (0..regions.len())
        .partition(|&i| regions[i].kind.is_wire_group());

    let mut base_id = vec![0usize; regions.len()];
    let mut kind_by_group = Vec::new();
    let mut clock_half_period_by_group = Vec::new();
    let mut next = 0usize;

    for region_id in wires.into_iter().chain(rest) {
        base_id[region_id] = next;
        let region = &regions[region_id];
        let kind = region.kind;
        let width = if kind == Ink::Bundle { BUNDLE_CHANNELS } else { 1 };
        kind_by_group.extend(std::iter::repeat(kind).take(width));

        let half_period = if kind == Ink::Clock {
            let meta = image.pixels[region.pixels[0]].meta;
            if meta == 0 { 1 } else { meta }
        } else {
            0
        };
        clock_half_period_by_group.extend(std::iter::repeat(half_period).take(width));

        next += width;
    }

    Numbering {
        num_groups: next,
        base_id,
        kind_by_group,
        clock_half_period_by_group,
    }
}

/// Resolves the group id `(x, y)`'s pixel connects to when touched by a
/// conductor with meta `other_meta`: bundle cells pick one of their 64
/// channel sub-groups by `other_meta % 64` (`spec.md` §4.B step 2); every
/// other kind has exactly one group.
fn touched_group(
    region_of: &[usize],
    regions: &[Region],
    numbering: &Numbering,
    pixel: usize,
    other_meta: u16,
) -> i32 {
    let region_id = region_of[pixel];
    let base = numbering.base_id[region_id];
    if regions[region_id].kind == Ink::Bundle {
        (base + other_meta as usize % BUNDLE_CHANNELS) as i32
    } else {
        base as i32
    }
}

fn build_edges(
    image: &Image,
    region_of: &[usize],
    regions: &[Region],
    numbering: &Numbering,
) -> Vec<(i32, i32)> {
    let mut edges = Vec::new();

    for y in 0..image.height {
        for x in 0..image.width {
            let pixel_index = image.index_of(x, y);
            if region_of[pixel_index] == NO_REGION {
                continue;
            }
            let pixel = image.get(x, y);

            for (dx, dy) in [(1i32, 0i32), (0, 1)] {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx as usize >= image.width || ny as usize >= image.height {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let neighbor_index = image.index_of(nx, ny);
                if region_of[neighbor_index] == NO_REGION {
                    continue;
                }
                let neighbor = image.get(nx, ny);
                if region_of[pixel_index] == region_of[neighbor_index] {
                    continue; // same group, no edge needed
                }

                let u = touched_group(region_of, regions, numbering, pixel_index, neighbor.meta);
                let v = touched_group(region_of, regions, numbering, neighbor_index, pixel.meta);
                if u == v {
                    continue;
                }

                let pixel_drives_neighbor = pixel.ink.can_drive() && neighbor.ink.can_sense();
                let neighbor_drives_pixel = neighbor.ink.can_drive() && pixel.ink.can_sense();

                if pixel_drives_neighbor && neighbor_drives_pixel {
                    // Both directions qualify independently only when a
                    // computing group (gate/Latch) sits directly against a
                    // bidirectional conductor (Trace/Bundle) — every pure
                    // source/sink kind (Write, Clock, Read, Led) fails one
                    // side of the check by construction. Keep only the
                    // conductor-drives-computing-group direction so a gate
                    // never feeds back into the trace that feeds it.
                    if pixel.ink.is_computing() {
                        edges.push((v, u));
                    } else {
                        edges.push((u, v));
                    }
                } else if pixel_drives_neighbor {
                    edges.push((u, v));
                } else if neighbor_drives_pixel {
                    edges.push((v, u));
                }
            }
        }
    }

    edges
}

/// Pixels where a `Cross`/`Tunnel` sits with no matching ink on the
/// opposite side of either axis: downgraded to `InvalidCross` in the
/// report, per `spec.md` §7 (the index image itself never gains an entry
/// for these — crossings never own a group either way).
fn downgrade_unresolvable_crossings(image: &Image) -> Vec<(usize, usize, Ink)> {
    let mut invalid = Vec::new();
    for y in 0..image.height {
        for x in 0..image.width {
            let pixel = image.get(x, y);
            if !pixel.ink.is_crossing() {
                continue;
            }
            let resolves_an_axis = [(-1i32, 0i32, 1i32, 0i32), (0, -1, 0, 1)].iter().any(
                |&(dx1, dy1, dx2, dy2)| {
                    let a = offset_ink(image, x, y, dx1, dy1);
                    let b = offset_ink(image, x, y, dx2, dy2);
                    matches!((a, b), (Some(a), Some(b)) if a == b)
                },
            );
            if !resolves_an_axis {
                invalid.push((x, y, Ink::InvalidCross));
                log::warn!("unresolvable crossing at ({x}, {y}): downgraded to InvalidCross");
            }
        }
    }
    invalid
}

fn offset_ink(image: &Image, x: usize, y: usize, dx: i32, dy: i32) -> Option<Ink> {
    let nx = x as i32 + dx;
    let ny = y as i32 + dy;
    if nx < 0 || ny < 0 || nx as usize >= image.width || ny as usize >= image.height {
        return None;
    }
    Some(image.get(nx as usize, ny as usize).ink)
}

fn gorder_permutation(numbering: &Numbering, adjacency: &SparseMat) -> Vec<usize> {
    let edges: Vec<(i32, i32)> = (0..numbering.num_groups)
        .flat_map(|g| {
            adjacency
                .successors(g)
                .iter()
                .map(move |&v| (g as i32, v))
        })
        .collect();

    let wire_count = numbering
        .kind_by_group
        .iter()
        .filter(|k| k.is_wire_group())
        .count();

    let mut permutation = gorder::bfs_relabel(0, wire_count, &edges);
    permutation.extend(gorder::bfs_relabel(
        wire_count,
        numbering.num_groups,
        &edges,
    ));
    permutation
}

fn apply_permutation(index_image: &mut [i32], adjacency: &mut SparseMat, permutation: &[usize]) {
    for id in index_image.iter_mut() {
        if *id >= 0 {
            *id = permutation[*id as usize] as i32;
        }
    }

    let edges: Vec<(i32, i32)> = (0..adjacency.n)
        .flat_map(|g| {
            let new_u = permutation[g] as i32;
            adjacency
                .successors(g)
                .iter()
                .map(move |&v| (new_u, permutation[v as usize] as i32))
                .collect::<Vec<_>>()
        })
        .collect();
    *adjacency = SparseMat::from_edges(adjacency.n, edges);
}

fn finish(
    index_image: Vec<i32>,
    adjacency: SparseMat,
    numbering: &Numbering,
    permutation: &[usize],
    invalid_pixels: Vec<(usize, usize, Ink)>,
) -> Preprocessed {
    let in_degree = adjacency.in_degrees();
    let num_groups = numbering.num_groups;

    let mut kind_by_group = vec![Ink::None; num_groups];
    let mut clock_half_period = vec![0u16; num_groups];
    for (old_id, &kind) in numbering.kind_by_group.iter().enumerate() {
        kind_by_group[permutation[old_id]] = kind;
        clock_half_period[permutation[old_id]] = numbering.clock_half_period_by_group[old_id];
    }

    let initial_ink = kind_by_group.iter().map(|k| k.to_byte(false)).collect();
    let initial_frontier = (0..num_groups)
        .filter(|&g| kind_by_group[g].active_with_no_inputs() || kind_by_group[g] == Ink::Clock)
        .map(|g| g as i32)
        .collect();

    Preprocessed {
        index_image,
        num_groups,
        adjacency,
        in_degree,
        initial_ink,
        initial_frontier,
        invalid_pixels,
        clock_half_period,
    }
}
