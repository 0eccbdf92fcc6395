//! Connected-component extraction over the pixel grid, `spec.md` §4.B
//! step 2.

use crate::ink::Ink;
use crate::pixel::Image;

/// A maximal connected region of same-kind pixels, before group
/// numbering assigns it one (or, for `Bundle`, sixty-four) group ids.
pub struct Region {
    pub kind: Ink,
    pub pixels: Vec<usize>,
}

/// Flood-fills `image` into regions. Adjacency: two pixels of identical
/// normalized ink are always connected; a `Cross`/`Tunnel` pixel is
/// looked *through* along the straight line it sits on, connecting the
/// pixel on each side directly if they share a kind, and is otherwise
/// never itself part of a region (`spec.md` §4.B step 2, §9).
///
/// Returns the regions and a region-id per pixel (`usize::MAX` for
/// pixels that own no region: `None`, `Filler`, `Annotation`, `Cross`,
/// `Tunnel`, and any `Invalid*` ink).
pub fn find_regions(image: &Image) -> (Vec<Region>, Vec<usize>) {
    const NONE: usize = usize::MAX;
    let mut region_of = vec![NONE; image.pixels.len()];
    let mut regions = Vec::new();

    for start in 0..image.pixels.len() {
        if region_of[start] != NONE {
            continue;
        }
        let kind = image.pixels[start].ink;
        if !kind.is_connective() {
            continue;
        }

        let mut pixels = Vec::new();
        let mut stack = vec![start];
        region_of[start] = regions.len();

        while let Some(p) = stack.pop() {
            pixels.push(p);
            let (x, y) = (p % image.width, p / image.width);
            for neighbor in connected_neighbors(image, x, y, kind) {
                if region_of[neighbor] == NONE {
                    region_of[neighbor] = regions.len();
                    stack.push(neighbor);
                }
            }
        }

        regions.push(Region { kind, pixels });
    }

    (regions, region_of)
}

/// The pixel indices directly connected to `(x, y)` (which has ink
/// `kind`), looking through at most one `Cross`/`Tunnel` cell per
/// direction.
fn connected_neighbors(image: &Image, x: usize, y: usize, kind: Ink) -> Vec<usize> {
    let mut result = Vec::with_capacity(4);
    for (dx, dy) in [(-1i32, 0i32), (1, 0), (0, -1), (0, 1)] {
        let Some((nx, ny)) = step(image, x, y, dx, dy) else {
            continue;
        };
        let neighbor = image.get(nx, ny);

        if neighbor.ink.is_crossing() {
            let Some((nx2, ny2)) = step(image, nx, ny, dx, dy) else {
                continue;
            };
            let through = image.get(nx2, ny2);
            if through.ink == kind {
                result.push(image.index_of(nx2, ny2));
            }
        } else if neighbor.ink == kind {
            result.push(image.index_of(nx, ny));
        }
    }
    result
}

fn step(image: &Image, x: usize, y: usize, dx: i32, dy: i32) -> Option<(usize, usize)> {
    let nx = x as i32 + dx;
    let ny = y as i32 + dy;
    if nx < 0 || ny < 0 || nx as usize >= image.width || ny as usize >= image.height {
        None
    } else {
        Some((nx as usize, ny as usize))
    }
}
