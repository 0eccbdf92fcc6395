//! Cache-friendly group relabeling, `spec.md` §4.B step 3 (`useGorder`).
//!
//! The original tunes a dedicated ordering heuristic that minimizes
//! average edge distance in `writeMap`; that tuning isn't present in
//! `original_source/`, so this rewrite commits to a simpler, still
//! useful approximation: a breadth-first relabeling from the
//! lowest-numbered group in each partition, which tends to place a group
//! near the successors it was discovered from.
//!
//! Resolved as an Open Question in `DESIGN.md`.

use std::collections::VecDeque;

/// Returns a permutation `new_id[old_id]` for the half-open range
/// `[start, end)` of group ids, relabeling in BFS order over `edges`
/// (both directions are followed, since cache locality cares about
/// adjacency, not direction). Ids outside `[start, end)` are untouched.
pub fn bfs_relabel(start: usize, end: usize, edges: &[(i32, i32)]) -> Vec<usize> {
    let n = end - start;
    let mut adjacency = vec![Vec::new(); n];
    for &(u, v) in edges {
        let (u, v) = (u as usize, v as usize);
        if (start..end).contains(&u) && (start..end).contains(&v) {
            adjacency[u - start].push(v - start);
            adjacency[v - start].push(u - start);
        }
    }

    let mut new_id = vec![usize::MAX; n];
    let mut next = 0;
    for root in 0..n {
        if new_id[root] != usize::MAX {
            continue;
        }
        let mut queue = VecDeque::from([root]);
        new_id[root] = next + start;
        next += 1;
        while let Some(node) = queue.pop_front() {
            for &neighbor in &adjacency[node] {
                if new_id[neighbor] == usize::MAX {
                    new_id[neighbor] = next + start;
                    next += 1;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    new_id
}
