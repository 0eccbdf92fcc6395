//! The compressed-sparse-column adjacency matrix, `spec.md` §3 `writeMap`
//! / `original_source/openVCB.h`'s `SparseMat`.

use std::collections::BTreeSet;

/// `writeMap`: an edge `u -> v` means "a state change in `u` must mark `v`
/// as needing re-evaluation." Stored compressed-sparse-column so that
/// `successors(g)` — the hot path walked once per active group per tick —
/// is one contiguous slice.
#[derive(Debug, Clone)]
pub struct SparseMat {
    /// Number of groups (rows == columns, it's a square adjacency matrix).
    pub n: usize,
    /// `ptr[g]..ptr[g + 1]` indexes into `rows` for column `g`'s edges.
    /// Length `n + 1`.
    pub ptr: Vec<i32>,
    /// Target group ids, column-major, sorted within each column.
    pub rows: Vec<i32>,
}

impl SparseMat {
    /// Builds a CSC matrix from an edge list, deduplicating and sorting
    /// as `spec.md` §4.B step 4 requires.
    pub fn from_edges(n: usize, edges: impl IntoIterator<Item = (i32, i32)>) -> SparseMat {
        let mut by_column: Vec<BTreeSet<i32>> = vec![BTreeSet::new(); n];
        for (u, v) in edges {
            if u != v {
                by_column[u as usize].insert(v);
            }
        }

        let mut ptr = Vec::with_capacity(n + 1);
        let mut rows = Vec::new();
        ptr.push(0);
        for column in &by_column {
            rows.extend(column.iter().copied());
            ptr.push(rows.len() as i32);
        }

        SparseMat { n, ptr, rows }
    }

    /// The successors of group `g`: groups that must be re-evaluated when
    /// `g`'s state changes.
    pub fn successors(&self, g: usize) -> &[i32] {
        let start = self.ptr[g] as usize;
        let end = self.ptr[g + 1] as usize;
        &self.rows[start..end]
    }

    /// Number of non-zero entries (edges).
    pub fn nnz(&self) -> usize {
        self.rows.len()
    }

    /// In-degree of every group, used by `And`/`Nand` evaluation to know
    /// how many predecessors must all be active (`spec.md` §4.D).
    pub fn in_degrees(&self) -> Vec<i32> {
        let mut degrees = vec![0i32; self.n];
        for &v in &self.rows {
            degrees[v as usize] += 1;
        }
        degrees
    }
}
