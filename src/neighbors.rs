//! Proximity search over agent positions.
//!
//! Two strategies produce identical result sets: the full pairwise distance
//! matrix, and a uniform grid whose cells are at least one radius wide so
//! that only the 3x3 block of cells around an agent needs to be scanned.

use serde::{Deserialize, Serialize};

/// Upper bound on the number of grid columns (and rows).
const MAX_GRID_COLS: usize = 1024;

/// Proximity search strategy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborSearch {
    /// Full pairwise distance matrix, rebuilt on every query.
    #[default]
    Pairwise,
    /// Uniform grid buckets, rebuilt on every query.
    Grid,
}

impl NeighborSearch {
    /// Find the agents close to any of the agents in `query`.
    ///
    /// An agent is close to another one when their Euclidean distance is
    /// strictly less than `radius`; no agent is close to itself. Returns the
    /// sorted union of the neighbor sets, without duplicates. All positions
    /// must lie in `[0, bound] x [0, bound]`.
    pub fn find_nearby(
        &self,
        positions: &[(f64, f64)],
        radius: f64,
        bound: f64,
        query: &[usize],
    ) -> Vec<usize> {
        let mut nearby = Vec::new();
        match self {
            NeighborSearch::Pairwise => {
                let dist_mat = distance_matrix(positions);
                let n_agt = positions.len();
                for &i_agt in query {
                    let row = &dist_mat[i_agt * n_agt..(i_agt + 1) * n_agt];
                    nearby.extend(
                        row.iter()
                            .enumerate()
                            .filter(|&(j_agt, &dist)| j_agt != i_agt && dist < radius)
                            .map(|(j_agt, _)| j_agt),
                    );
                }
            }
            NeighborSearch::Grid => {
                let grid = SpatialGrid::build(positions, radius, bound);
                for &i_agt in query {
                    grid.query_into(positions, i_agt, radius, &mut nearby);
                }
            }
        }
        nearby.sort_unstable();
        nearby.dedup();
        nearby
    }
}

/// Euclidean distance between two points.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Row-major `n x n` matrix of the distances between all pairs of points.
pub fn distance_matrix(positions: &[(f64, f64)]) -> Vec<f64> {
    let n_agt = positions.len();
    let mut dist_mat = vec![0.0; n_agt * n_agt];
    for i_agt in 0..n_agt {
        for j_agt in (i_agt + 1)..n_agt {
            let dist = distance(positions[i_agt], positions[j_agt]);
            dist_mat[i_agt * n_agt + j_agt] = dist;
            dist_mat[j_agt * n_agt + i_agt] = dist;
        }
    }
    dist_mat
}

/// Uniform grid over the square arena.
///
/// Agents are bucketed by cell using the offset array layout:
/// `cell_offsets[i]..cell_offsets[i + 1]` indexes the agents of cell `i`
/// in `agt_indices`.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cols: usize,
    cell_offsets: Vec<usize>,
    agt_indices: Vec<usize>,
}

impl SpatialGrid {
    /// Bucket `positions` into cells of side at least `radius`.
    pub fn build(positions: &[(f64, f64)], radius: f64, bound: f64) -> Self {
        let cell_size = radius.max(bound / MAX_GRID_COLS as f64);
        let cols = ((bound / cell_size).ceil() as usize).clamp(1, MAX_GRID_COLS);
        let n_cells = cols * cols;

        let mut grid = Self {
            cell_size,
            cols,
            cell_offsets: vec![0; n_cells + 1],
            agt_indices: vec![0; positions.len()],
        };

        let cell_idxs: Vec<usize> = positions
            .iter()
            .map(|&(x, y)| {
                let (cx, cy) = grid.cell_coords(x, y);
                cy * cols + cx
            })
            .collect();

        let mut counts = vec![0; n_cells];
        for &idx in &cell_idxs {
            counts[idx] += 1;
        }
        let mut total = 0;
        for (idx, &count) in counts.iter().enumerate() {
            grid.cell_offsets[idx] = total;
            total += count;
        }
        grid.cell_offsets[n_cells] = total;

        let mut write_offsets = grid.cell_offsets[..n_cells].to_vec();
        for (i_agt, &idx) in cell_idxs.iter().enumerate() {
            grid.agt_indices[write_offsets[idx]] = i_agt;
            write_offsets[idx] += 1;
        }

        grid
    }

    /// Cell column and row of a point, with points on the far edges folded
    /// into the last cell.
    fn cell_coords(&self, x: f64, y: f64) -> (usize, usize) {
        let last = self.cols - 1;
        let cx = ((x / self.cell_size) as usize).min(last);
        let cy = ((y / self.cell_size) as usize).min(last);
        (cx, cy)
    }

    fn cell(&self, cx: usize, cy: usize) -> &[usize] {
        let idx = cy * self.cols + cx;
        &self.agt_indices[self.cell_offsets[idx]..self.cell_offsets[idx + 1]]
    }

    /// Append the agents strictly closer than `radius` to agent `i_agt`.
    pub fn query_into(
        &self,
        positions: &[(f64, f64)],
        i_agt: usize,
        radius: f64,
        out: &mut Vec<usize>,
    ) {
        let pos = positions[i_agt];
        let (cx, cy) = self.cell_coords(pos.0, pos.1);
        let last = self.cols - 1;
        for ny in cy.saturating_sub(1)..=(cy + 1).min(last) {
            for nx in cx.saturating_sub(1)..=(cx + 1).min(last) {
                out.extend(
                    self.cell(nx, ny)
                        .iter()
                        .copied()
                        .filter(|&j_agt| {
                            j_agt != i_agt && distance(pos, positions[j_agt]) < radius
                        }),
                );
            }
        }
    }
}
