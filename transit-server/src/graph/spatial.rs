//! Uniform-grid spatial index over stop coordinates.
//!
//! Walking-edge construction needs "stops near this stop" queries for every
//! valid stop. Bucketing stops into a coarse grid and scanning only the 3×3
//! cell neighborhood bounds the work per query by local stop density instead
//! of the full quadratic pair scan.

use std::collections::HashMap;

use crate::domain::{Point, haversine_meters};

use super::NodeId;

/// Grid cell side in degrees; roughly 400 m of latitude.
const CELL_SIZE_DEG: f64 = 0.0036;

fn cell_of(point: Point) -> (i64, i64) {
    (
        (point.lat() / CELL_SIZE_DEG).floor() as i64,
        (point.lon() / CELL_SIZE_DEG).floor() as i64,
    )
}

/// Approximate nearest-neighbor index over a fixed stop set.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    cells: HashMap<(i64, i64), Vec<(NodeId, Point)>>,
}

impl SpatialIndex {
    /// Build the index from a stop set.
    pub fn build(stops: impl IntoIterator<Item = (NodeId, Point)>) -> Self {
        let mut cells: HashMap<(i64, i64), Vec<(NodeId, Point)>> = HashMap::new();
        for (node, point) in stops {
            cells.entry(cell_of(point)).or_default().push((node, point));
        }
        Self { cells }
    }

    /// Stops within `radius_m` of `at`, nearest first, at most `max_count`.
    ///
    /// `of` itself is excluded. Only the query point's cell and its eight
    /// neighbors are scanned, so stops slightly inside the radius but beyond
    /// the cell neighborhood can be missed; with a ~400 m cell and the 250 m
    /// walking radius used by the builder, they never are.
    pub fn neighbors(
        &self,
        of: NodeId,
        at: Point,
        radius_m: f64,
        max_count: usize,
    ) -> Vec<(NodeId, f64)> {
        let (cell_lat, cell_lon) = cell_of(at);

        let mut found: Vec<(NodeId, f64)> = Vec::new();
        for d_lat in -1..=1 {
            for d_lon in -1..=1 {
                let Some(bucket) = self.cells.get(&(cell_lat + d_lat, cell_lon + d_lon)) else {
                    continue;
                };
                for &(node, point) in bucket {
                    if node == of {
                        continue;
                    }
                    let distance = haversine_meters(at, point);
                    if distance <= radius_m {
                        found.push((node, distance));
                    }
                }
            }
        }

        // Tie-break equal distances on node id so builds are deterministic.
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        found.truncate(max_count);
        found
    }
}
