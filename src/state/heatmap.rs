use serde::{Deserialize, Serialize};

/// Side length of the movement histogram.
pub const GRID_DIM: usize = 512;

/// Fixed 512x512 visit-count grid. Merging is cell-wise addition, so grids
/// can be combined in any order and grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapGrid {
    cells: Vec<u32>,
}

impl HeatmapGrid {
    pub fn new() -> Self {
        Self {
            cells: vec![0; GRID_DIM * GRID_DIM],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[x * GRID_DIM + y]
    }

    pub fn increment(&mut self, x: usize, y: usize) {
        self.cells[x * GRID_DIM + y] += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    pub fn merge(&mut self, other: &HeatmapGrid) {
        for (cell, add) in self.cells.iter_mut().zip(&other.cells) {
            *cell += add;
        }
    }

    /// Bucket a world position into the grid.
    ///
    /// Positions outside +-(512 * scale) on either horizontal axis are
    /// ignored, as are cells whose doubled index falls off the grid edge.
    /// A scale of zero means the map is unknown and bucketing is disabled
    /// at the call site, but a zero or negative scale here simply rejects
    /// every position.
    pub fn record_position(&mut self, x: f64, z: f64, scale: f64) {
        let bound = 256.0 * scale * 2.0;
        if !(x < bound && x > -bound && z < bound && z > -bound) {
            return;
        }
        let cx = (x / (scale * 4.0) + 128.0).round() as i64;
        let cy = (z / (scale * -4.0) + 128.0).round() as i64;
        let ix = (cx - 1) * 2;
        let iy = (cy - 1) * 2;
        if (0..GRID_DIM as i64).contains(&ix) && (0..GRID_DIM as i64).contains(&iy) {
            self.increment(ix as usize, iy as usize);
        }
    }

    /// Sparse export form: every non-zero cell as an `{x, y, value}` point.
    pub fn to_points(&self) -> Vec<HeatPoint> {
        let mut points = Vec::new();
        for x in 0..GRID_DIM {
            for y in 0..GRID_DIM {
                let value = self.get(x, y);
                if value > 0 {
                    points.push(HeatPoint {
                        x: x as u16,
                        y: y as u16,
                        value,
                    });
                }
            }
        }
        points
    }

    /// Rebuild a grid from a sparse point list. Out-of-range points are
    /// dropped rather than rejected, since persisted files are trusted
    /// only as far as they fit the grid.
    pub fn from_points(points: &[HeatPoint]) -> Self {
        let mut grid = Self::new();
        for p in points {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < GRID_DIM && y < GRID_DIM {
                grid.cells[x * GRID_DIM + y] += p.value;
            }
        }
        grid
    }
}

impl Default for HeatmapGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// One non-zero heatmap cell in the persisted sparse form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub x: u16,
    pub y: u16,
    pub value: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_position_bucketing() {
        let mut grid = HeatmapGrid::new();
        // scale 2: x/8 + 128, z/-8 + 128
        grid.record_position(16.0, -16.0, 2.0);
        // cx = 130, cy = 130 -> cell (258, 258)
        assert_eq!(grid.get(258, 258), 1);
    }

    #[test]
    fn test_out_of_bounds_position_ignored() {
        let mut grid = HeatmapGrid::new();
        grid.record_position(2048.0, 0.0, 2.0); // beyond 512 * scale
        grid.record_position(0.0, -1024.0, 2.0); // exactly on the bound
        assert!(grid.is_empty());
    }

    #[test]
    fn test_edge_cell_dropped() {
        let mut grid = HeatmapGrid::new();
        // cx rounds to 0, doubled index would be -2
        grid.record_position(-1023.0, 0.0, 2.0);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_merge_commutative_and_associative() {
        let mut a = HeatmapGrid::new();
        let mut b = HeatmapGrid::new();
        let mut c = HeatmapGrid::new();
        a.increment(1, 1);
        b.increment(1, 1);
        b.increment(2, 3);
        c.increment(500, 10);

        let mut ab_c = a.clone();
        ab_c.merge(&b);
        ab_c.merge(&c);

        let mut c_ba = c.clone();
        c_ba.merge(&b);
        c_ba.merge(&a);

        assert_eq!(ab_c, c_ba);
        assert_eq!(ab_c.get(1, 1), 2);
    }

    #[test]
    fn test_sparse_round_trip() {
        let mut grid = HeatmapGrid::new();
        grid.increment(0, 0);
        grid.increment(511, 511);
        grid.increment(511, 511);
        let points = grid.to_points();
        assert_eq!(points.len(), 2);
        assert_eq!(HeatmapGrid::from_points(&points), grid);
    }
}
