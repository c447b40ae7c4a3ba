use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grid geometry
// ---------------------------------------------------------------------------

pub const GRID_SIZE: usize = 64;
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;

pub const CELL_SAFE: u8 = 255;
pub const CELL_UNSAFE: u8 = 0;

/// World units to cell index: `floor(world * scale)`.
pub const DEFAULT_CELL_SCALE: f64 = 1.0 / GRID_SIZE as f64;

/// How a world position is tested against the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    /// Two independent lookups into the flat grid: `cells[ix]` and `cells[iz]`.
    /// This is what the perception pipeline has always been checked against;
    /// it is not a 2-D membership test.
    #[default]
    Projected,
    /// Cell at column `ix`, row `iz`.
    Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub scale: f64,
    pub validity: Validity,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_CELL_SCALE,
            validity: Validity::Projected,
        }
    }
}

// ---------------------------------------------------------------------------
// Centroid
// ---------------------------------------------------------------------------

/// Recommended landing point from the perception process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Centroid {
    /// Cell coordinates inside the grid.
    pub local: (usize, usize),
    /// World coordinates.
    pub global: (i64, i64),
}

// ---------------------------------------------------------------------------
// HazardMap
// ---------------------------------------------------------------------------

/// 64x64 safe/unsafe grid plus centroid. Immutable once built; a new
/// datagram produces a new map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardMap {
    cells: Box<[u8]>,
    centroid: Centroid,
}

impl HazardMap {
    /// Build from a row-major flat grid. Returns `None` if the length is not
    /// `GRID_CELLS`, any cell is outside {0, 255}, or the local centroid is
    /// off-grid.
    pub fn new(cells: Vec<u8>, centroid: Centroid) -> Option<Self> {
        if cells.len() != GRID_CELLS {
            return None;
        }
        if cells.iter().any(|&c| c != CELL_SAFE && c != CELL_UNSAFE) {
            return None;
        }
        let (cx, cy) = centroid.local;
        if cx >= GRID_SIZE || cy >= GRID_SIZE {
            return None;
        }
        Some(Self {
            cells: cells.into_boxed_slice(),
            centroid,
        })
    }

    /// Every cell set to `value` with the given centroid. Test and tooling
    /// helper.
    pub fn filled(value: u8, centroid: Centroid) -> Option<Self> {
        Self::new(vec![value; GRID_CELLS], centroid)
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn centroid(&self) -> Centroid {
        self.centroid
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<u8> {
        if col >= GRID_SIZE || row >= GRID_SIZE {
            return None;
        }
        self.cells.get(row * GRID_SIZE + col).copied()
    }

    pub fn safe_cell_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == CELL_SAFE).count()
    }

    /// Whether the vehicle's horizontal position lands on safe ground.
    /// Anything off-grid is unsafe.
    pub fn is_valid_landing(&self, x: f64, z: f64, config: &HazardConfig) -> bool {
        let (Some(ix), Some(iz)) = (
            world_to_index(x, config.scale),
            world_to_index(z, config.scale),
        ) else {
            return false;
        };
        match config.validity {
            Validity::Projected => {
                self.cells[ix] == CELL_SAFE && self.cells[iz] == CELL_SAFE
            }
            Validity::Cell => self.cell(ix, iz) == Some(CELL_SAFE),
        }
    }
}

/// `floor(world * scale)` if it falls within `0..GRID_SIZE`.
pub fn world_to_index(world: f64, scale: f64) -> Option<usize> {
    let idx = (world * scale).floor();
    if !idx.is_finite() || idx < 0.0 || idx >= GRID_SIZE as f64 {
        return None;
    }
    Some(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centroid() -> Centroid {
        Centroid {
            local: (10, 20),
            global: (500, 600),
        }
    }

    #[test]
    fn rejects_malformed_grids() {
        assert!(HazardMap::new(vec![CELL_SAFE; GRID_CELLS - 1], centroid()).is_none());
        let mut cells = vec![CELL_SAFE; GRID_CELLS];
        cells[7] = 1;
        assert!(HazardMap::new(cells, centroid()).is_none());
        let off = Centroid {
            local: (64, 0),
            global: (0, 0),
        };
        assert!(HazardMap::filled(CELL_SAFE, off).is_none());
    }

    #[test]
    fn world_index_floor_and_bounds() {
        assert_eq!(world_to_index(0.0, DEFAULT_CELL_SCALE), Some(0));
        assert_eq!(world_to_index(63.9, DEFAULT_CELL_SCALE), Some(0));
        assert_eq!(world_to_index(64.0, DEFAULT_CELL_SCALE), Some(1));
        assert_eq!(world_to_index(4095.0, DEFAULT_CELL_SCALE), Some(63));
        assert_eq!(world_to_index(4096.0, DEFAULT_CELL_SCALE), None);
        assert_eq!(world_to_index(-0.5, DEFAULT_CELL_SCALE), None);
        assert_eq!(world_to_index(f64::NAN, DEFAULT_CELL_SCALE), None);
    }

    #[test]
    fn projected_validity_checks_both_flat_cells() {
        let cfg = HazardConfig::default();
        let mut cells = vec![CELL_SAFE; GRID_CELLS];
        // x = 200 -> index 3, z = 320 -> index 5
        cells[5] = CELL_UNSAFE;
        let map = HazardMap::new(cells, centroid()).unwrap();
        assert!(!map.is_valid_landing(200.0, 320.0, &cfg));
        assert!(map.is_valid_landing(200.0, 200.0, &cfg));
        assert!(!map.is_valid_landing(320.0, 200.0, &cfg));
    }

    #[test]
    fn off_grid_is_unsafe() {
        let map = HazardMap::filled(CELL_SAFE, centroid()).unwrap();
        let cfg = HazardConfig::default();
        assert!(!map.is_valid_landing(-10.0, 100.0, &cfg));
        assert!(!map.is_valid_landing(100.0, 1.0e6, &cfg));
    }

    #[test]
    fn cell_mode_is_two_dimensional() {
        let mut cells = vec![CELL_UNSAFE; GRID_CELLS];
        // column 3, row 5
        cells[5 * GRID_SIZE + 3] = CELL_SAFE;
        let map = HazardMap::new(cells, centroid()).unwrap();
        let cell_mode = HazardConfig {
            validity: Validity::Cell,
            ..HazardConfig::default()
        };
        assert!(map.is_valid_landing(200.0, 320.0, &cell_mode));
        assert!(!map.is_valid_landing(320.0, 200.0, &cell_mode));
        assert!(!map.is_valid_landing(200.0, 320.0, &HazardConfig::default()));
        assert_eq!(map.safe_cell_count(), 1);
    }
}
