//! Rectilinear spatial grid.

/// Spatial coordinates of a rectilinear `lat x lon` grid.
///
/// Cells are numbered row-major: cell `c` sits at row `c / nx`, column
/// `c % nx`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    lats: Vec<f64>,
    lons: Vec<f64>,
}

impl Grid {
    /// Creates a grid from its latitude (row) and longitude (column) axes.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>) -> Self {
        Self { lats, lons }
    }

    /// A grid of `ny x nx` cells with index-valued coordinates.
    pub fn with_shape(ny: usize, nx: usize) -> Self {
        Self {
            lats: (0..ny).map(|i| i as f64).collect(),
            lons: (0..nx).map(|i| i as f64).collect(),
        }
    }

    /// Latitude of each row.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitude of each column.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// `(ny, nx)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.lats.len() * self.lons.len()
    }

    /// Latitude of cell `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= self.n_cells()`.
    pub fn cell_lat(&self, cell: usize) -> f64 {
        self.lats[cell / self.lons.len()]
    }

    /// Longitude of cell `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= self.n_cells()`.
    pub fn cell_lon(&self, cell: usize) -> f64 {
        self.lons[cell % self.lons.len()]
    }
}
