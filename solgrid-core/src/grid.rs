//! Regular square grids over a study extent.
//!
//! [`Grid::build`] partitions an [`Extent`] into fixed-size square cells
//! with stable identifiers. Cells are always full squares; the tiling
//! stops at the last full step inside the extent, so the grid may
//! under-cover the extent by up to one cell width per axis rather than
//! emit clipped boundary cells.
//!
//! # Examples
//! ```
//! use solgrid_core::{Crs, Extent, Grid};
//!
//! let extent = Extent::new(0.0, 0.0, 10_000.0, 10_000.0)?;
//! let grid = Grid::build(&extent, 5_000.0, Crs::new(32724))?;
//! assert_eq!(grid.cells().len(), 4);
//! assert_eq!(grid.cells()[0].id, "cell_0_0");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use geo::{Area, Coord, Rect};
use thiserror::Error;

use crate::{Crs, Extent};

/// Errors returned by [`Grid::build`].
#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    /// The cell size was zero, negative, or non-finite.
    #[error("cell size must be a positive, finite number of metres, got {cell_size_m}")]
    InvalidCellSize {
        /// The rejected cell size.
        cell_size_m: f64,
    },
    /// The extent is narrower than one cell on some axis.
    #[error("extent {extent:?} cannot fit a single {cell_size_m} m cell")]
    ExtentTooSmall {
        /// The extent that was tiled.
        extent: Extent,
        /// The requested cell size.
        cell_size_m: f64,
    },
}

/// One square partition of a [`Grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Stable identifier, `cell_{i}_{j}` for grid position `(i, j)`.
    pub id: String,
    /// Square cell geometry, side `cell_size_m`.
    pub geometry: Rect<f64>,
    /// Geometric centre of the cell, derived from the geometry.
    pub centroid: Coord<f64>,
    /// Cell area in square kilometres, derived from the geometry.
    pub area_km2: f64,
    /// Grid-level cell edge length in kilometres.
    pub cell_size_km: f64,
}

/// An ordered collection of square cells sharing one reference and size.
///
/// Immutable after construction; feature columns attach to cells by id,
/// never by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    crs: Crs,
    cell_size_m: f64,
    cells: Vec<Cell>,
}

/// Tolerance applied when counting whole steps, so an extent that is an
/// exact multiple of the cell size yields its full complement of cells
/// despite floating-point division.
const STEP_EPSILON: f64 = 1e-9;

impl Grid {
    /// Tile `extent` with square cells of side `cell_size_m`.
    ///
    /// Cells advance from `(min_x, min_y)` in steps of `cell_size_m`,
    /// column index `i` along x and row index `j` along y, stopping at the
    /// last full step inside the extent. Identifiers are a pure function
    /// of `(i, j)`: rebuilding the same extent and cell size yields
    /// identical ids in identical positions.
    ///
    /// # Errors
    /// Rejects a non-positive or non-finite `cell_size_m`, and an extent
    /// too small to fit a single cell, before emitting any cell.
    pub fn build(extent: &Extent, cell_size_m: f64, crs: Crs) -> Result<Self, GridError> {
        if !cell_size_m.is_finite() || cell_size_m <= 0.0 {
            return Err(GridError::InvalidCellSize { cell_size_m });
        }

        let columns = whole_steps(extent.width(), cell_size_m);
        let rows = whole_steps(extent.height(), cell_size_m);
        if columns == 0 || rows == 0 {
            return Err(GridError::ExtentTooSmall {
                extent: *extent,
                cell_size_m,
            });
        }

        let cell_size_km = cell_size_m / 1000.0;
        let mut cells = Vec::with_capacity(columns as usize * rows as usize);
        for i in 0..columns {
            for j in 0..rows {
                let origin = Coord {
                    x: extent.min_x() + f64::from(i) * cell_size_m,
                    y: extent.min_y() + f64::from(j) * cell_size_m,
                };
                let geometry = Rect::new(
                    origin,
                    Coord {
                        x: origin.x + cell_size_m,
                        y: origin.y + cell_size_m,
                    },
                );
                cells.push(Cell {
                    id: cell_id(i, j),
                    centroid: geometry.center(),
                    area_km2: geometry.unsigned_area() / 1.0e6,
                    cell_size_km,
                    geometry,
                });
            }
        }

        Ok(Self {
            crs,
            cell_size_m,
            cells,
        })
    }

    /// The grid's coordinate reference.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// Cell edge length in metres.
    #[must_use]
    pub const fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    /// Cell edge length in kilometres.
    #[must_use]
    pub fn cell_size_km(&self) -> f64 {
        self.cell_size_m / 1000.0
    }

    /// The cells in build order (column-major from the extent origin).
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Look up a cell by identifier.
    #[must_use]
    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.id == id)
    }
}

/// Identifier for the cell at grid position `(i, j)`.
#[must_use]
pub fn cell_id(i: u32, j: u32) -> String {
    format!("cell_{i}_{j}")
}

/// Number of whole `step`-sized strides that fit in `span`.
fn whole_steps(span: f64, step: f64) -> u32 {
    let steps = (span / step + STEP_EPSILON).floor();
    if steps <= 0.0 {
        0
    } else {
        // The span/step ratio for any practical extent fits comfortably
        // in u32; saturate rather than wrap for absurd inputs.
        if steps >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            steps as u32
        }
    }
}
