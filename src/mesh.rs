//! Hexahedral mesh accumulator and the field → mesh emitter.
//!
//! Every voxel becomes one hexahedron with 8 fresh points; coincident corners
//! of neighbouring voxels are duplicated (see `weld` for the opt-in merge).

use serde::{Deserialize, Serialize};

use crate::bounds::{Axis, ensure_increasing};
use crate::field::EscapeTimeField;
use crate::{Error, Result};

/// Name of the per-cell step-count array.
pub const NSTEPS_ARRAY: &str = "nsteps";

/// Corner offsets of a hexahedron, bottom face then top face, both
/// counter-clockwise seen from +z.
pub const CORNER_OFFSETS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    Hexahedron,
}

impl CellType {
    /// VTK cell type code.
    pub fn vtk_code(self) -> u8 {
        match self {
            CellType::Hexahedron => 12,
        }
    }

    pub fn corner_count(self) -> usize {
        match self {
            CellType::Hexahedron => 8,
        }
    }
}

/// A named array with one value per cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellScalars {
    pub name: String,
    pub values: Vec<u16>,
}

impl CellScalars {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Smallest and largest value, or `None` when empty.
    pub fn range(&self) -> Option<(u16, u16)> {
        let min = self.values.iter().copied().min()?;
        let max = self.values.iter().copied().max()?;
        Some((min, max))
    }
}

/// Points, hexahedral cells and the `"nsteps"` cell array of one rank.
///
/// Invariants: `scalars.values.len() == cells.len()` and every cell index is
/// below `points.len()`.
#[derive(Clone, Debug, PartialEq)]
pub struct HexMesh {
    points: Vec<[f32; 3]>,
    cells: Vec<[u32; 8]>,
    cell_type: CellType,
    scalars: CellScalars,
    active_scalars: Option<String>,
}

impl Default for HexMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl HexMesh {
    /// Empty mesh with an empty `"nsteps"` array and no active scalars.
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            cells: Vec::new(),
            cell_type: CellType::Hexahedron,
            scalars: CellScalars::new(NSTEPS_ARRAY),
            active_scalars: None,
        }
    }

    pub(crate) fn from_parts(
        points: Vec<[f32; 3]>,
        cells: Vec<[u32; 8]>,
        scalars: CellScalars,
        active_scalars: Option<String>,
    ) -> Self {
        debug_assert_eq!(cells.len(), scalars.values.len());
        Self {
            points,
            cells,
            cell_type: CellType::Hexahedron,
            scalars,
            active_scalars,
        }
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    pub fn cells(&self) -> &[[u32; 8]] {
        &self.cells
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn scalars(&self) -> &CellScalars {
        &self.scalars
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up a cell array by name.
    pub fn cell_array(&self, name: &str) -> Option<&CellScalars> {
        (self.scalars.name == name).then_some(&self.scalars)
    }

    pub fn active_scalars(&self) -> Option<&str> {
        self.active_scalars.as_deref()
    }

    /// The active cell array, if one is selected.
    pub fn active_array(&self) -> Option<&CellScalars> {
        self.active_scalars().and_then(|name| self.cell_array(name))
    }

    /// Select the cell array downstream stages should use.
    pub fn set_active_scalars(&mut self, name: &str) -> Result<()> {
        if self.cell_array(name).is_none() {
            return Err(Error::UnknownScalars(name.to_string()));
        }
        self.active_scalars = Some(name.to_string());
        Ok(())
    }

    /// Append one hexahedron per voxel of `field`.
    ///
    /// All grid lines are checked before anything is pushed, so a failed
    /// call leaves the mesh untouched.
    pub fn append_field(&mut self, field: &EscapeTimeField) -> Result<()> {
        let [nx, ny, nz] = field.dims();
        let bounds = field.bounds();

        let xs = bounds.grid_lines(Axis::X, nx);
        let ys = bounds.grid_lines(Axis::Y, ny);
        let zs = bounds.grid_lines(Axis::Z, nz);
        for (axis, lines) in [(Axis::X, &xs), (Axis::Y, &ys), (Axis::Z, &zs)] {
            for w in lines.windows(2) {
                ensure_increasing(axis, w[0], w[1])?;
            }
        }

        let voxels = field.voxel_count();
        let total = voxels
            .checked_mul(8)
            .and_then(|n| n.checked_add(self.points.len()))
            .ok_or(Error::IndexOverflow(usize::MAX))?;
        if total > u32::MAX as usize {
            return Err(Error::IndexOverflow(total));
        }

        self.points.reserve(voxels * 8);
        self.cells.reserve(voxels);
        self.scalars.values.reserve(voxels);

        let counts = field.step_counts();
        for zi in 0..nz {
            for yi in 0..ny {
                for xi in 0..nx {
                    let base = self.points.len() as u32;
                    for (dx, dy, dz) in CORNER_OFFSETS {
                        self.points.push([xs[xi + dx], ys[yi + dy], zs[zi + dz]]);
                    }
                    self.cells.push(std::array::from_fn(|k| base + k as u32));
                    self.scalars.values.push(counts[field.voxel_index(xi, yi, zi)]);
                }
            }
        }

        log::trace!(
            "appended {} cells, mesh now {} points / {} cells",
            voxels,
            self.points.len(),
            self.cells.len()
        );
        Ok(())
    }
}

/// Emit `field` into `mesh`, or into a fresh mesh when `mesh` is `None`.
pub fn emit(field: &EscapeTimeField, mesh: Option<HexMesh>) -> Result<HexMesh> {
    let mut mesh = mesh.unwrap_or_default();
    mesh.append_field(field)?;
    Ok(mesh)
}
