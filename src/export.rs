//! Flat unstructured-volume buffers for a renderer.

use crate::mesh::HexMesh;

/// Flattened copy of a [`HexMesh`].
///
/// `cell_index[i]` is the offset of cell `i` in `index`; for an all-hex mesh
/// that is `8 * i`. `cell_data` carries the active scalars (or `"nsteps"`
/// when none is selected) widened to `f32`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnstructuredVolume {
    pub vertex_position: Vec<f32>,
    pub index: Vec<u32>,
    pub cell_index: Vec<u32>,
    pub cell_type: Vec<u8>,
    pub cell_data: Vec<f32>,
    pub value_range: Option<(f32, f32)>,
}

impl UnstructuredVolume {
    pub fn from_mesh(mesh: &HexMesh) -> Self {
        let corners = mesh.cell_type().corner_count();
        let code = mesh.cell_type().vtk_code();
        let array = mesh.active_array().unwrap_or(mesh.scalars());

        let vertex_position = bytemuck::cast_slice::<[f32; 3], f32>(mesh.points()).to_vec();
        let index = bytemuck::cast_slice::<[u32; 8], u32>(mesh.cells()).to_vec();
        let cell_index = (0..mesh.cell_count())
            .map(|i| (i * corners) as u32)
            .collect();
        let cell_type = vec![code; mesh.cell_count()];
        let cell_data = array.values.iter().map(|&v| f32::from(v)).collect();
        let value_range = array
            .range()
            .map(|(lo, hi)| (f32::from(lo), f32::from(hi)));

        Self {
            vertex_position,
            index,
            cell_index,
            cell_type,
            cell_data,
            value_range,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_position.len() / 3
    }

    pub fn cell_count(&self) -> usize {
        self.cell_type.len()
    }

    pub fn vertex_position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertex_position)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.index)
    }

    pub fn cell_data_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cell_data)
    }
}

impl From<&HexMesh> for UnstructuredVolume {
    fn from(mesh: &HexMesh) -> Self {
        Self::from_mesh(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use crate::field::EscapeTimeField;
    use crate::mesh::{NSTEPS_ARRAY, emit};

    #[test]
    fn buffer_sizes_and_offsets() {
        let mut field = EscapeTimeField::new(3, 2, 2, Bounds::default()).unwrap();
        field.advance(6);
        let mut mesh = emit(&field, None).unwrap();
        mesh.set_active_scalars(NSTEPS_ARRAY).unwrap();

        let vol = UnstructuredVolume::from_mesh(&mesh);
        assert_eq!(vol.cell_count(), 12);
        assert_eq!(vol.vertex_count(), 96);
        assert_eq!(vol.vertex_position.len(), 96 * 3);
        assert_eq!(vol.index.len(), 96);
        assert_eq!(vol.cell_index, (0..12).map(|i| i * 8).collect::<Vec<u32>>());
        assert!(vol.cell_type.iter().all(|&t| t == 12));
        assert_eq!(vol.cell_data.len(), 12);

        assert_eq!(&vol.vertex_position[3..6], &mesh.points()[1]);
        assert_eq!(&vol.index[8..16], &mesh.cells()[1]);

        let (lo, hi) = vol.value_range.unwrap();
        assert!(lo <= hi);
        assert!(vol.cell_data.iter().all(|&v| v >= lo && v <= hi));
        assert_eq!(vol.vertex_position_bytes().len(), 96 * 3 * 4);
        assert_eq!(vol.index_bytes().len(), 96 * 4);
        assert_eq!(vol.cell_data_bytes().len(), 12 * 4);
    }

    #[test]
    fn empty_mesh_exports_empty_buffers() {
        let vol = UnstructuredVolume::from(&crate::mesh::HexMesh::new());
        assert_eq!(vol, UnstructuredVolume::default());
    }
}
