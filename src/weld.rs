//! Opt-in merge of coincident mesh points.

use std::collections::HashMap;

use crate::mesh::HexMesh;

/// Merge points whose coordinates are bit-identical.
///
/// The first occurrence of each position keeps its place; later copies are
/// dropped and cells are re-pointed at the survivor. Cell order and scalars
/// are unchanged.
pub fn weld_points(mesh: &HexMesh) -> HexMesh {
    let mut lookup: HashMap<[u32; 3], u32> = HashMap::with_capacity(mesh.point_count());
    let mut points = Vec::new();
    let mut remap = Vec::with_capacity(mesh.point_count());

    for p in mesh.points() {
        let key = p.map(f32::to_bits);
        let id = *lookup.entry(key).or_insert_with(|| {
            points.push(*p);
            (points.len() - 1) as u32
        });
        remap.push(id);
    }

    let cells = mesh
        .cells()
        .iter()
        .map(|cell| cell.map(|i| remap[i as usize]))
        .collect();

    log::debug!(
        "welded {} points down to {}",
        mesh.point_count(),
        points.len()
    );

    HexMesh::from_parts(
        points,
        cells,
        mesh.scalars().clone(),
        mesh.active_scalars().map(str::to_string),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use crate::field::EscapeTimeField;
    use crate::mesh::emit;

    #[test]
    fn two_voxels_share_a_face() {
        let field = EscapeTimeField::new(2, 1, 1, Bounds::from_array([0.0, 0.0, 0.0, 2.0, 1.0, 1.0])).unwrap();
        let mesh = emit(&field, None).unwrap();
        let welded = weld_points(&mesh);

        assert_eq!(mesh.point_count(), 16);
        assert_eq!(welded.point_count(), 12);
        assert_eq!(welded.cell_count(), 2);
        assert_eq!(welded.scalars(), mesh.scalars());

        // the first voxel is untouched
        assert_eq!(welded.cells()[0], [0, 1, 2, 3, 4, 5, 6, 7]);
        // the second reuses the shared face at x = 1
        let second = welded.cells()[1];
        assert_eq!(second[0], 1);
        assert_eq!(second[3], 2);
        assert_eq!(second[4], 5);
        assert_eq!(second[7], 6);

        for (cell, orig) in welded.cells().iter().zip(mesh.cells()) {
            for k in 0..8 {
                assert_eq!(welded.points()[cell[k] as usize], mesh.points()[orig[k] as usize]);
            }
        }
    }

    #[test]
    fn full_grid_welds_to_lattice() {
        let field = EscapeTimeField::new(3, 2, 4, Bounds::default()).unwrap();
        let welded = weld_points(&emit(&field, None).unwrap());
        assert_eq!(welded.point_count(), 4 * 3 * 5);
        assert_eq!(welded.cell_count(), 24);
    }
}
