//! # Higher-order meshes
//!
//! [`LagrangeGrid`] elevates every cell of a base mesh to an arbitrary order Lagrange cell with
//! equispaced nodes. Each elevated cell corresponds to exactly one base cell (same index), and
//! nodes shared between neighbouring cells are stored once.
//!
//! ```
//! use gridwrite::{Grid, LagrangeGrid, Rectilinear2D};
//!
//! let base = Rectilinear2D::uniform([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
//! let elevated = LagrangeGrid::new(&base, 2).unwrap();
//!
//! assert_eq!(elevated.num_cells(), base.num_cells());
//! // a 5 x 5 lattice of nodes
//! assert_eq!(elevated.num_points(), 25);
//! ```

mod nodes;

use crate::mesh::{CellKind, Grid, Point};
use crate::Error;

use std::collections::HashMap;

/// A base mesh elevated to Lagrange cells of a fixed order
#[derive(Debug, Clone)]
pub struct LagrangeGrid<'g, G> {
    base: &'g G,
    order: usize,
    points: Vec<Point>,
    /// first cell that produced each point, with the reference coordinate inside that cell
    hosts: Vec<(usize, Point)>,
    connectivity: Vec<usize>,
    offsets: Vec<usize>,
}

impl<'g, G: Grid> LagrangeGrid<'g, G> {
    pub fn new(base: &'g G, order: usize) -> Result<Self, Error> {
        let mut lattices: HashMap<CellKind, Vec<nodes::Lattice>> = HashMap::new();
        let mut seen: HashMap<Vec<(usize, usize)>, usize> = HashMap::new();

        let mut points = Vec::new();
        let mut hosts = Vec::new();
        let mut connectivity = Vec::new();
        let mut offsets = Vec::with_capacity(base.num_cells() + 1);
        offsets.push(0);

        for element in base.elements() {
            let kind = element.kind();

            if !lattices.contains_key(&kind) {
                lattices.insert(kind, nodes::lattice_nodes(kind, order)?);
            }
            let lattice = &lattices[&kind];

            let corners = base.cell_vertices(element.index());
            let geometry = element.geometry();

            for node in lattice {
                let key = node_key(kind, order, node, &corners);

                let index = match seen.get(&key) {
                    Some(index) => *index,
                    None => {
                        let local = [
                            node[0] as f64 / order as f64,
                            node[1] as f64 / order as f64,
                            node[2] as f64 / order as f64,
                        ];
                        let index = points.len();
                        points.push(geometry.global(&local));
                        hosts.push((element.index(), local));
                        seen.insert(key, index);
                        index
                    }
                };

                connectivity.push(index);
            }

            offsets.push(connectivity.len());
        }

        log::debug!(
            "elevated {} cells to order {order}: {} vertices became {} points",
            base.num_cells(),
            base.num_vertices(),
            points.len()
        );

        Ok(Self {
            base,
            order,
            points,
            hosts,
            connectivity,
            offsets,
        })
    }

    pub fn base(&self) -> &'g G {
        self.base
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn num_cells(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// node indices of a cell, in VTK Lagrange node order
    pub fn cell_points(&self, cell: usize) -> &[usize] {
        &self.connectivity[self.offsets[cell]..self.offsets[cell + 1]]
    }

    pub fn cell_kind(&self, cell: usize) -> CellKind {
        self.base.cell_kind(cell)
    }

    /// the base mesh cell an elevated cell was built from
    pub fn base_cell(&self, cell: usize) -> usize {
        cell
    }

    /// a base cell containing a point, and the reference coordinate of the point inside it
    pub fn point_host(&self, index: usize) -> (usize, Point) {
        self.hosts[index]
    }
}

/// Identifies a node independently of the cell it was generated from: the base vertices it
/// interpolates between, with integer weights.
fn node_key(
    kind: CellKind,
    order: usize,
    node: &nodes::Lattice,
    corners: &[usize],
) -> Vec<(usize, usize)> {
    let mut key: Vec<(usize, usize)> = nodes::corner_weights(kind, order, node)
        .into_iter()
        .zip(corners.iter())
        .filter(|(weight, _)| *weight != 0)
        .map(|(weight, vertex)| (*vertex, weight))
        .collect();

    key.sort_unstable();
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Rectilinear2D, Rectilinear3D, UnstructuredGrid};

    #[test]
    fn order_two_quads_share_nodes() {
        let base = Rectilinear2D::uniform([0., 0.], [1., 1.], [10, 10]).unwrap();
        let grid = LagrangeGrid::new(&base, 2).unwrap();

        assert_eq!(grid.num_cells(), 100);
        assert_eq!(grid.num_points(), 21 * 21);
        assert!(grid.cell_points(0).len() == 9);
    }

    #[test]
    fn order_three_hexahedra() {
        let base = Rectilinear3D::uniform([0.; 3], [1.; 3], [2, 2, 2]).unwrap();
        let grid = LagrangeGrid::new(&base, 3).unwrap();

        assert_eq!(grid.num_points(), 7 * 7 * 7);
        assert_eq!(grid.cell_points(5).len(), 64);
    }

    #[test]
    fn hosts_map_back_to_positions() {
        let base = Rectilinear2D::uniform([0., 0.], [2., 1.], [4, 3]).unwrap();
        let grid = LagrangeGrid::new(&base, 3).unwrap();

        for i in 0..grid.num_points() {
            let (cell, local) = grid.point_host(i);
            let position = base.element(cell).geometry().global(&local);
            let point = grid.point(i);
            for axis in 0..3 {
                assert!((position[axis] - point[axis]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn mixed_triangles_and_quads_share_the_common_edge() {
        let base = UnstructuredGrid::new(
            2,
            vec![[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.], [2., 0., 0.]],
            vec![
                (CellKind::Quadrilateral, vec![0, 1, 2, 3]),
                (CellKind::Triangle, vec![1, 4, 2]),
            ],
        )
        .unwrap();

        let grid = LagrangeGrid::new(&base, 2).unwrap();

        // 9 quadrilateral nodes + 6 triangle nodes - 3 on the shared edge
        assert_eq!(grid.num_points(), 12);
    }

    #[test]
    fn order_one_keeps_the_vertices() {
        let base = Rectilinear2D::uniform([0., 0.], [1., 1.], [3, 3]).unwrap();
        let grid = LagrangeGrid::new(&base, 1).unwrap();
        assert_eq!(grid.num_points(), base.num_vertices());
    }

    #[test]
    fn cubic_tetrahedra_are_rejected() {
        let base = UnstructuredGrid::new(
            3,
            vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.], [0., 0., 1.]],
            vec![(CellKind::Tetrahedron, vec![0, 1, 2, 3])],
        )
        .unwrap();

        assert!(matches!(
            LagrangeGrid::new(&base, 3),
            Err(Error::UnsupportedOrder { order: 3, .. })
        ));
        assert_eq!(LagrangeGrid::new(&base, 2).unwrap().num_points(), 10);
    }
}
