//! # Mesh Information
//!
//! A mesh is anything implementing [`Grid`]: it reports how many cells and vertices it has,
//! the [`CellKind`] and corner vertices of every cell, the position of every vertex, and the
//! [`Communicator`](crate::Communicator) of the processes sharing it.
//!
//! Cells and vertices are handed to user code as lightweight [`Element`] and [`Vertex`]
//! handles, which borrow the mesh they belong to.
//!
//! Three meshes are included:
//!
//! * [`Rectilinear2D`]: quadrilaterals spanned by two coordinate axes
//! * [`Rectilinear3D`]: hexahedra spanned by three coordinate axes
//! * [`UnstructuredGrid`]: explicit points and (possibly mixed) cells
//!
//! ## Corner ordering
//!
//! Corners of a cell are always listed in VTK order. For tensor-product cells this is
//! counter-clockwise around the bottom face, then (for hexahedra) the same around the top face.
//!
//! ```
//! use gridwrite::{Grid, Rectilinear2D};
//!
//! let grid = Rectilinear2D::uniform([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
//!
//! assert_eq!(grid.num_cells(), 4);
//! assert_eq!(grid.num_vertices(), 9);
//! assert_eq!(grid.cell_vertices(0), vec![0, 1, 4, 3]);
//! ```

mod entity;
mod rectilinear;
mod unstructured;

pub use entity::{Element, Elements, Geometry, Vertex, Vertices};
pub use rectilinear::{Rectilinear2D, Rectilinear3D};
pub use unstructured::UnstructuredGrid;

use crate::comm::Communicator;

/// a position in physical or reference space. Unused trailing coordinates are zero.
pub type Point = [f64; 3];

/// Describes a mesh whose cells and vertices can be written to a file
pub trait Grid {
    type Comm: Communicator;

    /// topological dimension of the cells
    fn dimension(&self) -> usize;

    fn num_cells(&self) -> usize;

    fn num_vertices(&self) -> usize;

    fn cell_kind(&self, cell: usize) -> CellKind;

    /// indices of the corner vertices of a cell, in VTK corner order
    fn cell_vertices(&self, cell: usize) -> Vec<usize>;

    fn vertex_position(&self, vertex: usize) -> Point;

    fn comm(&self) -> &Self::Comm;

    fn element(&self, index: usize) -> Element<'_, Self>
    where
        Self: Sized,
    {
        Element::new(self, index)
    }

    fn vertex(&self, index: usize) -> Vertex<'_, Self>
    where
        Self: Sized,
    {
        Vertex::new(self, index)
    }

    /// iterate over every cell of the mesh in index order
    fn elements(&self) -> Elements<'_, Self>
    where
        Self: Sized,
    {
        Elements::new(self)
    }

    /// iterate over every vertex of the mesh in index order
    fn vertices(&self) -> Vertices<'_, Self>
    where
        Self: Sized,
    {
        Vertices::new(self)
    }
}

impl<G: Grid> Grid for &G {
    type Comm = G::Comm;

    fn dimension(&self) -> usize {
        (*self).dimension()
    }

    fn num_cells(&self) -> usize {
        (*self).num_cells()
    }

    fn num_vertices(&self) -> usize {
        (*self).num_vertices()
    }

    fn cell_kind(&self, cell: usize) -> CellKind {
        (*self).cell_kind(cell)
    }

    fn cell_vertices(&self, cell: usize) -> Vec<usize> {
        (*self).cell_vertices(cell)
    }

    fn vertex_position(&self, vertex: usize) -> Point {
        (*self).vertex_position(vertex)
    }

    fn comm(&self) -> &Self::Comm {
        (*self).comm()
    }
}

/// The reference shape of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Line,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

const LINE_CORNERS: [Point; 2] = [[0., 0., 0.], [1., 0., 0.]];

const TRIANGLE_CORNERS: [Point; 3] = [[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]];

const QUADRILATERAL_CORNERS: [Point; 4] =
    [[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]];

const TETRAHEDRON_CORNERS: [Point; 4] =
    [[0., 0., 0.], [1., 0., 0.], [0., 1., 0.], [0., 0., 1.]];

const HEXAHEDRON_CORNERS: [Point; 8] = [
    [0., 0., 0.],
    [1., 0., 0.],
    [1., 1., 0.],
    [0., 1., 0.],
    [0., 0., 1.],
    [1., 0., 1.],
    [1., 1., 1.],
    [0., 1., 1.],
];

impl CellKind {
    pub fn dimension(&self) -> usize {
        match self {
            Self::Line => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }

    pub fn num_corners(&self) -> usize {
        self.reference_corners().len()
    }

    pub fn is_simplex(&self) -> bool {
        matches!(self, Self::Line | Self::Triangle | Self::Tetrahedron)
    }

    /// VTK cell type id of the linear cell
    pub fn vtk_linear(&self) -> u8 {
        match self {
            Self::Line => 3,
            Self::Triangle => 5,
            Self::Quadrilateral => 9,
            Self::Tetrahedron => 10,
            Self::Hexahedron => 12,
        }
    }

    /// VTK cell type id of the arbitrary order Lagrange cell
    pub fn vtk_lagrange(&self) -> u8 {
        match self {
            Self::Line => 68,
            Self::Triangle => 69,
            Self::Quadrilateral => 70,
            Self::Tetrahedron => 71,
            Self::Hexahedron => 72,
        }
    }

    /// corners of the reference cell, in VTK order
    pub fn reference_corners(&self) -> &'static [Point] {
        match self {
            Self::Line => &LINE_CORNERS,
            Self::Triangle => &TRIANGLE_CORNERS,
            Self::Quadrilateral => &QUADRILATERAL_CORNERS,
            Self::Tetrahedron => &TETRAHEDRON_CORNERS,
            Self::Hexahedron => &HEXAHEDRON_CORNERS,
        }
    }

    /// centroid of the reference cell
    pub fn reference_center(&self) -> Point {
        match self {
            Self::Line => [0.5, 0., 0.],
            Self::Triangle => [1. / 3., 1. / 3., 0.],
            Self::Quadrilateral => [0.5, 0.5, 0.],
            Self::Tetrahedron => [0.25, 0.25, 0.25],
            Self::Hexahedron => [0.5, 0.5, 0.5],
        }
    }

    /// Values of the linear shape functions of every corner at a local coordinate.
    ///
    /// Simplices use barycentric coordinates, tensor-product cells the multilinear product of
    /// the per-axis hat functions.
    pub fn shape_values(&self, local: &Point) -> Vec<f64> {
        let dim = self.dimension();

        if self.is_simplex() {
            let mut values = Vec::with_capacity(dim + 1);
            values.push(1.0 - local[..dim].iter().sum::<f64>());
            values.extend_from_slice(&local[..dim]);
            values
        } else {
            self.reference_corners()
                .iter()
                .map(|corner| {
                    (0..dim)
                        .map(|axis| {
                            if corner[axis] == 1.0 {
                                local[axis]
                            } else {
                                1.0 - local[axis]
                            }
                        })
                        .product()
                })
                .collect()
        }
    }
}
