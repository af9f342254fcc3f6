use super::{CellKind, Grid, Point};
use crate::comm::{Communicator, SerialComm};
use crate::Error;

/// A mesh given by explicit point coordinates and cell connectivity.
///
/// All cells must have the topological dimension of the mesh, but kinds may be mixed
/// (for example triangles and quadrilaterals).
///
/// ```
/// use gridwrite::{CellKind, Grid, UnstructuredGrid};
///
/// let grid = UnstructuredGrid::new(
///     2,
///     vec![[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.], [2., 0., 0.]],
///     vec![
///         (CellKind::Quadrilateral, vec![0, 1, 2, 3]),
///         (CellKind::Triangle, vec![1, 4, 2]),
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(grid.num_cells(), 2);
/// assert_eq!(grid.cell_kind(1), CellKind::Triangle);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UnstructuredGrid<C = SerialComm> {
    dimension: usize,
    points: Vec<Point>,
    kinds: Vec<CellKind>,
    connectivity: Vec<usize>,
    offsets: Vec<usize>,
    comm: C,
}

impl UnstructuredGrid<SerialComm> {
    pub fn new(
        dimension: usize,
        points: Vec<Point>,
        cells: Vec<(CellKind, Vec<usize>)>,
    ) -> Result<Self, Error> {
        if !(1..=3).contains(&dimension) {
            return Err(Error::InvalidMesh(format!(
                "mesh dimension must be 1, 2 or 3, got {dimension}"
            )));
        }

        let mut kinds = Vec::with_capacity(cells.len());
        let mut connectivity = Vec::new();
        let mut offsets = Vec::with_capacity(cells.len() + 1);
        offsets.push(0);

        for (index, (kind, corners)) in cells.into_iter().enumerate() {
            if kind.dimension() != dimension {
                return Err(Error::InvalidMesh(format!(
                    "cell {index} is a {kind:?} which does not have dimension {dimension}"
                )));
            }

            if corners.len() != kind.num_corners() {
                return Err(Error::InvalidMesh(format!(
                    "cell {index} is a {kind:?} with {} corners instead of {}",
                    corners.len(),
                    kind.num_corners()
                )));
            }

            if let Some(bad) = corners.iter().find(|&&v| v >= points.len()) {
                return Err(Error::InvalidMesh(format!(
                    "cell {index} references vertex {bad} but there are only {} points",
                    points.len()
                )));
            }

            kinds.push(kind);
            connectivity.extend(corners);
            offsets.push(connectivity.len());
        }

        Ok(Self {
            dimension,
            points,
            kinds,
            connectivity,
            offsets,
            comm: SerialComm,
        })
    }
}

impl<C> UnstructuredGrid<C> {
    pub fn with_comm<T: Communicator>(self, comm: T) -> UnstructuredGrid<T> {
        let UnstructuredGrid {
            dimension,
            points,
            kinds,
            connectivity,
            offsets,
            ..
        } = self;

        UnstructuredGrid {
            dimension,
            points,
            kinds,
            connectivity,
            offsets,
            comm,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl<C: Communicator> Grid for UnstructuredGrid<C> {
    type Comm = C;

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_cells(&self) -> usize {
        self.kinds.len()
    }

    fn num_vertices(&self) -> usize {
        self.points.len()
    }

    fn cell_kind(&self, cell: usize) -> CellKind {
        self.kinds[cell]
    }

    fn cell_vertices(&self, cell: usize) -> Vec<usize> {
        self.connectivity[self.offsets[cell]..self.offsets[cell + 1]].to_vec()
    }

    fn vertex_position(&self, vertex: usize) -> Point {
        self.points[vertex]
    }

    fn comm(&self) -> &C {
        &self.comm
    }
}
