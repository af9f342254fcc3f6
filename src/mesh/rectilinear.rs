use super::{CellKind, Grid, Point};
use crate::comm::{Communicator, SerialComm};
use crate::Error;

use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
/// Quadrilateral mesh spanned by the tensor product of two coordinate axes.
///
/// Vertices are numbered with `x` fastest: the vertex at `(x_locations[i], y_locations[j])`
/// has index `i + j * nx`. Cells are numbered the same way over `(nx - 1) * (ny - 1)`.
pub struct Rectilinear2D<C = SerialComm> {
    pub x_locations: Array1<f64>,
    pub y_locations: Array1<f64>,
    comm: C,
}

impl Rectilinear2D<SerialComm> {
    /// create a new mesh from the vertex locations along each axis
    pub fn new(x_locations: Vec<f64>, y_locations: Vec<f64>) -> Result<Self, Error> {
        check_axis("x", &x_locations)?;
        check_axis("y", &y_locations)?;

        Ok(Self {
            x_locations: Array1::from(x_locations),
            y_locations: Array1::from(y_locations),
            comm: SerialComm,
        })
    }

    /// Evenly spaced mesh of `cells[0] x cells[1]` cells between `lower` and `upper`.
    pub fn uniform(lower: [f64; 2], upper: [f64; 2], cells: [usize; 2]) -> Result<Self, Error> {
        let x = uniform_axis("x", lower[0], upper[0], cells[0])?;
        let y = uniform_axis("y", lower[1], upper[1], cells[1])?;

        Ok(Self {
            x_locations: x,
            y_locations: y,
            comm: SerialComm,
        })
    }
}

impl<C> Rectilinear2D<C> {
    /// hand this mesh to a different communicator
    pub fn with_comm<T: Communicator>(self, comm: T) -> Rectilinear2D<T> {
        let Rectilinear2D {
            x_locations,
            y_locations,
            ..
        } = self;

        Rectilinear2D {
            x_locations,
            y_locations,
            comm,
        }
    }

    fn nx(&self) -> usize {
        self.x_locations.len()
    }

    fn ny(&self) -> usize {
        self.y_locations.len()
    }
}

impl<C: Communicator> Grid for Rectilinear2D<C> {
    type Comm = C;

    fn dimension(&self) -> usize {
        2
    }

    fn num_cells(&self) -> usize {
        (self.nx() - 1) * (self.ny() - 1)
    }

    fn num_vertices(&self) -> usize {
        self.nx() * self.ny()
    }

    fn cell_kind(&self, _cell: usize) -> CellKind {
        CellKind::Quadrilateral
    }

    fn cell_vertices(&self, cell: usize) -> Vec<usize> {
        let nx = self.nx();
        let i = cell % (nx - 1);
        let j = cell / (nx - 1);

        let v = i + j * nx;

        vec![v, v + 1, v + 1 + nx, v + nx]
    }

    fn vertex_position(&self, vertex: usize) -> Point {
        let nx = self.nx();
        let i = vertex % nx;
        let j = vertex / nx;

        [self.x_locations[i], self.y_locations[j], 0.0]
    }

    fn comm(&self) -> &C {
        &self.comm
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Hexahedral mesh spanned by the tensor product of three coordinate axes.
///
/// Vertex `(i, j, k)` has index `i + nx * (j + ny * k)`.
pub struct Rectilinear3D<C = SerialComm> {
    pub x_locations: Array1<f64>,
    pub y_locations: Array1<f64>,
    pub z_locations: Array1<f64>,
    comm: C,
}

impl Rectilinear3D<SerialComm> {
    pub fn new(
        x_locations: Vec<f64>,
        y_locations: Vec<f64>,
        z_locations: Vec<f64>,
    ) -> Result<Self, Error> {
        check_axis("x", &x_locations)?;
        check_axis("y", &y_locations)?;
        check_axis("z", &z_locations)?;

        Ok(Self {
            x_locations: Array1::from(x_locations),
            y_locations: Array1::from(y_locations),
            z_locations: Array1::from(z_locations),
            comm: SerialComm,
        })
    }

    /// Evenly spaced mesh of `cells[0] x cells[1] x cells[2]` cells between `lower` and `upper`.
    pub fn uniform(lower: [f64; 3], upper: [f64; 3], cells: [usize; 3]) -> Result<Self, Error> {
        Ok(Self {
            x_locations: uniform_axis("x", lower[0], upper[0], cells[0])?,
            y_locations: uniform_axis("y", lower[1], upper[1], cells[1])?,
            z_locations: uniform_axis("z", lower[2], upper[2], cells[2])?,
            comm: SerialComm,
        })
    }
}

impl<C> Rectilinear3D<C> {
    pub fn with_comm<T: Communicator>(self, comm: T) -> Rectilinear3D<T> {
        let Rectilinear3D {
            x_locations,
            y_locations,
            z_locations,
            ..
        } = self;

        Rectilinear3D {
            x_locations,
            y_locations,
            z_locations,
            comm,
        }
    }

    fn nx(&self) -> usize {
        self.x_locations.len()
    }

    fn ny(&self) -> usize {
        self.y_locations.len()
    }

    fn nz(&self) -> usize {
        self.z_locations.len()
    }
}

impl<C: Communicator> Grid for Rectilinear3D<C> {
    type Comm = C;

    fn dimension(&self) -> usize {
        3
    }

    fn num_cells(&self) -> usize {
        (self.nx() - 1) * (self.ny() - 1) * (self.nz() - 1)
    }

    fn num_vertices(&self) -> usize {
        self.nx() * self.ny() * self.nz()
    }

    fn cell_kind(&self, _cell: usize) -> CellKind {
        CellKind::Hexahedron
    }

    fn cell_vertices(&self, cell: usize) -> Vec<usize> {
        let (nx, ny) = (self.nx(), self.ny());
        let i = cell % (nx - 1);
        let j = (cell / (nx - 1)) % (ny - 1);
        let k = cell / ((nx - 1) * (ny - 1));

        let v = i + nx * (j + ny * k);
        let up = nx * ny;

        vec![
            v,
            v + 1,
            v + 1 + nx,
            v + nx,
            v + up,
            v + 1 + up,
            v + 1 + nx + up,
            v + nx + up,
        ]
    }

    fn vertex_position(&self, vertex: usize) -> Point {
        let (nx, ny) = (self.nx(), self.ny());
        let i = vertex % nx;
        let j = (vertex / nx) % ny;
        let k = vertex / (nx * ny);

        [self.x_locations[i], self.y_locations[j], self.z_locations[k]]
    }

    fn comm(&self) -> &C {
        &self.comm
    }
}

fn check_axis(name: &str, locations: &[f64]) -> Result<(), Error> {
    if locations.len() < 2 {
        return Err(Error::InvalidMesh(format!(
            "the {name} axis needs at least two vertex locations, got {}",
            locations.len()
        )));
    }

    if locations.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(Error::InvalidMesh(format!(
            "the {name} axis locations are not strictly increasing"
        )));
    }

    Ok(())
}

fn uniform_axis(name: &str, lower: f64, upper: f64, cells: usize) -> Result<Array1<f64>, Error> {
    if cells == 0 || !(lower < upper) {
        return Err(Error::InvalidMesh(format!(
            "cannot span {cells} cells between {lower} and {upper} along the {name} axis"
        )));
    }

    Ok(Array1::linspace(lower, upper, cells + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_2d_counts() {
        let grid = Rectilinear2D::uniform([0., 0.], [1., 1.], [10, 10]).unwrap();
        assert_eq!(grid.num_cells(), 100);
        assert_eq!(grid.num_vertices(), 121);
        assert_eq!(grid.vertex_position(120), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn corners_2d_are_counter_clockwise() {
        let grid = Rectilinear2D::new(vec![0., 1., 3.], vec![0., 2.]).unwrap();
        let positions = grid.element(1).corner_positions();

        assert_eq!(
            positions,
            vec![[1., 0., 0.], [3., 0., 0.], [3., 2., 0.], [1., 2., 0.]]
        );
    }

    #[test]
    fn corners_3d() {
        let grid = Rectilinear3D::uniform([0.; 3], [2.; 3], [2, 2, 2]).unwrap();
        assert_eq!(grid.num_cells(), 8);
        assert_eq!(grid.num_vertices(), 27);

        let last = grid.element(7);
        assert_eq!(last.corner_positions()[0], [1., 1., 1.]);
        assert_eq!(last.corner_positions()[6], [2., 2., 2.]);
        assert_eq!(last.center(), [1.5, 1.5, 1.5]);
    }

    #[test]
    fn rejects_degenerate_axes() {
        assert!(Rectilinear2D::new(vec![0.], vec![0., 1.]).is_err());
        assert!(Rectilinear2D::new(vec![0., 0.], vec![0., 1.]).is_err());
        assert!(Rectilinear3D::uniform([0.; 3], [1.; 3], [1, 0, 1]).is_err());
    }
}
