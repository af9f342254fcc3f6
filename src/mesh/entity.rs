use super::{CellKind, Grid, Point};

use std::fmt;

/// A cell of a mesh
pub struct Element<'g, G> {
    grid: &'g G,
    index: usize,
}

impl<'g, G: Grid> Element<'g, G> {
    pub(crate) fn new(grid: &'g G, index: usize) -> Self {
        Self { grid, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> CellKind {
        self.grid.cell_kind(self.index)
    }

    /// corner vertices in VTK order
    pub fn corners(&self) -> Vec<Vertex<'g, G>> {
        self.grid
            .cell_vertices(self.index)
            .into_iter()
            .map(|v| Vertex::new(self.grid, v))
            .collect()
    }

    pub fn corner_positions(&self) -> Vec<Point> {
        self.grid
            .cell_vertices(self.index)
            .into_iter()
            .map(|v| self.grid.vertex_position(v))
            .collect()
    }

    /// the map from reference coordinates of this cell to physical coordinates
    pub fn geometry(&self) -> Geometry {
        Geometry {
            kind: self.kind(),
            corners: self.corner_positions(),
        }
    }

    pub fn center(&self) -> Point {
        self.geometry().center()
    }

    /// the mesh this cell belongs to
    pub fn grid(&self) -> &'g G {
        self.grid
    }
}

impl<G> Clone for Element<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G> Copy for Element<'_, G> {}

impl<G> fmt::Debug for Element<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("index", &self.index).finish()
    }
}

/// Multilinear (or affine, for simplices) map of a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    kind: CellKind,
    corners: Vec<Point>,
}

impl Geometry {
    pub fn new(kind: CellKind, corners: Vec<Point>) -> Self {
        Self { kind, corners }
    }

    /// map a reference coordinate to physical space
    pub fn global(&self, local: &Point) -> Point {
        let weights = self.kind.shape_values(local);
        let mut out = [0.0; 3];

        for (weight, corner) in weights.iter().zip(self.corners.iter()) {
            for axis in 0..3 {
                out[axis] += weight * corner[axis];
            }
        }

        out
    }

    pub fn center(&self) -> Point {
        self.global(&self.kind.reference_center())
    }

    pub fn corners(&self) -> &[Point] {
        &self.corners
    }
}

/// A vertex of a mesh
pub struct Vertex<'g, G> {
    grid: &'g G,
    index: usize,
}

impl<'g, G: Grid> Vertex<'g, G> {
    pub(crate) fn new(grid: &'g G, index: usize) -> Self {
        Self { grid, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Point {
        self.grid.vertex_position(self.index)
    }
}

impl<G> Clone for Vertex<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G> Copy for Vertex<'_, G> {}

impl<G> fmt::Debug for Vertex<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex").field("index", &self.index).finish()
    }
}

/// Iterator over the cells of a mesh
pub struct Elements<'g, G> {
    grid: &'g G,
    range: std::ops::Range<usize>,
}

impl<'g, G: Grid> Elements<'g, G> {
    pub(crate) fn new(grid: &'g G) -> Self {
        Self {
            grid,
            range: 0..grid.num_cells(),
        }
    }
}

impl<'g, G: Grid> Iterator for Elements<'g, G> {
    type Item = Element<'g, G>;

    fn next(&mut self) -> Option<Self::Item> {
        self.range.next().map(|i| Element::new(self.grid, i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl<G: Grid> ExactSizeIterator for Elements<'_, G> {}

/// Iterator over the vertices of a mesh
pub struct Vertices<'g, G> {
    grid: &'g G,
    range: std::ops::Range<usize>,
}

impl<'g, G: Grid> Vertices<'g, G> {
    pub(crate) fn new(grid: &'g G) -> Self {
        Self {
            grid,
            range: 0..grid.num_vertices(),
        }
    }
}

impl<'g, G: Grid> Iterator for Vertices<'g, G> {
    type Item = Vertex<'g, G>;

    fn next(&mut self) -> Option<Self::Item> {
        self.range.next().map(|i| Vertex::new(self.grid, i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl<G: Grid> ExactSizeIterator for Vertices<'_, G> {}
