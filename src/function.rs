//! # Grid functions
//!
//! A [`GridFunction`] is a field defined on a mesh that can be evaluated at any reference
//! coordinate inside any cell. Writers use grid functions wherever a field must be sampled at
//! points that are not mesh vertices, such as the nodes of a higher-order mesh.
//!
//! ```
//! use gridwrite::{make_analytic_grid_function, GridFunction, Grid, Rectilinear2D};
//!
//! let grid = Rectilinear2D::uniform([0.0, 0.0], [1.0, 1.0], [4, 4]).unwrap();
//! let f = make_analytic_grid_function(|x| x[0] + x[1], &grid);
//!
//! let element = grid.element(0);
//! assert_eq!(f.evaluate(&element, &[1.0, 1.0, 0.0]), 0.5);
//! ```

use crate::mesh::{Element, Grid, Point};
use crate::traits::Scalar;

/// A field that can be evaluated locally inside every cell of a mesh
pub trait GridFunction<G: Grid> {
    type Value: Scalar;

    /// the value at reference coordinate `local` of `element`
    fn evaluate(&self, element: &Element<'_, G>, local: &Point) -> Self::Value;
}

impl<G: Grid, F: GridFunction<G>> GridFunction<G> for &F {
    type Value = F::Value;

    fn evaluate(&self, element: &Element<'_, G>, local: &Point) -> Self::Value {
        (*self).evaluate(element, local)
    }
}

/// A function of physical coordinates, evaluated through the geometry of each cell
pub struct AnalyticGridFunction<'g, G, F> {
    function: F,
    grid: &'g G,
}

impl<'g, G, F> AnalyticGridFunction<'g, G, F> {
    pub fn grid(&self) -> &'g G {
        self.grid
    }
}

/// Wrap a function of physical coordinates as a grid function on `grid`
pub fn make_analytic_grid_function<'g, G, F, T>(function: F, grid: &'g G) -> AnalyticGridFunction<'g, G, F>
where
    G: Grid,
    F: Fn(&Point) -> T,
    T: Scalar,
{
    AnalyticGridFunction { function, grid }
}

impl<G, F, T> GridFunction<G> for AnalyticGridFunction<'_, G, F>
where
    G: Grid,
    F: Fn(&Point) -> T,
    T: Scalar,
{
    type Value = T;

    fn evaluate(&self, element: &Element<'_, G>, local: &Point) -> T {
        let global = element.geometry().global(local);
        (self.function)(&global)
    }
}

/// Piecewise constant field given by one value per cell
#[derive(Debug, Clone, PartialEq, derive_more::Constructor)]
pub struct CellValues<'a, T> {
    values: &'a [T],
}

impl<G: Grid, T: Scalar> GridFunction<G> for CellValues<'_, T> {
    type Value = T;

    fn evaluate(&self, element: &Element<'_, G>, _local: &Point) -> T {
        self.values[element.index()]
    }
}

/// Continuous field given by one value per vertex, interpolated with the linear shape
/// functions of each cell
#[derive(Debug, Clone, PartialEq, derive_more::Constructor)]
pub struct VertexValues<'a, T> {
    values: &'a [T],
}

impl<G: Grid, T: Scalar> GridFunction<G> for VertexValues<'_, T> {
    type Value = f64;

    fn evaluate(&self, element: &Element<'_, G>, local: &Point) -> f64 {
        let weights = element.kind().shape_values(local);

        element
            .corners()
            .iter()
            .zip(weights)
            .map(|(vertex, weight)| weight * self.values[vertex.index()].to_f64())
            .sum()
    }
}
