use crate::comm::Communicator;
use crate::mesh::{Grid, Point};
use crate::writer::OutputGrid;
use crate::Error;

#[cfg(feature = "lagrange")]
use crate::lagrange::LagrangeGrid;

use std::borrow::Cow;

/// The mesh that is actually written: the mesh view itself, or its higher-order elevation
#[derive(Debug)]
pub enum EffectiveGrid<'g, G> {
    Borrowed(&'g G),
    #[cfg(feature = "lagrange")]
    Elevated(LagrangeGrid<'g, G>),
}

impl<'g, G: Grid> EffectiveGrid<'g, G> {
    /// Pick the mesh to write for an output order. Order one writes the view unchanged.
    pub fn select(grid: &'g G, order: usize) -> Result<Self, Error> {
        if order == 1 {
            return Ok(Self::Borrowed(grid));
        }

        #[cfg(feature = "lagrange")]
        {
            Ok(Self::Elevated(LagrangeGrid::new(grid, order)?))
        }

        #[cfg(not(feature = "lagrange"))]
        {
            Err(Error::OrderUnavailable(order))
        }
    }

    /// the mesh view this effective mesh was selected for
    pub fn as_view(&self) -> &'g G {
        match self {
            Self::Borrowed(grid) => *grid,
            #[cfg(feature = "lagrange")]
            Self::Elevated(lagrange) => lagrange.base(),
        }
    }

    pub fn order(&self) -> usize {
        match self {
            Self::Borrowed(_) => 1,
            #[cfg(feature = "lagrange")]
            Self::Elevated(lagrange) => lagrange.order(),
        }
    }

    pub fn is_elevated(&self) -> bool {
        !matches!(self, Self::Borrowed(_))
    }

    /// the cell of the mesh view an output cell corresponds to
    pub fn base_cell(&self, cell: usize) -> usize {
        match self {
            Self::Borrowed(_) => cell,
            #[cfg(feature = "lagrange")]
            Self::Elevated(lagrange) => lagrange.base_cell(cell),
        }
    }

    /// For every output point, a cell of the mesh view containing it and its reference
    /// coordinate there. Vertices that belong to no cell have no host.
    pub fn point_hosts(&self) -> Vec<Option<(usize, Point)>> {
        match self {
            Self::Borrowed(grid) => {
                let mut hosts = vec![None; grid.num_vertices()];

                for cell in 0..grid.num_cells() {
                    let corners = grid.cell_kind(cell).reference_corners();

                    for (vertex, local) in grid.cell_vertices(cell).into_iter().zip(corners) {
                        if hosts[vertex].is_none() {
                            hosts[vertex] = Some((cell, *local));
                        }
                    }
                }

                hosts
            }
            #[cfg(feature = "lagrange")]
            Self::Elevated(lagrange) => (0..lagrange.num_points())
                .map(|i| Some(lagrange.point_host(i)))
                .collect(),
        }
    }
}

impl<'g, G: Grid> OutputGrid for EffectiveGrid<'g, G> {
    type Comm = G::Comm;

    fn num_points(&self) -> usize {
        match self {
            Self::Borrowed(grid) => grid.num_vertices(),
            #[cfg(feature = "lagrange")]
            Self::Elevated(lagrange) => lagrange.num_points(),
        }
    }

    fn num_cells(&self) -> usize {
        self.as_view().num_cells()
    }

    fn point(&self, index: usize) -> Point {
        match self {
            Self::Borrowed(grid) => grid.vertex_position(index),
            #[cfg(feature = "lagrange")]
            Self::Elevated(lagrange) => lagrange.point(index),
        }
    }

    fn cell_type(&self, cell: usize) -> u8 {
        let kind = self.as_view().cell_kind(self.base_cell(cell));

        if self.is_elevated() {
            kind.vtk_lagrange()
        } else {
            kind.vtk_linear()
        }
    }

    fn cell_points(&self, cell: usize) -> Cow<'_, [usize]> {
        match self {
            Self::Borrowed(grid) => Cow::Owned(grid.cell_vertices(cell)),
            #[cfg(feature = "lagrange")]
            Self::Elevated(lagrange) => Cow::Borrowed(lagrange.cell_points(cell)),
        }
    }

    fn comm(&self) -> &G::Comm {
        self.as_view().comm()
    }
}

/// Writers bind to the communicator only if it can span processes and actually does.
pub fn select_binding(distributed: bool, participants: usize) -> crate::writer::Binding {
    if distributed && participants > 1 {
        crate::writer::Binding::Communicator
    } else {
        crate::writer::Binding::Local
    }
}

pub(crate) fn participants<G: Grid>(grid: &EffectiveGrid<'_, G>) -> (bool, usize) {
    (
        <G::Comm as Communicator>::DISTRIBUTED,
        OutputGrid::comm(grid).size(),
    )
}
