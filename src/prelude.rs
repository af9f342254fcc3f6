//! Common traits and types that are useful for writing meshes with `gridwrite`
#![allow(unused_imports)]

pub use crate::comm::{Communicator, SerialComm};
pub use crate::format::{precision, DataFormat, Encoding, Format, HeaderPrecision, VtuOptions};
pub use crate::function::{make_analytic_grid_function, CellValues, GridFunction, VertexValues};
pub use crate::grid_writer::{GridWriter, Order, Static, TimeSeries};
pub use crate::mesh::{CellKind, Grid, Point, Rectilinear2D, Rectilinear3D, UnstructuredGrid};
pub use crate::parse::GridReader;
pub use crate::traits::Scalar;
pub use crate::Error;
