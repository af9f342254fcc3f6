//! # gridwrite
//!
//! Write cell and point data of meshes to VTK XML unstructured grid files (`.vtu`), with
//! parallel master files (`.pvtu`) for distributed meshes, `.pvd` collections for time series,
//! and Lagrange cells of arbitrary order for smooth visualization of higher-order data.
//!
//! A mesh is anything implementing [`Grid`]. Structured meshes ([`Rectilinear2D`],
//! [`Rectilinear3D`]) and mixed element meshes ([`UnstructuredGrid`]) are provided.
//!
//! ```no_run
//! use gridwrite::{Format, Grid, GridWriter, Rectilinear2D};
//!
//! let grid = Rectilinear2D::uniform([0.0, 0.0], [1.0, 1.0], [10, 10])?;
//!
//! let mut writer = GridWriter::new(Format::vtu(), &grid)?;
//! writer.add_cell_data("cdata", |_| 0.0);
//! writer.add_point_data("pdata", |_| 0.0);
//!
//! // writes `standard.vtu`
//! writer.write("standard")?;
//! # Ok::<(), gridwrite::Error>(())
//! ```
//!
//! Files can be read back with [`GridReader`].

mod array;
pub mod comm;
pub mod format;
pub mod function;
pub mod grid_writer;
#[cfg(feature = "lagrange")]
pub mod lagrange;
pub mod mesh;
pub mod parse;
pub mod prelude;
mod traits;
mod utils;
mod write_vtk;
pub mod writer;

pub use comm::{Communicator, SerialComm};
#[cfg(feature = "mpi")]
pub use comm::MpiComm;

pub use format::{
    precision, Compression, DataFormat, Encoding, Format, HeaderPrecision, Precision, VtuOptions,
};

pub use mesh::{CellKind, Element, Geometry, Grid, Point, Vertex};
pub use mesh::{Rectilinear2D, Rectilinear3D, UnstructuredGrid};

#[cfg(feature = "lagrange")]
pub use lagrange::LagrangeGrid;

pub use function::{
    make_analytic_grid_function, AnalyticGridFunction, CellValues, GridFunction, VertexValues,
};

pub use grid_writer::{select_binding, EffectiveGrid, GridWriter, Order, Static, TimeSeries};
pub use writer::{Binding, FieldFn, Location, OutputGrid, Writer};

pub use parse::{GridReader, ParseError};
pub use traits::{FieldValue, Scalar};

pub use ndarray;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing VTK xml: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Could not convert file to uf8 encoding: `{0}`")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("Invalid output format: {0}")]
    InvalidFormat(String),
    #[error("{kind:?} cells cannot be written with order {order}")]
    UnsupportedOrder { kind: CellKind, order: usize },
    #[error("Output of order {0} requires the `lagrange` feature")]
    OrderUnavailable(usize),
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
    #[error("Communicator failure: {0}")]
    Communicator(String),
    #[error("Value {value} of field `{field}` cannot be represented as {precision:?}")]
    ValueOutOfRange {
        field: String,
        value: FieldValue,
        precision: Precision,
    },
    #[error("Frames can only be written by a time series writer")]
    MissingSeries,
}
