//! # Writing fields of a mesh
//!
//! [`GridWriter`] is the entry point of the crate. It is built for a mesh view and a
//! [`Format`], and accepts fields in several shapes:
//!
//! * callables of a cell ([`GridWriter::add_cell_data`])
//! * callables of a vertex ([`GridWriter::add_point_data`], first order output only)
//! * [`GridFunction`]s sampled at cell centres or at output points
//!   ([`GridWriter::add_cell_function`], [`GridWriter::add_point_function`])
//!
//! Every registration has an `_as` variant that overrides the precision values are written with.
//!
//! ```no_run
//! use gridwrite::{make_analytic_grid_function, Format, Grid, GridWriter, Rectilinear2D};
//!
//! let grid = Rectilinear2D::uniform([0.0, 0.0], [1.0, 1.0], [10, 10])?;
//! let f = make_analytic_grid_function(|x| x[0], &grid);
//!
//! let mut writer = GridWriter::new(Format::vtu(), &grid)?;
//! writer.add_cell_function("cfunc", &f);
//! writer.add_cell_data("cdata", |element| element.index() as f64);
//! writer.add_point_function("pfunc", &f);
//! writer.add_point_data("pdata", |vertex| vertex.position()[1]);
//!
//! writer.write("standard")?;
//! # Ok::<(), gridwrite::Error>(())
//! ```
//!
//! ## Higher-order output
//!
//! With [`GridWriter::with_order`] the mesh is elevated to Lagrange cells of the requested order
//! before writing. Point data must then be given as a grid function, since output points are no
//! longer mesh vertices:
//!
//! ```compile_fail,E0599
//! use gridwrite::{Format, GridWriter, Order, Rectilinear2D};
//!
//! let grid = Rectilinear2D::uniform([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
//! let mut writer = GridWriter::with_order(Format::vtu(), &grid, Order::<2>).unwrap();
//!
//! writer.add_point_data("pdata", |vertex| vertex.position()[0]);
//! ```
//!
//! An order of zero is rejected when the program is built:
//!
//! ```compile_fail
//! use gridwrite::{Format, GridWriter, Order, Rectilinear2D};
//!
//! let grid = Rectilinear2D::uniform([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
//! let writer = GridWriter::with_order(Format::vtu(), &grid, Order::<0>);
//! ```
//!
//! ## Time series
//!
//! [`GridWriter::time_series`] writes one frame per call to `write(time)` and keeps a `.pvd`
//! file listing all frames up to date.

mod effective;

pub use effective::{select_binding, EffectiveGrid};

use crate::comm::Communicator;
use crate::format::{Format, Precision};
use crate::function::GridFunction;
use crate::mesh::{Element, Grid, Point, Vertex};
use crate::traits::{FieldValue, Scalar};
use crate::writer::{Binding, FieldFn, Location, OutputGrid, Writer};
use crate::Error;

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Output order as a type, for [`GridWriter::with_order`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Order<const N: usize>;

/// Writers that produce standalone files named at each write
#[derive(Debug, Clone, Copy, Default)]
pub struct Static;

/// Writers that produce the frames of a time series
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeries;

/// The ways a field can be handed to a [`GridWriter`]
enum FieldSource<'a, G> {
    CellCallable(Box<dyn Fn(&Element<'_, G>) -> FieldValue + 'a>),
    PointCallable(Box<dyn Fn(&Vertex<'_, G>) -> FieldValue + 'a>),
    CellFunction(Box<dyn Fn(&Element<'_, G>, &Point) -> FieldValue + 'a>),
    PointFunction(Box<dyn Fn(&Element<'_, G>, &Point) -> FieldValue + 'a>),
}

/// Writes cell and point fields of a mesh, optionally elevated to order `ORDER`
pub struct GridWriter<'a, G: Grid, K = Static, const ORDER: usize = 1> {
    writer: Writer<'a, EffectiveGrid<'a, G>>,
    _mode: PhantomData<K>,
}

/// Build the engine writer for a mesh, bound to its communicator if the mesh is distributed
pub(crate) fn make_writer<'a, G: Grid>(
    format: Format,
    grid: EffectiveGrid<'a, G>,
    filename: Option<&Path>,
) -> Result<Writer<'a, EffectiveGrid<'a, G>>, Error> {
    let (distributed, participants) = effective::participants(&grid);
    let binding = select_binding(distributed, participants);

    log::debug!(
        "creating {binding:?} writer for {participants} participant(s) at order {}",
        grid.order()
    );

    Writer::new(format, grid, binding, filename)
}

impl<'a, G: Grid, K, const ORDER: usize> GridWriter<'a, G, K, ORDER> {
    const VALID_ORDER: () = {
        assert!(ORDER > 0, "output order must be at least one");
        assert!(
            ORDER == 1 || cfg!(feature = "lagrange"),
            "higher-order output requires the `lagrange` feature"
        );
    };

    fn build(format: Format, grid: &'a G, filename: Option<&Path>) -> Result<Self, Error> {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_ORDER;

        let effective = EffectiveGrid::select(grid, ORDER)?;
        let writer = make_writer(format, effective, filename)?;

        Ok(Self {
            writer,
            _mode: PhantomData,
        })
    }

    /// Normalize any field source to a single engine field
    fn register(&mut self, name: &str, source: FieldSource<'a, G>, precision: Precision) {
        let location = match &source {
            FieldSource::CellCallable(_) | FieldSource::CellFunction(_) => Location::Cells,
            FieldSource::PointCallable(_) | FieldSource::PointFunction(_) => Location::Points,
        };

        let field: FieldFn<'a, EffectiveGrid<'a, G>> = match source {
            FieldSource::CellCallable(f) => {
                Box::new(move |grid: &EffectiveGrid<'a, G>, cell: usize| {
                    f(&grid.as_view().element(grid.base_cell(cell)))
                })
            }
            FieldSource::CellFunction(f) => {
                Box::new(move |grid: &EffectiveGrid<'a, G>, cell: usize| {
                    let element = grid.as_view().element(grid.base_cell(cell));
                    f(&element, &element.kind().reference_center())
                })
            }
            FieldSource::PointCallable(f) => {
                Box::new(move |grid: &EffectiveGrid<'a, G>, point: usize| {
                    f(&grid.as_view().vertex(point))
                })
            }
            FieldSource::PointFunction(f) => {
                // hosts of the output points never change once the writer is built
                let hosts = self.writer.grid().point_hosts();
                Box::new(move |grid: &EffectiveGrid<'a, G>, point: usize| match hosts[point] {
                    Some((cell, local)) => f(&grid.as_view().element(cell), &local),
                    None => FieldValue::UInt(0),
                })
            }
        };

        log::debug!(
            "registered {location:?} field `{name}` as {}",
            precision.vtk_name()
        );

        self.writer.set_field(name, location, precision, field);
    }

    /// Add a field with one value per cell, computed from the cell of the mesh view.
    pub fn add_cell_data<F, T>(&mut self, name: &str, f: F)
    where
        F: Fn(&Element<'_, G>) -> T + 'a,
        T: Scalar,
    {
        self.add_cell_data_as(name, f, T::PRECISION)
    }

    /// Like [`GridWriter::add_cell_data`], written with `precision` instead of the precision of
    /// `T`.
    pub fn add_cell_data_as<F, T>(&mut self, name: &str, f: F, precision: Precision)
    where
        F: Fn(&Element<'_, G>) -> T + 'a,
        T: Scalar,
    {
        let source = FieldSource::CellCallable(Box::new(move |element: &Element<'_, G>| {
            f(element).into_value()
        }));
        self.register(name, source, precision)
    }

    /// Add a field with one value per cell, sampled at the centre of each cell.
    pub fn add_cell_function<F>(&mut self, name: &str, function: F)
    where
        F: GridFunction<G> + 'a,
    {
        self.add_cell_function_as(name, function, F::Value::PRECISION)
    }

    /// Like [`GridWriter::add_cell_function`], written with `precision` instead of the precision
    /// of the function's values.
    pub fn add_cell_function_as<F>(&mut self, name: &str, function: F, precision: Precision)
    where
        F: GridFunction<G> + 'a,
    {
        let source = FieldSource::CellFunction(Box::new(
            move |element: &Element<'_, G>, local: &Point| {
                function.evaluate(element, local).into_value()
            },
        ));
        self.register(name, source, precision)
    }

    /// Add a field with one value per output point. At higher orders the function is sampled
    /// at every Lagrange node.
    pub fn add_point_function<F>(&mut self, name: &str, function: F)
    where
        F: GridFunction<G> + 'a,
    {
        self.add_point_function_as(name, function, F::Value::PRECISION)
    }

    /// Like [`GridWriter::add_point_function`], written with `precision` instead of the precision
    /// of the function's values.
    pub fn add_point_function_as<F>(&mut self, name: &str, function: F, precision: Precision)
    where
        F: GridFunction<G> + 'a,
    {
        let source = FieldSource::PointFunction(Box::new(
            move |element: &Element<'_, G>, local: &Point| {
                function.evaluate(element, local).into_value()
            },
        ));
        self.register(name, source, precision)
    }

    /// remove all registered fields
    pub fn clear(&mut self) {
        self.writer.clear()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.writer.field_names()
    }

    /// the mesh that is written
    pub fn effective_grid(&self) -> &EffectiveGrid<'a, G> {
        self.writer.grid()
    }

    pub fn binding(&self) -> Binding {
        self.writer.binding()
    }

    pub fn format(&self) -> &Format {
        self.writer.format()
    }

    /// number of processes sharing the mesh
    pub fn participants(&self) -> usize {
        self.writer.grid().comm().size()
    }
}

impl<'a, G: Grid, K> GridWriter<'a, G, K, 1> {
    /// Add a field with one value per vertex. Only available for first order output.
    pub fn add_point_data<F, T>(&mut self, name: &str, f: F)
    where
        F: Fn(&Vertex<'_, G>) -> T + 'a,
        T: Scalar,
    {
        self.add_point_data_as(name, f, T::PRECISION)
    }

    /// Like [`GridWriter::add_point_data`], written with `precision` instead of the precision of
    /// `T`.
    pub fn add_point_data_as<F, T>(&mut self, name: &str, f: F, precision: Precision)
    where
        F: Fn(&Vertex<'_, G>) -> T + 'a,
        T: Scalar,
    {
        let source = FieldSource::PointCallable(Box::new(move |vertex: &Vertex<'_, G>| {
            f(vertex).into_value()
        }));
        self.register(name, source, precision)
    }
}

impl<'a, G: Grid> GridWriter<'a, G, Static, 1> {
    /// A first order writer of standalone files
    pub fn new(format: Format, grid: &'a G) -> Result<Self, Error> {
        Self::build(format, grid, None)
    }
}

impl<'a, G: Grid, const ORDER: usize> GridWriter<'a, G, Static, ORDER> {
    /// A writer of standalone files that elevates the mesh to order `ORDER`
    pub fn with_order(format: Format, grid: &'a G, _order: Order<ORDER>) -> Result<Self, Error> {
        Self::build(format, grid, None)
    }

    /// Write all fields to `name` (the extension is added). Returns the path of the written
    /// file, or of the master file when writing in parallel.
    pub fn write(&self, name: impl AsRef<Path>) -> Result<PathBuf, Error> {
        self.writer.write(name.as_ref())
    }
}

impl<'a, G: Grid> GridWriter<'a, G, TimeSeries, 1> {
    /// A first order writer of the time series `filename`
    pub fn time_series(
        format: Format,
        grid: &'a G,
        filename: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        Self::build(format, grid, Some(filename.as_ref()))
    }
}

impl<'a, G: Grid, const ORDER: usize> GridWriter<'a, G, TimeSeries, ORDER> {
    pub fn time_series_with_order(
        format: Format,
        grid: &'a G,
        filename: impl AsRef<Path>,
        _order: Order<ORDER>,
    ) -> Result<Self, Error> {
        Self::build(format, grid, Some(filename.as_ref()))
    }

    /// Write the frame for `time` and update the series file. Returns the path of the frame.
    pub fn write(&mut self, time: impl Into<f64>) -> Result<PathBuf, Error> {
        self.writer.write_step(time.into())
    }
}
