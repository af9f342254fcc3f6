//! # The serialization engine
//!
//! [`Writer`] owns an output mesh and a table of named fields. Each field is a function from an
//! entity index to a value, evaluated only when a file is written. The same writer can produce
//! single files, parallel pieces with a master file, or the frames of a time series.

use crate::array::DataArray;
use crate::comm::Communicator;
use crate::format::{Format, Precision};
use crate::mesh::Point;
use crate::traits::FieldValue;
use crate::utils;
use crate::write_vtk::{self, Piece};
use crate::Error;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// A mesh in the form written to a file: points, and cells given as lists of point indices
pub trait OutputGrid {
    type Comm: Communicator;

    fn num_points(&self) -> usize;

    fn num_cells(&self) -> usize;

    fn point(&self, index: usize) -> Point;

    /// VTK cell type id
    fn cell_type(&self, cell: usize) -> u8;

    fn cell_points(&self, cell: usize) -> Cow<'_, [usize]>;

    fn comm(&self) -> &Self::Comm;
}

/// the entities a field holds one value per
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Points,
    Cells,
}

/// evaluates a field for the entity with the given index
pub type FieldFn<'a, M> = Box<dyn Fn(&M, usize) -> FieldValue + 'a>;

/// whether a writer writes on its own or as one participant of a communicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Local,
    Communicator,
}

struct FieldEntry<'a, M> {
    location: Location,
    precision: Precision,
    source: FieldFn<'a, M>,
}

enum Target {
    Static,
    Series(Series),
}

struct Series {
    base: PathBuf,
    steps: Vec<(f64, String)>,
}

/// Writes the fields registered on a mesh to VTK files
pub struct Writer<'a, M> {
    format: Format,
    grid: M,
    binding: Binding,
    target: Target,
    fields: Vec<(String, FieldEntry<'a, M>)>,
}

impl<'a, M: OutputGrid> Writer<'a, M> {
    /// Create a writer. With a `filename` the writer produces a time series named after it,
    /// otherwise every call to [`Writer::write`] produces a standalone file.
    pub fn new(
        format: Format,
        grid: M,
        binding: Binding,
        filename: Option<&Path>,
    ) -> Result<Self, Error> {
        format.validate()?;

        let target = match filename {
            Some(base) => Target::Series(Series {
                base: base.to_path_buf(),
                steps: Vec::new(),
            }),
            None => Target::Static,
        };

        Ok(Self {
            format,
            grid,
            binding,
            target,
            fields: Vec::new(),
        })
    }

    /// Register a field. A field that already has this name is replaced in place.
    pub fn set_field(
        &mut self,
        name: &str,
        location: Location,
        precision: Precision,
        source: FieldFn<'a, M>,
    ) {
        let entry = FieldEntry {
            location,
            precision,
            source,
        };

        match self.fields.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, old)) => *old = entry,
            None => self.fields.push((name.to_string(), entry)),
        }
    }

    /// remove a single field, returning whether it existed
    pub fn remove_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|(existing, _)| existing != name);
        self.fields.len() != before
    }

    pub fn clear(&mut self) {
        self.fields.clear()
    }

    /// names of the registered fields in registration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn grid(&self) -> &M {
        &self.grid
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Evaluate every field and gather the mesh arrays of this participant
    fn piece(&self) -> Result<Piece, Error> {
        let grid = &self.grid;
        let options = self.format.options();

        let num_points = grid.num_points();
        let num_cells = grid.num_cells();

        let points = DataArray::from_f64(
            "Coordinates",
            options.coordinate_precision,
            3,
            (0..num_points).flat_map(|i| grid.point(i)),
        )?;

        let mut connectivity = Vec::new();
        let mut offsets = Vec::with_capacity(num_cells);
        let mut types = Vec::with_capacity(num_cells);

        for cell in 0..num_cells {
            connectivity.extend(grid.cell_points(cell).iter().map(|&p| p as i64));
            offsets.push(connectivity.len() as i64);
            types.push(grid.cell_type(cell));
        }

        let mut point_data = Vec::new();
        let mut cell_data = Vec::new();

        for (name, entry) in &self.fields {
            let (count, target) = match entry.location {
                Location::Points => (num_points, &mut point_data),
                Location::Cells => (num_cells, &mut cell_data),
            };

            let values = (0..count).map(|i| (entry.source)(grid, i));
            target.push(DataArray::from_values(name, entry.precision, 1, values)?);
        }

        Ok(Piece {
            num_points,
            num_cells,
            point_data,
            cell_data,
            points,
            connectivity: DataArray::from_scalars("connectivity", 1, &connectivity),
            offsets: DataArray::from_scalars("offsets", 1, &offsets),
            types: DataArray::from_scalars("types", 1, &types),
        })
    }

    /// Write the current fields to `name` plus the extension of the format.
    ///
    /// In parallel every participant writes `name-p{rank}` and the first participant also writes
    /// the master file, whose path is returned. Participants agree on the outcome of both phases,
    /// so either all of them succeed or all of them return an error.
    pub fn write(&self, name: &Path) -> Result<PathBuf, Error> {
        let options = self.format.options();

        match self.binding {
            Binding::Local => {
                let piece = self.piece()?;
                let path = utils::append_to_path(name, &format!(".{}", self.format.extension()));
                write_file(&path, |buffer| write_vtk::write_vtu(buffer, &piece, options))?;
                log::debug!("wrote {}", path.display());
                Ok(path)
            }
            Binding::Communicator => {
                let comm = self.grid.comm();
                let extension = self.format.extension();

                if comm.rank() >= comm.size() {
                    return Err(Error::Communicator(format!(
                        "rank {} is outside a communicator of size {}",
                        comm.rank(),
                        comm.size()
                    )));
                }

                let piece_path =
                    utils::append_to_path(name, &format!("-p{}.{extension}", comm.rank()));
                let piece = self.piece().and_then(|piece| {
                    write_file(&piece_path, |buffer| {
                        write_vtk::write_vtu(buffer, &piece, options)
                    })?;
                    log::debug!("wrote piece {}", piece_path.display());
                    Ok(piece)
                });

                let piece = agreed(comm, piece, "a piece")?;

                let master = utils::append_to_path(
                    name,
                    &format!(".{}", self.format.parallel_extension()),
                );

                let written = if comm.rank() == 0 {
                    let stem = utils::file_name(name);
                    let sources: Vec<String> = (0..comm.size())
                        .map(|rank| format!("{stem}-p{rank}.{extension}"))
                        .collect();

                    write_file(&master, |buffer| {
                        write_vtk::write_pvtu(buffer, &piece, options, &sources)
                    })
                    .map(|()| {
                        log::debug!("wrote {} with {} pieces", master.display(), sources.len())
                    })
                } else {
                    Ok(())
                };

                agreed(comm, written, "the master file")?;

                Ok(master)
            }
        }
    }

    /// Write the next frame of the time series and update the series file.
    ///
    /// The step counter only advances when both files were written, on every participant alike.
    pub fn write_step(&mut self, time: f64) -> Result<PathBuf, Error> {
        let (frame, series_path) = match &self.target {
            Target::Series(series) => (
                utils::append_to_path(&series.base, &format!("-{:05}", series.steps.len())),
                utils::append_to_path(&series.base, ".pvd"),
            ),
            Target::Static => return Err(Error::MissingSeries),
        };

        let path = self.write(&frame)?;
        let is_root = self.grid.comm().rank() == 0;

        let series = match &mut self.target {
            Target::Series(series) => series,
            Target::Static => return Err(Error::MissingSeries),
        };

        series.steps.push((time, utils::file_name(&path)));

        let written = if is_root {
            write_file(&series_path, |buffer| write_vtk::write_pvd(buffer, &series.steps))
        } else {
            Ok(())
        };

        let written = match self.binding {
            Binding::Local => written,
            Binding::Communicator => agreed(self.grid.comm(), written, "the series file"),
        };

        if let Err(e) = written {
            series.steps.pop();
            return Err(e);
        }

        if is_root {
            log::debug!(
                "updated {} to {} steps",
                series_path.display(),
                series.steps.len()
            );
        }

        Ok(path)
    }
}

/// Collective check of `outcome` across all participants. A participant that succeeded still
/// fails when another one did not.
fn agreed<C, T>(comm: &C, outcome: Result<T, Error>, what: &str) -> Result<T, Error>
where
    C: Communicator,
{
    if comm.all_ok(outcome.is_ok()) {
        return outcome;
    }

    match outcome {
        Err(e) => Err(e),
        Ok(_) => {
            log::warn!("another participant failed to write {what}");
            Err(Error::Communicator(format!(
                "another participant failed to write {what}"
            )))
        }
    }
}

/// render a file into memory, then write it out in one go
fn write_file<F>(path: &Path, render: F) -> Result<(), Error>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), Error>,
{
    let mut buffer = Vec::new();
    render(&mut buffer)?;
    std::fs::write(path, buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SerialComm;
    use crate::parse::GridReader;

    use std::cell::Cell;

    /// two triangles sharing an edge
    struct Pair<C = SerialComm> {
        comm: C,
    }

    impl<C: Communicator> OutputGrid for Pair<C> {
        type Comm = C;

        fn num_points(&self) -> usize {
            4
        }

        fn num_cells(&self) -> usize {
            2
        }

        fn point(&self, index: usize) -> Point {
            [[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]][index]
        }

        fn cell_type(&self, _cell: usize) -> u8 {
            5
        }

        fn cell_points(&self, cell: usize) -> Cow<'_, [usize]> {
            if cell == 0 {
                Cow::Owned(vec![0, 1, 2])
            } else {
                Cow::Owned(vec![0, 2, 3])
            }
        }

        fn comm(&self) -> &C {
            &self.comm
        }
    }

    /// one of two participants; the other one votes no on the call numbered `fails_at`
    struct Vote {
        rank: usize,
        fails_at: Option<usize>,
        calls: Cell<usize>,
    }

    impl Vote {
        fn new(rank: usize, fails_at: Option<usize>) -> Self {
            Self {
                rank,
                fails_at,
                calls: Cell::new(0),
            }
        }
    }

    impl Communicator for Vote {
        const DISTRIBUTED: bool = true;

        fn size(&self) -> usize {
            2
        }

        fn rank(&self) -> usize {
            self.rank
        }

        fn all_ok(&self, ok: bool) -> bool {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            ok && self.fails_at != Some(call)
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gridwrite-writer-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn writer(filename: Option<&Path>) -> Writer<'static, Pair> {
        let grid = Pair { comm: SerialComm };
        Writer::new(Format::vtu(), grid, Binding::Local, filename).unwrap()
    }

    fn parallel(vote: Vote, filename: Option<&Path>) -> Writer<'static, Pair<Vote>> {
        let grid = Pair { comm: vote };
        Writer::new(Format::vtu(), grid, Binding::Communicator, filename).unwrap()
    }

    fn float<M>(value: f64) -> FieldFn<'static, M> {
        Box::new(move |_, _| FieldValue::Float(value))
    }

    #[test]
    fn fields_are_replaced_in_place() {
        let mut writer = writer(None);
        let index: FieldFn<Pair> = Box::new(|_, i| FieldValue::UInt(i as u64));
        writer.set_field("a", Location::Cells, Precision::Float64, index);
        writer.set_field("b", Location::Points, Precision::Float32, float(1.0));
        writer.set_field("a", Location::Cells, Precision::Float64, float(7.0));

        assert_eq!(writer.field_names(), vec!["a", "b"]);

        let piece = writer.piece().unwrap();
        assert_eq!(piece.cell_data.len(), 1);
        assert_eq!(piece.cell_data[0].ascii(), "7.0 7.0");
        assert_eq!(piece.point_data[0].len(), 4);

        assert!(writer.remove_field("b"));
        assert!(!writer.remove_field("b"));
        writer.clear();
        assert!(writer.field_names().is_empty());
    }

    #[test]
    fn piece_offsets_end_every_cell() {
        let writer = writer(None);
        let piece = writer.piece().unwrap();

        assert_eq!(piece.offsets.ascii(), "3 6");
        assert_eq!(piece.connectivity.ascii(), "0 1 2 0 2 3");
        assert_eq!(piece.types.ascii(), "5 5");
    }

    #[test]
    fn static_writers_have_no_steps() {
        let mut writer = writer(None);
        assert!(matches!(writer.write_step(0.0), Err(Error::MissingSeries)));
    }

    #[test]
    fn series_frames_are_numbered() {
        let dir = scratch("series");
        let base = dir.join("flow");
        let mut writer = writer(Some(&base));
        writer.set_field("t", Location::Cells, Precision::Float64, float(1.0));

        let first = writer.write_step(0.0).unwrap();
        let second = writer.write_step(0.5).unwrap();

        assert_eq!(first, dir.join("flow-00000.vtu"));
        assert_eq!(second, dir.join("flow-00001.vtu"));

        let series = GridReader::open(dir.join("flow.pvd")).unwrap();
        let times: Vec<f64> = series.steps().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0.0, 0.5]);
        assert_eq!(series.num_cells(), 2);
    }

    #[test]
    fn a_participant_with_bad_data_still_votes() {
        let dir = scratch("bad-data");
        let mut writer = parallel(Vote::new(1, None), None);
        writer.set_field("large", Location::Cells, Precision::UInt8, float(300.0));

        let result = writer.write(&dir.join("grid"));

        assert!(matches!(result, Err(Error::ValueOutOfRange { .. })));
        assert_eq!(writer.grid().comm().calls.get(), 1);
        assert!(!dir.join("grid-p1.vtu").exists());
    }

    #[test]
    fn a_failing_peer_fails_every_participant() {
        let dir = scratch("peer");
        let mut writer = parallel(Vote::new(0, Some(1)), None);
        writer.set_field("one", Location::Cells, Precision::Float64, float(1.0));

        let result = writer.write(&dir.join("grid"));

        assert!(matches!(result, Err(Error::Communicator(_))));
        assert_eq!(writer.grid().comm().calls.get(), 1);
        assert!(dir.join("grid-p0.vtu").exists());
        assert!(!dir.join("grid.pvtu").exists());
    }

    #[test]
    fn parallel_writes_agree_after_each_phase() {
        let dir = scratch("phases");
        let writer = parallel(Vote::new(0, None), None);

        let master = writer.write(&dir.join("grid")).unwrap();

        assert_eq!(master, dir.join("grid.pvtu"));
        assert!(master.exists());
        assert_eq!(writer.grid().comm().calls.get(), 2);
    }

    #[test]
    fn failed_series_update_rewinds_every_participant() {
        let dir = scratch("rewind");
        let base = dir.join("flow");

        // the root fails to write the series file, which is the third vote of a step
        let mut writer = parallel(Vote::new(1, Some(3)), Some(&base));

        assert!(matches!(writer.write_step(0.0), Err(Error::Communicator(_))));
        assert_eq!(writer.grid().comm().calls.get(), 3);

        let frame = writer.write_step(0.0).unwrap();
        assert_eq!(frame, dir.join("flow-00000.pvtu"));
    }
}
