//! Emission of VTK XML files: single pieces (`.vtu`), parallel master files (`.pvtu`) and
//! time series collections (`.pvd`).

use crate::array::DataArray;
use crate::format::{DataFormat, Encoding, VtuOptions};
use crate::Error;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use std::io::Write;

/// Everything a single `.vtu` file contains
#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub(crate) num_points: usize,
    pub(crate) num_cells: usize,
    pub(crate) point_data: Vec<DataArray>,
    pub(crate) cell_data: Vec<DataArray>,
    pub(crate) points: DataArray,
    pub(crate) connectivity: DataArray,
    pub(crate) offsets: DataArray,
    pub(crate) types: DataArray,
}

impl Piece {
    /// arrays in the order they appear in the file
    fn arrays(&self) -> impl Iterator<Item = &DataArray> {
        self.point_data
            .iter()
            .chain(self.cell_data.iter())
            .chain(std::iter::once(&self.points))
            .chain([&self.connectivity, &self.offsets, &self.types])
    }
}

/// Tracks the offset of each array inside the `AppendedData` section
struct Appended {
    next_offset: usize,
    blocks: Vec<u8>,
}

impl Appended {
    fn new() -> Self {
        Self {
            next_offset: 0,
            blocks: Vec::new(),
        }
    }

    /// add the block of `array`, returning its offset
    fn push(&mut self, array: &DataArray, options: &VtuOptions) -> usize {
        let offset = self.next_offset;

        match options.encoding {
            Encoding::Base64 => self
                .blocks
                .extend(array.base64_block(options.header_precision).into_bytes()),
            _ => self
                .blocks
                .extend(array.binary_block(options.header_precision)),
        }

        self.next_offset = self.blocks.len();
        offset
    }
}

fn vtk_file_start(file_type: &str, header_type: Option<&str>) -> BytesStart<'static> {
    let mut start = BytesStart::new("VTKFile");
    start.push_attribute(("type", file_type));
    start.push_attribute(("version", "1.0"));
    start.push_attribute(("byte_order", "LittleEndian"));
    if let Some(header_type) = header_type {
        start.push_attribute(("header_type", header_type));
    }
    start.into_owned()
}

fn open<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn dataarray_start<'a>(tag: &'a str, array: &'a DataArray) -> BytesStart<'a> {
    let components = array.components.to_string();
    let mut start = BytesStart::new(tag);
    start.push_attribute(("type", array.precision.vtk_name()));
    start.push_attribute(("Name", array.name.as_str()));
    start.push_attribute(("NumberOfComponents", components.as_str()));
    start
}

/// write a single data array inline, or a reference to its block in the appended section
fn write_dataarray<W: Write>(
    writer: &mut Writer<W>,
    array: &DataArray,
    options: &VtuOptions,
    appended: &mut Appended,
) -> Result<(), Error> {
    let mut start = dataarray_start("DataArray", array);

    match options.data_format {
        DataFormat::Appended => {
            let offset = appended.push(array, options);
            start.push_attribute(("format", "appended"));
            start.push_attribute(("offset", offset.to_string().as_str()));
            writer.write_event(Event::Empty(start))?;
        }
        DataFormat::Inlined => {
            let text = match options.encoding {
                Encoding::Ascii => {
                    start.push_attribute(("format", "ascii"));
                    array.ascii()
                }
                _ => {
                    start.push_attribute(("format", "binary"));
                    array.base64_block(options.header_precision)
                }
            };

            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            close(writer, "DataArray")?;
        }
    }

    log::trace!(
        "wrote data array `{}` with {} values",
        array.name,
        array.len()
    );

    Ok(())
}

fn write_section<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    arrays: &[DataArray],
    options: &VtuOptions,
    appended: &mut Appended,
) -> Result<(), Error> {
    if arrays.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }

    open(writer, name)?;
    for array in arrays {
        write_dataarray(writer, array, options, appended)?;
    }
    close(writer, name)
}

/// Write a complete `.vtu` file
pub(crate) fn write_vtu<W: Write>(
    inner: W,
    piece: &Piece,
    options: &VtuOptions,
) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);
    let mut appended = Appended::new();

    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.write_event(Event::Start(vtk_file_start(
        "UnstructuredGrid",
        Some(options.header_precision.vtk_name()),
    )))?;
    open(&mut writer, "UnstructuredGrid")?;

    let num_points = piece.num_points.to_string();
    let num_cells = piece.num_cells.to_string();
    let piece_start = BytesStart::new("Piece").with_attributes([
        ("NumberOfPoints", num_points.as_str()),
        ("NumberOfCells", num_cells.as_str()),
    ]);
    writer.write_event(Event::Start(piece_start))?;

    write_section(&mut writer, "PointData", &piece.point_data, options, &mut appended)?;
    write_section(&mut writer, "CellData", &piece.cell_data, options, &mut appended)?;
    write_section(
        &mut writer,
        "Points",
        std::slice::from_ref(&piece.points),
        options,
        &mut appended,
    )?;

    open(&mut writer, "Cells")?;
    for array in [&piece.connectivity, &piece.offsets, &piece.types] {
        write_dataarray(&mut writer, array, options, &mut appended)?;
    }
    close(&mut writer, "Cells")?;

    close(&mut writer, "Piece")?;
    close(&mut writer, "UnstructuredGrid")?;

    if options.data_format == DataFormat::Appended {
        let encoding = match options.encoding {
            Encoding::Base64 => "base64",
            _ => "raw",
        };

        let start = BytesStart::new("AppendedData").with_attributes([("encoding", encoding)]);
        writer.write_event(Event::Start(start))?;

        let inner = writer.inner();
        inner.write_all(b"\n_")?;
        inner.write_all(&appended.blocks)?;
        inner.write_all(b"\n")?;

        close(&mut writer, "AppendedData")?;
    }

    close(&mut writer, "VTKFile")?;

    log::trace!(
        "wrote piece with {} arrays ({} appended bytes)",
        piece.arrays().count(),
        appended.blocks.len()
    );

    Ok(())
}

/// Write a `.pvtu` file that references one piece per participant
pub(crate) fn write_pvtu<W: Write>(
    inner: W,
    layout: &Piece,
    options: &VtuOptions,
    sources: &[String],
) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.write_event(Event::Start(vtk_file_start(
        "PUnstructuredGrid",
        Some(options.header_precision.vtk_name()),
    )))?;

    let grid = BytesStart::new("PUnstructuredGrid").with_attributes([("GhostLevel", "0")]);
    writer.write_event(Event::Start(grid))?;

    for (section, arrays) in [
        ("PPointData", layout.point_data.as_slice()),
        ("PCellData", layout.cell_data.as_slice()),
        ("PPoints", std::slice::from_ref(&layout.points)),
    ] {
        if arrays.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new(section)))?;
            continue;
        }

        open(&mut writer, section)?;
        for array in arrays {
            writer.write_event(Event::Empty(dataarray_start("PDataArray", array)))?;
        }
        close(&mut writer, section)?;
    }

    for source in sources {
        let piece = BytesStart::new("Piece").with_attributes([("Source", source.as_str())]);
        writer.write_event(Event::Empty(piece))?;
    }

    close(&mut writer, "PUnstructuredGrid")?;
    close(&mut writer, "VTKFile")?;

    Ok(())
}

/// Write a `.pvd` collection listing every step of a time series
pub(crate) fn write_pvd<W: Write>(inner: W, steps: &[(f64, String)]) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.write_event(Event::Start(vtk_file_start("Collection", None)))?;
    open(&mut writer, "Collection")?;

    for (time, file) in steps {
        let mut buffer = ryu::Buffer::new();
        let timestep = buffer.format(*time);

        let dataset = BytesStart::new("DataSet").with_attributes([
            ("timestep", timestep),
            ("group", ""),
            ("part", "0"),
            ("file", file.as_str()),
        ]);
        writer.write_event(Event::Empty(dataset))?;
    }

    close(&mut writer, "Collection")?;
    close(&mut writer, "VTKFile")?;

    Ok(())
}
