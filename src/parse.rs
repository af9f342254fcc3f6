//! # Reading files back
//!
//! [`GridReader`] reads the unstructured grid files this crate writes: single pieces (`.vtu`),
//! parallel master files (`.pvtu`, whose pieces are merged into one mesh) and time series
//! (`.pvd`, opened at their first frame). Values of every precision are returned as `f64`.
//!
//! ```no_run
//! use gridwrite::GridReader;
//!
//! let reader = GridReader::open("standard.vtu")?;
//!
//! println!("{} cells", reader.num_cells());
//! let cdata = reader.cell_field("cdata").unwrap();
//! # Ok::<(), gridwrite::Error>(())
//! ```

mod error;
mod event_summary;

pub use error::{
    BinaryArray, InlineAsciiArray, MalformedAttribute, MalformedXml, MissingArray,
    MissingAttribute, ParseError, ParsedNameOrBytes, UnexpectedAttributeValue, UnexpectedElement,
    UnsupportedFile,
};
use event_summary::EventSummary;

use crate::array::decode_values;
use crate::format::{HeaderPrecision, Precision};
use crate::mesh::Point;
use crate::Error;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use std::path::{Path, PathBuf};

/// A mesh and its fields as read from a file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridReader {
    points: Vec<Point>,
    connectivity: Vec<usize>,
    offsets: Vec<usize>,
    types: Vec<u8>,
    point_data: Vec<(String, Vec<f64>)>,
    cell_data: Vec<(String, Vec<f64>)>,
    steps: Vec<(f64, PathBuf)>,
}

impl GridReader {
    /// read a `.vtu`, `.pvtu` or `.pvd` file, chosen by extension
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        match extension {
            "vtu" => read_vtu(path),
            "pvtu" => read_pvtu(path),
            "pvd" => read_pvd(path),
            _ => {
                let err = UnsupportedFile::new(path.display().to_string());
                Err(Error::from(ParseError::from(err)))
            }
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.types.len()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    /// end of every cell in the connectivity
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn cell_points(&self, cell: usize) -> &[usize] {
        let start = if cell == 0 { 0 } else { self.offsets[cell - 1] };
        &self.connectivity[start..self.offsets[cell]]
    }

    /// VTK cell type ids
    pub fn cell_types(&self) -> &[u8] {
        &self.types
    }

    pub fn point_field(&self, name: &str) -> Option<&[f64]> {
        find(&self.point_data, name)
    }

    pub fn cell_field(&self, name: &str) -> Option<&[f64]> {
        find(&self.cell_data, name)
    }

    pub fn point_field_names(&self) -> Vec<&str> {
        self.point_data.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn cell_field_names(&self) -> Vec<&str> {
        self.cell_data.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// names of all point fields followed by all cell fields
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = self.point_field_names();
        names.extend(self.cell_field_names());
        names
    }

    /// the frames of a time series with their times, empty unless a `.pvd` file was opened
    pub fn steps(&self) -> &[(f64, PathBuf)] {
        &self.steps
    }

    /// read a single frame of a time series
    pub fn open_step(&self, index: usize) -> Result<Self, Error> {
        let (_, path) = self.steps.get(index).ok_or_else(|| {
            ParseError::from(MissingArray::new(format!("time step {index}")))
        })?;

        Self::open(path)
    }
}

fn find<'a>(fields: &'a [(String, Vec<f64>)], name: &str) -> Option<&'a [f64]> {
    fields
        .iter()
        .find(|(field, _)| field == name)
        .map(|(_, values)| values.as_slice())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    PointData,
    CellData,
    Points,
    Cells,
}

#[derive(Debug)]
enum ArrayData {
    Parsed(Vec<f64>),
    Appended(usize),
}

#[derive(Debug)]
struct RawArray {
    section: Section,
    name: String,
    precision: Precision,
    components: usize,
    data: ArrayData,
}

/// header of a `DataArray` element, waiting for its inline content
#[derive(Debug)]
struct OpenArray {
    section: Section,
    name: String,
    precision: Precision,
    components: usize,
    format: Vec<u8>,
}

fn get_attribute_value<'a>(
    bytes_start: &'a BytesStart<'_>,
    attribute_key: &str,
    element_name: &str,
) -> Result<Attribute<'a>, ParseError> {
    for attribute in bytes_start.attributes() {
        let attribute = attribute.map_err(MalformedAttribute::from)?;
        if attribute.key.as_ref() == attribute_key.as_bytes() {
            return Ok(attribute);
        }
    }

    Err(MissingAttribute::new(element_name.into(), attribute_key.into()).into())
}

fn optional_attribute(
    bytes_start: &BytesStart<'_>,
    attribute_key: &str,
) -> Result<Option<Vec<u8>>, ParseError> {
    for attribute in bytes_start.attributes() {
        let attribute = attribute.map_err(MalformedAttribute::from)?;
        if attribute.key.as_ref() == attribute_key.as_bytes() {
            return Ok(Some(attribute.value.into_owned()));
        }
    }

    Ok(None)
}

/// ensure that an attribute's value is one we can read
fn check_attribute_value(
    bytes_start: &BytesStart<'_>,
    element_name: &str,
    attribute_name: &str,
    allowed: &[&str],
) -> Result<(), ParseError> {
    let att = get_attribute_value(bytes_start, attribute_name, element_name)?;

    if allowed.iter().any(|value| att.value.as_ref() == value.as_bytes()) {
        Ok(())
    } else {
        Err(UnexpectedAttributeValue::new(
            element_name.into(),
            attribute_name.into(),
            allowed.join(" or "),
            ParsedNameOrBytes::from(att.value),
        )
        .into())
    }
}

fn parse_usize(bytes: &[u8], element: &str, attribute: &str) -> Result<usize, ParseError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            UnexpectedAttributeValue::new(
                element.into(),
                attribute.into(),
                "an unsigned integer".into(),
                ParsedNameOrBytes::new(bytes),
            )
            .into()
        })
}

fn read_dataarray_header(start: &BytesStart<'_>, section: Section) -> Result<OpenArray, ParseError> {
    let name = match optional_attribute(start, "Name")? {
        Some(name) => String::from_utf8_lossy(&name).into_owned(),
        None => String::new(),
    };

    let type_name = get_attribute_value(start, "type", "DataArray")?;
    let precision = Precision::from_vtk_name(type_name.value.as_ref()).ok_or_else(|| {
        UnexpectedAttributeValue::new(
            "DataArray".into(),
            "type".into(),
            "a scalar type name".into(),
            ParsedNameOrBytes::from(type_name.value.clone()),
        )
    })?;

    let components = match optional_attribute(start, "NumberOfComponents")? {
        Some(value) => parse_usize(&value, "DataArray", "NumberOfComponents")?,
        None => 1,
    };

    let format = optional_attribute(start, "format")?.unwrap_or_else(|| b"ascii".to_vec());

    Ok(OpenArray {
        section,
        name,
        precision,
        components,
        format,
    })
}

/// decode the content of an inline array
fn parse_inline(
    array: &OpenArray,
    text: &[u8],
    header: HeaderPrecision,
) -> Result<Vec<f64>, ParseError> {
    match array.format.as_slice() {
        b"ascii" => {
            let text = std::str::from_utf8(text)
                .map_err(|_| InlineAsciiArray::new(array.name.clone()))?;

            text.split_ascii_whitespace()
                .map(|value| value.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|_| InlineAsciiArray::new(array.name.clone()).into())
        }
        b"binary" => {
            let cleaned: Vec<u8> = text
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            let decoded = base64::decode(cleaned)
                .map_err(|e| BinaryArray::new(array.name.clone(), e.to_string()))?;

            let bytes = split_block(&decoded, header, &array.name)?;
            Ok(decode_values(array.precision, bytes))
        }
        other => Err(UnexpectedAttributeValue::new(
            "DataArray".into(),
            "format".into(),
            "ascii, binary or appended".into(),
            ParsedNameOrBytes::new(other),
        )
        .into()),
    }
}

fn read_header(bytes: &[u8], header: HeaderPrecision) -> usize {
    match header {
        HeaderPrecision::UInt32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
        HeaderPrecision::UInt64 => {
            let mut arr = [0; 8];
            arr.copy_from_slice(&bytes[..8]);
            u64::from_le_bytes(arr) as usize
        }
    }
}

/// the data bytes of a block that starts with a byte count header
fn split_block<'a>(
    block: &'a [u8],
    header: HeaderPrecision,
    name: &str,
) -> Result<&'a [u8], ParseError> {
    let header_size = header.size();

    if block.len() < header_size {
        return Err(BinaryArray::new(name.into(), "block is shorter than its header".into()).into());
    }

    let num_bytes = read_header(block, header);
    block
        .get(header_size..header_size + num_bytes)
        .ok_or_else(|| BinaryArray::new(name.into(), format!("block is shorter than {num_bytes} bytes")).into())
}

fn base64_len(num_bytes: usize) -> usize {
    4 * ((num_bytes + 2) / 3)
}

/// decode a block of the appended section starting at `offset`
fn parse_appended(
    appended: &[u8],
    encoding: &[u8],
    offset: usize,
    header: HeaderPrecision,
    name: &str,
    precision: Precision,
) -> Result<Vec<f64>, ParseError> {
    let name = name.to_string();
    let tail = appended
        .get(offset..)
        .ok_or_else(|| BinaryArray::new(name.clone(), format!("offset {offset} is past the end of the appended data")))?;

    match encoding {
        b"base64" => {
            let header_chars = base64_len(header.size());
            let header_text = tail
                .get(..header_chars)
                .ok_or_else(|| BinaryArray::new(name.clone(), "missing block header".into()))?;
            let header_bytes = base64::decode(header_text)
                .map_err(|e| BinaryArray::new(name.clone(), e.to_string()))?;
            let num_bytes = read_header(&header_bytes, header);

            let block_chars = base64_len(header.size() + num_bytes);
            let block_text = tail
                .get(..block_chars)
                .ok_or_else(|| BinaryArray::new(name.clone(), "block is truncated".into()))?;
            let block = base64::decode(block_text)
                .map_err(|e| BinaryArray::new(name.clone(), e.to_string()))?;

            let bytes = split_block(&block, header, &name)?;
            Ok(decode_values(precision, bytes))
        }
        _ => {
            let bytes = split_block(tail, header, &name)?;
            Ok(decode_values(precision, bytes))
        }
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// read a single unstructured grid piece
fn read_vtu(path: &Path) -> Result<GridReader, Error> {
    let bytes = std::fs::read(path)?;

    // binary appended data is not valid xml, only the part before it is handed to the reader
    let (xml, appended) = match find_bytes(&bytes, b"<AppendedData") {
        Some(start) => {
            let tag_end = bytes[start..]
                .iter()
                .position(|&b| b == b'>')
                .map(|p| start + p + 1)
                .unwrap_or(bytes.len());
            let data_start = bytes[tag_end..]
                .iter()
                .position(|&b| b == b'_')
                .map(|p| tag_end + p + 1)
                .unwrap_or(bytes.len());

            (&bytes[..tag_end], &bytes[data_start..])
        }
        None => (&bytes[..], &bytes[bytes.len()..]),
    };

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buffer = Vec::new();
    let mut section = Section::None;
    let mut header = HeaderPrecision::UInt32;
    let mut encoding = b"raw".to_vec();
    let mut open_array: Option<OpenArray> = None;
    let mut arrays: Vec<RawArray> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(|e| ParseError::from(MalformedXml::from(e)))?;

        match &event {
            Event::Start(start) | Event::Empty(start) => {
                let is_empty = matches!(event, Event::Empty(_));

                match start.name() {
                    QName(b"VTKFile") => {
                        check_attribute_value(start, "VTKFile", "type", &["UnstructuredGrid"])?;
                        check_attribute_value(start, "VTKFile", "byte_order", &["LittleEndian"])?;

                        if let Some(value) = optional_attribute(start, "header_type")? {
                            header = HeaderPrecision::from_vtk_name(&value).ok_or_else(|| {
                                ParseError::from(UnexpectedAttributeValue::new(
                                    "VTKFile".into(),
                                    "header_type".into(),
                                    "UInt32 or UInt64".into(),
                                    ParsedNameOrBytes::new(&value),
                                ))
                            })?;
                        }

                        seen_root = true;
                    }
                    _ if !seen_root => {
                        let err = UnexpectedElement::new("VTKFile", EventSummary::new(&event));
                        return Err(ParseError::from(err).into());
                    }
                    QName(b"PointData") if !is_empty => section = Section::PointData,
                    QName(b"CellData") if !is_empty => section = Section::CellData,
                    QName(b"Points") if !is_empty => section = Section::Points,
                    QName(b"Cells") if !is_empty => section = Section::Cells,
                    QName(b"DataArray") => {
                        let array = read_dataarray_header(start, section)?;

                        if array.format == b"appended" {
                            let offset = get_attribute_value(start, "offset", "DataArray")?;
                            let offset = parse_usize(&offset.value, "DataArray", "offset")?;

                            arrays.push(RawArray {
                                section: array.section,
                                name: array.name,
                                precision: array.precision,
                                components: array.components,
                                data: ArrayData::Appended(offset),
                            });
                        } else if is_empty {
                            arrays.push(RawArray {
                                section: array.section,
                                name: array.name,
                                precision: array.precision,
                                components: array.components,
                                data: ArrayData::Parsed(Vec::new()),
                            });
                        } else {
                            open_array = Some(array);
                        }
                    }
                    QName(b"AppendedData") => {
                        if let Some(value) = optional_attribute(start, "encoding")? {
                            encoding = value;
                        }
                    }
                    _ => (),
                }
            }
            Event::Text(text) => {
                if let Some(array) = open_array.take() {
                    let content: &[u8] = text;
                    let values = parse_inline(&array, content, header)?;
                    arrays.push(RawArray {
                        section: array.section,
                        name: array.name,
                        precision: array.precision,
                        components: array.components,
                        data: ArrayData::Parsed(values),
                    });
                }
            }
            Event::End(end) => match end.name() {
                QName(b"DataArray") => {
                    // an inline array without any content
                    if let Some(array) = open_array.take() {
                        arrays.push(RawArray {
                            section: array.section,
                            name: array.name,
                            precision: array.precision,
                            components: array.components,
                            data: ArrayData::Parsed(Vec::new()),
                        });
                    }
                }
                QName(b"PointData") | QName(b"CellData") | QName(b"Points") | QName(b"Cells") => {
                    section = Section::None
                }
                _ => (),
            },
            Event::Eof => break,
            _ => (),
        }

        buffer.clear();
    }

    if !seen_root {
        return Err(ParseError::from(UnexpectedElement::new("VTKFile", EventSummary::eof())).into());
    }

    let mut grid = GridReader::default();
    let mut point_array = None;

    for array in arrays {
        let RawArray {
            section,
            name,
            precision,
            components,
            data,
        } = array;

        let values = match data {
            ArrayData::Parsed(values) => values,
            ArrayData::Appended(offset) => {
                parse_appended(appended, &encoding, offset, header, &name, precision)?
            }
        };

        log::trace!("read array `{name}` with {} values", values.len());

        match (section, name.as_str()) {
            (Section::PointData, _) => grid.point_data.push((name, values)),
            (Section::CellData, _) => grid.cell_data.push((name, values)),
            (Section::Points, _) => point_array = Some((components, values)),
            (Section::Cells, "connectivity") => {
                grid.connectivity = values.into_iter().map(|v| v as usize).collect()
            }
            (Section::Cells, "offsets") => {
                grid.offsets = values.into_iter().map(|v| v as usize).collect()
            }
            (Section::Cells, "types") => grid.types = values.into_iter().map(|v| v as u8).collect(),
            _ => (),
        }
    }

    let (components, coordinates) =
        point_array.ok_or_else(|| ParseError::from(MissingArray::new("Points".into())))?;

    grid.points = coordinates
        .chunks_exact(components.max(1))
        .map(|chunk| {
            let mut point = [0.0; 3];
            for (axis, value) in chunk.iter().take(3).enumerate() {
                point[axis] = *value;
            }
            point
        })
        .collect();

    log::debug!(
        "read {} with {} points and {} cells",
        path.display(),
        grid.num_points(),
        grid.num_cells()
    );

    Ok(grid)
}

/// paths of the files referenced by `attribute` of every `element` in an xml file
fn read_references(
    path: &Path,
    file_type: &str,
    element: &[u8],
    attribute: &str,
) -> Result<Vec<(BytesStart<'static>, PathBuf)>, Error> {
    let bytes = std::fs::read(path)?;
    let directory = path.parent().unwrap_or_else(|| Path::new(""));

    let mut reader = Reader::from_reader(bytes.as_slice());
    reader.trim_text(true);

    let mut buffer = Vec::new();
    let mut references = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(|e| ParseError::from(MalformedXml::from(e)))?;

        match &event {
            Event::Start(start) | Event::Empty(start) => {
                if start.name() == QName(b"VTKFile") {
                    check_attribute_value(start, "VTKFile", "type", &[file_type])?;
                } else if start.name().as_ref() == element {
                    let name = String::from_utf8_lossy(element).into_owned();
                    let source = get_attribute_value(start, attribute, &name)?;
                    let source = String::from_utf8_lossy(&source.value).into_owned();
                    references.push((start.clone().into_owned(), directory.join(source)));
                }
            }
            Event::Eof => break,
            _ => (),
        }

        buffer.clear();
    }

    Ok(references)
}

/// read every piece of a parallel file and merge them into a single mesh
fn read_pvtu(path: &Path) -> Result<GridReader, Error> {
    let mut merged = GridReader::default();

    for (_, source) in read_references(path, "PUnstructuredGrid", b"Piece", "Source")? {
        let piece = read_vtu(&source)?;
        let point_shift = merged.points.len();
        let connectivity_shift = merged.connectivity.len();

        merged.points.extend_from_slice(&piece.points);
        merged
            .connectivity
            .extend(piece.connectivity.iter().map(|p| p + point_shift));
        merged
            .offsets
            .extend(piece.offsets.iter().map(|o| o + connectivity_shift));
        merged.types.extend_from_slice(&piece.types);

        merge_fields(&mut merged.point_data, piece.point_data);
        merge_fields(&mut merged.cell_data, piece.cell_data);
    }

    Ok(merged)
}

fn merge_fields(merged: &mut Vec<(String, Vec<f64>)>, piece: Vec<(String, Vec<f64>)>) {
    for (name, values) in piece {
        match merged.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => existing.extend(values),
            None => merged.push((name, values)),
        }
    }
}

/// read the step list of a time series and open its first frame
fn read_pvd(path: &Path) -> Result<GridReader, Error> {
    let mut steps = Vec::new();

    for (dataset, file) in read_references(path, "Collection", b"DataSet", "file")? {
        let time = match optional_attribute(&dataset, "timestep")? {
            Some(value) => std::str::from_utf8(&value)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    ParseError::from(UnexpectedAttributeValue::new(
                        "DataSet".into(),
                        "timestep".into(),
                        "a number".into(),
                        ParsedNameOrBytes::new(&value),
                    ))
                })?,
            None => 0.0,
        };

        steps.push((time, file));
    }

    let mut grid = match steps.first() {
        Some((_, first)) => GridReader::open(first)?,
        None => GridReader::default(),
    };

    grid.steps = steps;
    Ok(grid)
}
