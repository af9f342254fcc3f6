use gridwrite::{
    make_analytic_grid_function, precision, CellKind, CellValues, DataFormat, Encoding, Error,
    Format, Grid, GridReader, GridWriter, Order, Rectilinear2D, Rectilinear3D, UnstructuredGrid,
    VertexValues, VtuOptions,
};

use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gridwrite-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn standard_grid() -> Rectilinear2D {
    Rectilinear2D::uniform([0., 0.], [1., 1.], [10, 10]).unwrap()
}

#[test]
fn standard_output() {
    let dir = scratch("standard");
    let grid = standard_grid();

    let mut writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    writer.add_cell_data("cdata", |_| 0.0);
    writer.add_point_data("pdata", |_| 0.0);

    let path = writer.write(dir.join("standard")).unwrap();
    assert_eq!(path, dir.join("standard.vtu"));

    let read = GridReader::open(&path).unwrap();
    assert_eq!(read.num_cells(), 100);
    assert_eq!(read.num_points(), 121);
    assert_eq!(read.field_names(), vec!["pdata", "cdata"]);
    assert!(read.cell_field("cdata").unwrap().iter().all(|&v| v == 0.0));
    assert!(read.point_field("pdata").unwrap().iter().all(|&v| v == 0.0));
    assert!(read.cell_types().iter().all(|&t| t == CellKind::Quadrilateral.vtk_linear()));
}

#[test]
fn cell_and_point_values_follow_the_mesh() {
    let dir = scratch("values");
    let grid = standard_grid();
    let f = make_analytic_grid_function(|x| x[0], &grid);

    let mut writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    writer.add_cell_function("cfunc", &f);
    writer.add_point_function("pfunc", &f);
    writer.add_cell_data("index", |element| element.index() as u32);
    writer.add_point_data("y", |vertex| vertex.position()[1]);

    let read = GridReader::open(writer.write(dir.join("values")).unwrap()).unwrap();

    for (cell, value) in read.cell_field("cfunc").unwrap().iter().enumerate() {
        let expected = grid.element(cell).center()[0];
        assert!((value - expected).abs() < 1e-12);
    }

    for (point, value) in read.point_field("pfunc").unwrap().iter().enumerate() {
        assert!((value - read.points()[point][0]).abs() < 1e-12);
    }

    for (point, value) in read.point_field("y").unwrap().iter().enumerate() {
        assert_eq!(*value, read.points()[point][1]);
    }

    let indices: Vec<f64> = (0..100).map(|i| i as f64).collect();
    assert_eq!(read.cell_field("index").unwrap(), indices.as_slice());
}

#[test]
fn callables_and_cell_values_write_the_same_file() {
    let dir = scratch("equivalent");
    let grid = standard_grid();
    let values: Vec<f64> = (0..grid.num_cells()).map(|i| (i as f64).sqrt()).collect();

    let mut callable = GridWriter::new(Format::vtu(), &grid).unwrap();
    callable.add_cell_data("c", |element| values[element.index()]);
    let first = callable.write(dir.join("callable")).unwrap();

    let mut function = GridWriter::new(Format::vtu(), &grid).unwrap();
    function.add_cell_function("c", CellValues::new(&values));
    let second = function.write(dir.join("function")).unwrap();

    assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
}

#[test]
fn vertex_values_are_exact_at_vertices() {
    let dir = scratch("vertex-values");
    let grid = standard_grid();
    let values: Vec<f64> = (0..grid.num_vertices()).map(|i| i as f64).collect();

    let mut writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    writer.add_point_function("v", VertexValues::new(&values));

    let read = GridReader::open(writer.write(dir.join("vertex")).unwrap()).unwrap();
    for (point, value) in read.point_field("v").unwrap().iter().enumerate() {
        assert!((value - point as f64).abs() < 1e-9);
    }
}

#[test]
fn cleared_writers_write_only_the_mesh() {
    let dir = scratch("cleared");
    let grid = standard_grid();

    let mut writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    writer.add_cell_data("cdata", |_| 1.0);
    writer.add_point_data("pdata", |_| 1.0);
    writer.clear();

    let read = GridReader::open(writer.write(dir.join("cleared")).unwrap()).unwrap();
    assert!(read.field_names().is_empty());
    assert_eq!(read.num_cells(), 100);
}

#[test]
fn precision_overrides() {
    let dir = scratch("precision");
    let grid = standard_grid();

    let mut writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    writer.add_cell_data_as("truncated", |element| element.index() as f64 + 0.5, precision::INT32);
    writer.add_point_data_as("single", |_| 0.25, precision::FLOAT32);

    let path = writer.write(dir.join("precision")).unwrap();
    let text = String::from_utf8_lossy(&std::fs::read(&path).unwrap()).into_owned();
    assert!(text.contains(r#"type="Int32" Name="truncated""#));
    assert!(text.contains(r#"type="Float32" Name="single""#));

    let read = GridReader::open(&path).unwrap();
    assert_eq!(read.cell_field("truncated").unwrap()[3], 3.0);
    assert!(read.point_field("single").unwrap().iter().all(|&v| v == 0.25));
}

#[test]
fn unrepresentable_values_fail_the_write() {
    let dir = scratch("out-of-range");
    let grid = standard_grid();

    let mut writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    writer.add_cell_data("index", |element| element.index() as f64);
    writer.add_cell_data_as("large", |_| 300.0, precision::UINT8);

    assert!(matches!(
        writer.write(dir.join("large")),
        Err(Error::ValueOutOfRange { .. })
    ));

    // nothing is written and the registered fields stay as they were
    assert!(!dir.join("large.vtu").exists());
    assert_eq!(writer.field_names(), vec!["index", "large"]);

    writer.add_cell_data_as("large", |_| 255.0, precision::UINT8);
    let read = GridReader::open(writer.write(dir.join("large")).unwrap()).unwrap();
    assert_eq!(read.cell_field("large").unwrap()[0], 255.0);
}

#[test]
fn wide_integers_are_written_exactly() {
    let dir = scratch("wide");
    let grid = Rectilinear2D::uniform([0., 0.], [1., 1.], [2, 1]).unwrap();
    let format = Format::vtu().with(VtuOptions {
        encoding: Encoding::Ascii,
        data_format: DataFormat::Inlined,
        ..Default::default()
    });

    let mut writer = GridWriter::new(format, &grid).unwrap();
    writer.add_cell_data("max", |_| u64::MAX);
    writer.add_cell_data("odd", |_| (1i64 << 53) + 1);

    let path = writer.write(dir.join("wide")).unwrap();
    let text = std::fs::read_to_string(path).unwrap();

    assert!(text.contains("18446744073709551615 18446744073709551615"));
    assert!(text.contains("9007199254740993 9007199254740993"));
}

#[cfg(feature = "lagrange")]
#[test]
fn second_order_output_samples_nodes() {
    let dir = scratch("order-2");
    let grid = standard_grid();
    let f = make_analytic_grid_function(|x| x[0], &grid);

    let mut writer = GridWriter::with_order(Format::vtu(), &grid, Order::<2>).unwrap();
    writer.add_cell_function("cfunc", &f);
    writer.add_point_function("pfunc", &f);
    writer.add_cell_data("cdata", |element| element.index() as f64);

    let read = GridReader::open(writer.write(dir.join("order2")).unwrap()).unwrap();

    assert_eq!(read.num_cells(), 100);
    assert_eq!(read.num_points(), 21 * 21);
    assert!(read.cell_types().iter().all(|&t| t == CellKind::Quadrilateral.vtk_lagrange()));
    assert!((0..read.num_cells()).all(|c| read.cell_points(c).len() == 9));

    for (cell, value) in read.cell_field("cfunc").unwrap().iter().enumerate() {
        let expected = grid.element(cell).center()[0];
        assert!((value - expected).abs() < 1e-12);
        assert_eq!(read.cell_field("cdata").unwrap()[cell], cell as f64);
    }

    for (point, value) in read.point_field("pfunc").unwrap().iter().enumerate() {
        assert!((value - read.points()[point][0]).abs() < 1e-12);
    }
}

#[cfg(feature = "lagrange")]
#[test]
fn hexahedra_at_order_two() {
    let dir = scratch("hex-order-2");
    let grid = Rectilinear3D::uniform([0., 0., 0.], [1., 1., 1.], [2, 2, 2]).unwrap();
    let f = make_analytic_grid_function(|x| x[0] * x[1] * x[2], &grid);

    let mut writer = GridWriter::with_order(Format::vtu(), &grid, Order::<2>).unwrap();
    writer.add_point_function("xyz", &f);

    let read = GridReader::open(writer.write(dir.join("hex")).unwrap()).unwrap();
    assert_eq!(read.num_cells(), 8);
    assert_eq!(read.num_points(), 125);
    assert!((0..8).all(|c| read.cell_points(c).len() == 27));

    for (point, value) in read.point_field("xyz").unwrap().iter().enumerate() {
        let [x, y, z] = read.points()[point];
        assert!((value - x * y * z).abs() < 1e-12);
    }
}

#[cfg(feature = "lagrange")]
#[test]
fn mixed_elements_at_order_two() {
    let dir = scratch("mixed");
    let points = vec![
        [0., 0., 0.],
        [1., 0., 0.],
        [2., 0., 0.],
        [0., 1., 0.],
        [1., 1., 0.],
    ];
    let cells = vec![
        (CellKind::Quadrilateral, vec![0, 1, 4, 3]),
        (CellKind::Triangle, vec![1, 2, 4]),
    ];
    let grid = UnstructuredGrid::new(2, points, cells).unwrap();
    let f = make_analytic_grid_function(|x| x[0] + 2.0 * x[1], &grid);

    let mut writer = GridWriter::with_order(Format::vtu(), &grid, Order::<2>).unwrap();
    writer.add_point_function("f", &f);

    let read = GridReader::open(writer.write(dir.join("mixed")).unwrap()).unwrap();
    assert_eq!(read.num_points(), 12);
    assert_eq!(read.cell_types(), &[70, 69]);

    for (point, value) in read.point_field("f").unwrap().iter().enumerate() {
        let [x, y, _] = read.points()[point];
        assert!((value - (x + 2.0 * y)).abs() < 1e-12);
    }
}

#[test]
fn time_series_lists_every_frame() {
    let dir = scratch("series");
    let grid = standard_grid();

    let mut writer = GridWriter::time_series(Format::vtu(), &grid, dir.join("series")).unwrap();
    writer.add_cell_data("cdata", |element| element.index() as f64);

    for step in 0..3 {
        let frame = writer.write(step as f64 * 0.1).unwrap();
        assert_eq!(frame, dir.join(format!("series-{step:05}.vtu")));
    }

    let series = GridReader::open(dir.join("series.pvd")).unwrap();
    assert_eq!(series.steps().len(), 3);
    assert!((series.steps()[2].0 - 0.2).abs() < 1e-12);
    assert_eq!(series.num_cells(), 100);

    let last = series.open_step(2).unwrap();
    assert_eq!(last.cell_field("cdata").unwrap()[99], 99.0);
}

#[test]
fn failed_frames_do_not_advance_the_series() {
    let dir = scratch("series-failure");
    let grid = standard_grid();

    let mut writer = GridWriter::time_series(Format::vtu(), &grid, dir.join("flow")).unwrap();
    writer.add_cell_data_as("level", |_| -1.0, precision::UINT16);

    assert!(writer.write(0.0).is_err());
    assert!(!dir.join("flow.pvd").exists());

    writer.add_cell_data_as("level", |_| 1.0, precision::UINT16);
    let frame = writer.write(0.0).unwrap();
    assert_eq!(frame, dir.join("flow-00000.vtu"));

    let series = GridReader::open(dir.join("flow.pvd")).unwrap();
    assert_eq!(series.steps().len(), 1);
}

#[cfg(feature = "lagrange")]
#[test]
fn higher_order_time_series() {
    let dir = scratch("series-order-3");
    let grid = Rectilinear2D::uniform([0., 0.], [1., 1.], [2, 2]).unwrap();
    let f = make_analytic_grid_function(|x| x[1], &grid);

    let mut writer =
        GridWriter::time_series_with_order(Format::vtu(), &grid, dir.join("flow"), Order::<3>)
            .unwrap();
    writer.add_point_function("y", &f);
    writer.write(0.0).unwrap();
    writer.write(1.0).unwrap();

    let series = GridReader::open(dir.join("flow.pvd")).unwrap();
    assert_eq!(series.steps().len(), 2);
    assert_eq!(series.num_points(), 7 * 7);
}
