use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridwrite::{make_analytic_grid_function, Format, GridWriter, Order, Rectilinear2D};

use std::path::PathBuf;

fn scratch() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gridwrite-bench-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_first_order(n: usize, dir: &PathBuf) {
    let grid = Rectilinear2D::uniform([0., 0.], [1., 1.], [n, n]).unwrap();
    let f = make_analytic_grid_function(|x| x[0] * x[1], &grid);

    let mut writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    writer.add_cell_function("cfunc", &f);
    writer.add_point_function("pfunc", &f);
    writer.add_cell_data("cdata", |element| element.index() as f64);

    writer.write(dir.join("first_order")).unwrap();
}

fn write_second_order(n: usize, dir: &PathBuf) {
    let grid = Rectilinear2D::uniform([0., 0.], [1., 1.], [n, n]).unwrap();
    let f = make_analytic_grid_function(|x| x[0] * x[1], &grid);

    let mut writer = GridWriter::with_order(Format::vtu(), &grid, Order::<2>).unwrap();
    writer.add_point_function("pfunc", &f);

    writer.write(dir.join("second_order")).unwrap();
}

fn write_grid_bench(c: &mut Criterion) {
    let dir = scratch();

    c.bench_function("write 10x10", |b| {
        b.iter(|| write_first_order(black_box(10), &dir))
    });

    c.bench_function("write 100x100", |b| {
        b.iter(|| write_first_order(black_box(100), &dir))
    });

    c.bench_function("write 100x100 order 2", |b| {
        b.iter(|| write_second_order(black_box(100), &dir))
    });
}

criterion_group!(benches, write_grid_bench);
criterion_main!(benches);
