//! Parallel output with a communicator whose participants are simulated one after another.

use gridwrite::{
    make_analytic_grid_function, Binding, Communicator, Format, Grid, GridReader, GridWriter,
    Rectilinear2D,
};

use std::path::PathBuf;

struct FakeComm {
    rank: usize,
    size: usize,
}

impl Communicator for FakeComm {
    const DISTRIBUTED: bool = true;

    fn size(&self) -> usize {
        self.size
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn all_ok(&self, ok: bool) -> bool {
        ok
    }
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gridwrite-parallel-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// the strip of a unit square owned by `rank`
fn partition(rank: usize, size: usize) -> Rectilinear2D<FakeComm> {
    let width = 1.0 / size as f64;
    let lower = [rank as f64 * width, 0.];
    let upper = [(rank + 1) as f64 * width, 1.];

    Rectilinear2D::uniform(lower, upper, [2, 4])
        .unwrap()
        .with_comm(FakeComm { rank, size })
}

#[test]
fn pieces_and_master_file() {
    let dir = scratch("pieces");
    let grids: Vec<_> = (0..2).map(|rank| partition(rank, 2)).collect();

    // the first participant writes last, so the master file is written after every piece exists
    for grid in grids.iter().rev() {
        let f = make_analytic_grid_function(|x| x[0], grid);
        let rank = grid.comm().rank();

        let mut writer = GridWriter::new(Format::vtu(), grid).unwrap();
        assert_eq!(writer.binding(), Binding::Communicator);
        assert_eq!(writer.participants(), 2);

        writer.add_cell_data("rank", move |_| rank as u32);
        writer.add_point_function("x", &f);

        let master = writer.write(dir.join("strip")).unwrap();
        assert_eq!(master, dir.join("strip.pvtu"));
        assert!(dir.join(format!("strip-p{rank}.vtu")).exists());
    }

    let master = std::fs::read_to_string(dir.join("strip.pvtu")).unwrap();
    assert!(master.contains(r#"Source="strip-p0.vtu""#));
    assert!(master.contains(r#"Source="strip-p1.vtu""#));
    assert!(master.contains("PCellData"));

    let merged = GridReader::open(dir.join("strip.pvtu")).unwrap();
    assert_eq!(merged.num_cells(), 16);
    assert_eq!(merged.num_points(), 30);

    let ranks = merged.cell_field("rank").unwrap();
    assert!(ranks[..8].iter().all(|&r| r == 0.0));
    assert!(ranks[8..].iter().all(|&r| r == 1.0));

    // connectivity of the second piece is shifted past the points of the first
    assert!(merged.cell_points(8).iter().all(|&p| p >= 15));

    for (point, value) in merged.point_field("x").unwrap().iter().enumerate() {
        assert!((value - merged.points()[point][0]).abs() < 1e-12);
    }
}

#[test]
fn a_single_participant_writes_locally() {
    let dir = scratch("single");
    let grid = partition(0, 1);

    let writer = GridWriter::new(Format::vtu(), &grid).unwrap();
    assert_eq!(writer.binding(), Binding::Local);

    let path = writer.write(dir.join("alone")).unwrap();
    assert_eq!(path, dir.join("alone.vtu"));
}

#[test]
fn parallel_time_series_lists_master_files() {
    let dir = scratch("series");
    let grids: Vec<_> = (0..2).map(|rank| partition(rank, 2)).collect();

    for grid in grids.iter().rev() {
        let mut writer = GridWriter::time_series(Format::vtu(), grid, dir.join("run")).unwrap();
        writer.add_cell_data("one", |_| 1.0);

        assert_eq!(writer.write(0.0).unwrap(), dir.join("run-00000.pvtu"));
        assert_eq!(writer.write(1.0).unwrap(), dir.join("run-00001.pvtu"));
    }

    let series = GridReader::open(dir.join("run.pvd")).unwrap();
    assert_eq!(series.steps().len(), 2);
    assert_eq!(series.steps()[1].1, dir.join("run-00001.pvtu"));
    assert_eq!(series.num_cells(), 16);
}
