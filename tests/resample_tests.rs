// tests/resample_tests.rs
use chrono::{Duration, NaiveDate, NaiveDateTime};
use ipw_rs::batch::read_all;
use ipw_rs::*;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn origin() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn config() -> IpwConfig {
    IpwConfig::default()
        .with_variables(VariableTable::empty().with(FileType::Em, &["melt", "z_s"]))
        .with_time_step(TimeStep::hourly(origin()))
}

/// Write one hourly `em.<step>` file holding two pixels of `melt` and `z_s`
fn write_step(dir: &Path, step: usize, melt: [f64; 2], z_s: [f64; 2]) -> PathBuf {
    let data = Array2::from_shape_vec((2, 2), vec![melt[0], z_s[0], melt[1], z_s[1]]).unwrap();
    let grid = Grid::from_array(
        FileType::Em,
        &[("melt", ByteWidth::Two), ("z_s", ByteWidth::One)],
        1,
        2,
        data,
    )
    .unwrap();
    let path = dir.join(format!("em.{:04}", step));
    grid.write_to(&path).unwrap();
    path
}

fn open_all(paths: &[PathBuf]) -> Vec<Grid> {
    read_all(paths, FileType::Em, &config(), 2)
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn test_four_hours_into_two_hour_buckets() {
    let dir = tempdir().unwrap();
    let paths = vec![
        write_step(dir.path(), 0, [1.0, 2.0], [2.0, 4.0]),
        write_step(dir.path(), 1, [0.0, 1.0], [2.0, 4.0]),
        write_step(dir.path(), 2, [1.0, 1.0], [3.0, 3.0]),
        write_step(dir.path(), 3, [1.0, 1.0], [3.0, 5.0]),
    ];
    let grids = open_all(&paths);

    let out = Reaggregator::hours(2).unwrap().aggregate(&grids).unwrap();
    assert_eq!(out.len(), 2);

    assert_eq!(out[0].interval(), Some((origin(), origin() + Duration::hours(2))));
    assert_eq!(out[0].column("melt").unwrap().to_vec(), vec![1.0, 3.0]);
    assert_eq!(out[0].column("z_s").unwrap().to_vec(), vec![4.0, 8.0]);

    assert_eq!(
        out[1].interval(),
        Some((origin() + Duration::hours(2), origin() + Duration::hours(4)))
    );
    assert_eq!(out[1].column("melt").unwrap().to_vec(), vec![2.0, 2.0]);
    assert_eq!(out[1].column("z_s").unwrap().to_vec(), vec![6.0, 8.0]);

    // widths come from the inputs, ranges from the sums
    let melt = out[1].band("melt").unwrap();
    assert_eq!(melt.bytes(), 2);
    assert_eq!((melt.float_min, melt.float_max), (2.0, 3.0));
    let z_s = out[0].band("z_s").unwrap();
    assert_eq!(z_s.bytes(), 1);
    assert_eq!((z_s.float_min, z_s.float_max), (4.0, 8.0));
}

#[test]
fn test_outputs_can_be_written_and_read_back() {
    let dir = tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..4)
        .map(|step| write_step(dir.path(), step, [1.0, 2.0], [2.0, 4.0]))
        .collect();
    let out = Reaggregator::hours(4)
        .unwrap()
        .aggregate(&open_all(&paths))
        .unwrap();
    assert_eq!(out.len(), 1);

    let path = dir.path().join("daily").join("em.0000");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    out[0].write_to(&path).unwrap();

    let read = Grid::open(&path, FileType::Em, &IpwConfig::default().with_variables(config().variables)).unwrap();
    assert_eq!(read.column("melt").unwrap().to_vec(), vec![4.0, 8.0]);
    assert_eq!(read.column("z_s").unwrap().to_vec(), vec![8.0, 16.0]);
}

#[test]
fn test_consecutive_run_accepted() {
    let dir = tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..3)
        .map(|step| write_step(dir.path(), step, [0.0, 1.0], [1.0, 2.0]))
        .collect();
    let grids = open_all(&paths);

    let intervals = resample::check_consecutive(&grids).unwrap();
    assert_eq!(intervals[2], (origin() + Duration::hours(2), origin() + Duration::hours(3)));
}

#[test]
fn test_gap_rejected_before_summing() {
    let dir = tempdir().unwrap();
    let paths = vec![
        write_step(dir.path(), 0, [0.0, 1.0], [1.0, 2.0]),
        write_step(dir.path(), 1, [0.0, 1.0], [1.0, 2.0]),
        write_step(dir.path(), 5, [0.0, 1.0], [1.0, 2.0]),
    ];
    let grids = open_all(&paths);

    match Reaggregator::hours(2).unwrap().aggregate(&grids) {
        Err(IpwError::Consecutiveness { index, end, next_start }) => {
            assert_eq!(index, 1);
            assert_eq!(end, origin() + Duration::hours(2));
            assert_eq!(next_start, origin() + Duration::hours(5));
        }
        other => panic!("expected consecutiveness error, got {:?}", other.map(|g| g.len())),
    }
}

#[test]
fn test_grids_without_interval_rejected() {
    let dir = tempdir().unwrap();
    let path = write_step(dir.path(), 0, [0.0, 1.0], [1.0, 2.0]);
    let untimed = IpwConfig::default().with_variables(config().variables);
    let grid = Grid::open(&path, FileType::Em, &untimed).unwrap();

    assert!(matches!(
        Reaggregator::hours(1).unwrap().aggregate(&[grid]),
        Err(IpwError::MissingInterval(0))
    ));
}
