// src/batch.rs
//! Reading many grids at once.
//!
//! Grids share nothing, so a run's worth of files can be parsed on a few
//! worker threads. One failing file does not affect the others.

use crate::config::IpwConfig;
use crate::error::{IpwError, Result};
use crate::grid::Grid;
use crate::types::FileType;
use crossbeam_channel::unbounded;
use parking_lot::Mutex;
use std::path::Path;
use std::thread;
use tracing::{info, warn};

/// Open every file in `paths` as `file_type` on up to `workers` threads.
///
/// Returns one result per path, in the order of `paths`.
///
/// # Example
///
/// ```no_run
/// use ipw_rs::batch::read_all;
/// use ipw_rs::prelude::*;
///
/// let paths = ["output/em.0000", "output/em.0001", "output/em.0002"];
/// for result in read_all(&paths, FileType::Em, &IpwConfig::default(), 4) {
///     match result {
///         Ok(grid) => println!("{:?}", grid.variables()),
///         Err(e) => eprintln!("skipped: {}", e),
///     }
/// }
/// ```
pub fn read_all<P: AsRef<Path>>(
    paths: &[P],
    file_type: FileType,
    config: &IpwConfig,
    workers: usize,
) -> Vec<Result<Grid>> {
    let workers = workers.clamp(1, paths.len().max(1));
    let slots: Mutex<Vec<Option<Result<Grid>>>> = Mutex::new((0..paths.len()).map(|_| None).collect());

    let (job_tx, job_rx) = unbounded::<(usize, &Path)>();
    for (index, path) in paths.iter().enumerate() {
        // the receiver outlives this loop
        let _ = job_tx.send((index, path.as_ref()));
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let slots = &slots;
            scope.spawn(move || {
                for (index, path) in job_rx.iter() {
                    let result = Grid::open(path, file_type, config);
                    if let Err(e) = &result {
                        warn!(path = %path.display(), error = %e, "Failed to read grid");
                    }
                    slots.lock()[index] = Some(result);
                }
            });
        }
    });

    let results: Vec<Result<Grid>> = slots
        .into_inner()
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                Err(IpwError::TaskFailed(format!("file {} was never read", index)))
            })
        })
        .collect();

    info!(
        files = results.len(),
        failed = results.iter().filter(|r| r.is_err()).count(),
        workers = workers,
        "Batch read finished"
    );
    results
}
