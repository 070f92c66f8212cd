// src/resample.rs
//! Temporal reaggregation of consecutive grids.
//!
//! Grids covering consecutive intervals are grouped into buckets of a target
//! width and summed value by value. Buckets are aligned to midnight of the
//! day the first grid starts on; a grid belongs to the bucket its interval
//! starts in and must end inside it.
//!
//! # Example
//!
//! ```
//! use ipw_rs::prelude::*;
//! use chrono::{Duration, NaiveDate};
//! use ndarray::array;
//!
//! let origin = NaiveDate::from_ymd_opt(2017, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let grids: Vec<Grid> = (0..4)
//!     .map(|hour| {
//!         let mut grid = Grid::from_array(
//!             FileType::Em,
//!             &[("melt", ByteWidth::Two)],
//!             1,
//!             1,
//!             array![[hour as f64]],
//!         )
//!         .unwrap();
//!         let start = origin + Duration::hours(hour);
//!         grid.set_interval(start, start + Duration::hours(1)).unwrap();
//!         grid
//!     })
//!     .collect();
//!
//! let coarse = Reaggregator::hours(2).unwrap().aggregate(&grids).unwrap();
//! assert_eq!(coarse.len(), 2);
//! assert_eq!(coarse[1].column("melt").unwrap()[0], 5.0);
//! ```

use crate::error::{IpwError, Result};
use crate::grid::{Grid, Interval};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

/// Sums consecutive grids into buckets of a fixed width
#[derive(Debug, Clone, Copy)]
pub struct Reaggregator {
    width: Duration,
}

impl Reaggregator {
    /// Fails unless `width` is at least one second
    pub fn new(width: Duration) -> Result<Self> {
        if width.num_seconds() <= 0 {
            return Err(IpwError::InvalidArgument(format!(
                "reaggregation width must be positive, got {}",
                width
            )));
        }
        Ok(Reaggregator { width })
    }

    pub fn hours(hours: i64) -> Result<Self> {
        Self::new(Duration::hours(hours))
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    /// Sum `grids` into one grid per bucket.
    ///
    /// Every input must carry an interval, follow the previous one without a
    /// gap and share its file type, dimensions and variables; all of this is
    /// checked before anything is summed. Outputs take the first input's band
    /// widths and geo fields, the bucket as interval and ranges re-derived
    /// from the sums.
    pub fn aggregate(&self, grids: &[Grid]) -> Result<Vec<Grid>> {
        let Some(first) = grids.first() else {
            return Ok(Vec::new());
        };

        let intervals = check_consecutive(grids)?;
        check_compatible(grids)?;

        let day0 = intervals[0].0.date().and_time(NaiveTime::MIN);
        let buckets = intervals
            .iter()
            .enumerate()
            .map(|(index, interval)| self.bucket_of(day0, index, interval))
            .collect::<Result<Vec<_>>>()?;

        let mut outputs = Vec::new();
        let mut start = 0;
        while start < grids.len() {
            let bucket = buckets[start];
            let len = buckets[start..]
                .iter()
                .take_while(|other| **other == bucket)
                .count();

            let mut sum = grids[start].data()?.clone();
            for grid in &grids[start + 1..start + len] {
                sum += grid.data()?;
            }

            let mut output = first.derived(sum)?;
            output.set_interval(bucket, bucket + self.width)?;
            output.recalculate_header()?;

            debug!(bucket = %bucket, inputs = len, "Summed bucket");
            outputs.push(output);
            start += len;
        }

        info!(
            file_type = %first.file_type(),
            inputs = grids.len(),
            outputs = outputs.len(),
            width_seconds = self.width.num_seconds(),
            "Reaggregated grids"
        );
        Ok(outputs)
    }

    /// Start of the bucket holding the grid covering `interval`
    fn bucket_of(
        &self,
        day0: NaiveDateTime,
        index: usize,
        &(start, end): &Interval,
    ) -> Result<NaiveDateTime> {
        let width = self.width.num_seconds();
        let offset = (start - day0).num_seconds();
        let bucket = day0 + Duration::seconds(offset.div_euclid(width) * width);

        if end > bucket + self.width {
            return Err(IpwError::InvalidArgument(format!(
                "grid {} ({} to {}) does not fit in the bucket starting {}",
                index, start, end, bucket
            )));
        }
        Ok(bucket)
    }
}

/// Intervals of `grids`, provided each grid has one and each ends exactly
/// where the next one starts.
pub fn check_consecutive(grids: &[Grid]) -> Result<Vec<Interval>> {
    let intervals = grids
        .iter()
        .enumerate()
        .map(|(index, grid)| grid.interval().ok_or(IpwError::MissingInterval(index)))
        .collect::<Result<Vec<_>>>()?;

    for (index, pair) in intervals.windows(2).enumerate() {
        let (_, end) = pair[0];
        let (next_start, _) = pair[1];
        if end != next_start {
            return Err(IpwError::Consecutiveness {
                index,
                end,
                next_start,
            });
        }
    }

    Ok(intervals)
}

fn check_compatible(grids: &[Grid]) -> Result<()> {
    let Some(first) = grids.first() else {
        return Ok(());
    };
    let layout = |grid: &Grid| {
        let global = grid.global();
        (grid.file_type(), global.nlines, global.nsamps)
    };

    for (index, grid) in grids.iter().enumerate().skip(1) {
        if layout(grid) != layout(first) {
            return Err(IpwError::IncompatibleGrids(format!(
                "grid {} is a {} {}x{} image, grid 0 a {} {}x{} image",
                index,
                grid.file_type(),
                grid.global().nlines,
                grid.global().nsamps,
                first.file_type(),
                first.global().nlines,
                first.global().nsamps
            )));
        }
        if grid.variables() != first.variables() {
            return Err(IpwError::IncompatibleGrids(format!(
                "grid {} holds {:?}, grid 0 holds {:?}",
                index,
                grid.variables(),
                first.variables()
            )));
        }
    }

    Ok(())
}
