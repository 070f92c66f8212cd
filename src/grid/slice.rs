// src/grid/slice.rs
//! Extracting grids from a batched time-series container.
//!
//! The container itself (a NetCDF-like store) lives outside this crate; it is
//! reached through [`TimeSeriesSource`]. [`MemorySeries`] is the in-memory
//! implementation used by tools and tests.

use crate::config::{IpwConfig, TimeStep};
use crate::error::{IpwError, Result};
use crate::grid::{Grid, Interval};
use crate::header::{BandDescriptor, ByteWidth, GeoFields, GlobalDescriptor, Header};
use crate::types::FileType;
use ndarray::{Array2, Array3, Axis};
use std::collections::HashMap;
use tracing::debug;

/// A store holding, per variable, a `time x lines x samples` array
pub trait TimeSeriesSource {
    /// `(nlines, nsamps)` of every slice
    fn shape(&self) -> (usize, usize);

    /// Number of time steps
    fn time_len(&self) -> usize;

    fn has_variable(&self, name: &str) -> bool;

    /// The `nlines x nsamps` slice of `variable` at time step `time_index`
    fn read_slice(&self, variable: &str, time_index: usize) -> Result<Array2<f64>>;

    /// Georeferencing shared by all slices
    fn geo(&self) -> Option<GeoFields> {
        None
    }

    /// Interval covered by time step `time_index`
    fn interval(&self, _time_index: usize) -> Option<Interval> {
        None
    }
}

/// Time series held in memory
#[derive(Debug, Clone)]
pub struct MemorySeries {
    shape: (usize, usize, usize),
    variables: HashMap<String, Array3<f64>>,
    geo: Option<GeoFields>,
    time_step: Option<TimeStep>,
}

impl MemorySeries {
    /// Create an empty series of `time_len` steps of `nlines x nsamps`
    pub fn new(time_len: usize, nlines: usize, nsamps: usize) -> Self {
        MemorySeries {
            shape: (time_len, nlines, nsamps),
            variables: HashMap::new(),
            geo: None,
            time_step: None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Array3<f64>) -> Result<()> {
        let name = name.into();
        if values.dim() != self.shape {
            return Err(IpwError::Container(format!(
                "variable '{}' is {:?}, series is {:?}",
                name,
                values.dim(),
                self.shape
            )));
        }
        self.variables.insert(name, values);
        Ok(())
    }

    pub fn with_geo(mut self, geo: GeoFields) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn with_time_step(mut self, time_step: TimeStep) -> Self {
        self.time_step = Some(time_step);
        self
    }
}

impl TimeSeriesSource for MemorySeries {
    fn shape(&self) -> (usize, usize) {
        (self.shape.1, self.shape.2)
    }

    fn time_len(&self) -> usize {
        self.shape.0
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn read_slice(&self, variable: &str, time_index: usize) -> Result<Array2<f64>> {
        let values = self
            .variables
            .get(variable)
            .ok_or_else(|| IpwError::Container(format!("no variable '{}'", variable)))?;
        if time_index >= self.shape.0 {
            return Err(IpwError::Container(format!(
                "time index {} out of range for {} steps",
                time_index, self.shape.0
            )));
        }
        Ok(values.index_axis(Axis(0), time_index).to_owned())
    }

    fn geo(&self) -> Option<GeoFields> {
        self.geo.clone()
    }

    fn interval(&self, time_index: usize) -> Option<Interval> {
        self.time_step
            .and_then(|step| step.interval_at(time_index as i64).ok())
    }
}

impl Grid {
    /// Build a grid of `band_group` from one time step of `source`.
    ///
    /// Bands are the variables of `band_group` the source holds, in table
    /// order, each stored in two bytes with ranges taken from the data.
    /// `time_index` defaults to the first step.
    pub fn from_slice<S: TimeSeriesSource + ?Sized>(
        source: &S,
        band_group: FileType,
        time_index: Option<usize>,
        config: &IpwConfig,
    ) -> Result<Self> {
        let time_index = time_index.unwrap_or(0);
        let names: Vec<&String> = config
            .variables
            .variables(band_group)?
            .iter()
            .filter(|name| source.has_variable(name))
            .collect();

        if names.is_empty() {
            return Err(IpwError::Container(format!(
                "source holds no variables of file type '{}'",
                band_group
            )));
        }

        let (nlines, nsamps) = source.shape();
        let pixels = nlines * nsamps;
        let mut data = Array2::<f64>::zeros((pixels, names.len()));
        for (name, mut column) in names.iter().zip(data.columns_mut()) {
            let slice = source.read_slice(name, time_index)?;
            if slice.dim() != (nlines, nsamps) {
                return Err(IpwError::Container(format!(
                    "slice of '{}' is {:?}, expected {:?}",
                    name,
                    slice.dim(),
                    (nlines, nsamps)
                )));
            }
            // row-major pixel order
            for (out, value) in column.iter_mut().zip(slice.iter()) {
                *out = *value;
            }
        }

        let geo = source.geo();
        let bands = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let band = BandDescriptor::new(name.as_str(), index, ByteWidth::Two);
                match &geo {
                    Some(geo) => band.with_geo(geo.clone()),
                    None => band,
                }
            })
            .collect();

        let header = Header {
            global: GlobalDescriptor::new(super::DEFAULT_BYTEORDER, nlines, nsamps, names.len()),
            bands,
        };

        let mut grid = Grid::from_parts(band_group, header, data)?;
        grid.recalculate_header()?;
        grid.interval = source.interval(time_index);

        debug!(
            file_type = %band_group,
            time_index = time_index,
            bands = names.len(),
            "Extracted grid from time series"
        );
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series() -> MemorySeries {
        let origin = NaiveDate::from_ymd_opt(2018, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut series = MemorySeries::new(3, 2, 2).with_time_step(TimeStep::hourly(origin));
        series
            .insert("melt", Array3::from_shape_fn((3, 2, 2), |(t, i, j)| (t * 10 + i * 2 + j) as f64))
            .unwrap();
        series.insert("z_s", Array3::from_elem((3, 2, 2), 0.5)).unwrap();
        series.insert("unrelated", Array3::zeros((3, 2, 2))).unwrap();
        series
    }

    #[test]
    fn test_from_slice() {
        let grid = Grid::from_slice(&series(), FileType::Em, Some(1), &IpwConfig::default()).unwrap();

        // z_s belongs to snow, not em
        assert_eq!(grid.variables(), vec!["melt"]);
        let melt = grid.band("melt").unwrap();
        assert_eq!(melt.int_max(), 65535);
        assert_eq!((melt.float_min, melt.float_max), (10.0, 13.0));
        assert_eq!(grid.column("melt").unwrap().to_vec(), vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(grid.end_datetime().unwrap() - grid.start_datetime().unwrap(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_from_slice_constant_variable() {
        let grid = Grid::from_slice(&series(), FileType::Snow, None, &IpwConfig::default()).unwrap();
        assert_eq!(grid.variables(), vec!["z_s"]);
        let z_s = grid.band("z_s").unwrap();
        assert_eq!((z_s.float_min, z_s.float_max), (0.5, 1.5));
    }

    #[test]
    fn test_from_slice_without_matching_variables() {
        assert!(matches!(
            Grid::from_slice(&series(), FileType::Precip, None, &IpwConfig::default()),
            Err(IpwError::Container(_))
        ));
    }

    #[test]
    fn test_time_index_out_of_range() {
        assert!(Grid::from_slice(&series(), FileType::Em, Some(3), &IpwConfig::default()).is_err());
    }

    #[test]
    fn test_insert_checks_shape() {
        let mut series = MemorySeries::new(1, 2, 2);
        assert!(series.insert("melt", Array3::zeros((1, 2, 3))).is_err());
    }
}
