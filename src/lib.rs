// src/lib.rs
//! # ipw-rs
//!
//! Reading, writing and temporal reaggregation of IPW grids, the
//! ASCII-header / packed-binary raster format used by the iSnobal snow model
//! for its inputs and per-time-step outputs.
//!
//! ## Features
//!
//! - **Header grammar**: `basic_image_i`, `basic_image`, `lq` and `geo`
//!   sections parsed into typed descriptors and written back byte for byte
//! - **Linear quantization**: 1, 2 and 4 byte bands with range checks on write
//! - **Lazy decoding**: pixel data is decoded on first access and cached
//! - **Reaggregation**: consecutive grids summed into coarser time steps
//! - **Batch and async I/O**: many files on worker threads, or through tokio
//!
//! ## Quick Start
//!
//! ### Reading a grid
//!
//! ```rust,no_run
//! use ipw_rs::*;
//!
//! fn main() -> Result<()> {
//!     let config = IpwConfig::default();
//!     let grid = Grid::open("output/snow.0023", FileType::Snow, &config)?;
//!
//!     for band in grid.bands() {
//!         println!("{}: [{}, {}]", band.name, band.float_min, band.float_max);
//!     }
//!
//!     let depth = grid.column("z_s")?;
//!     println!("mean depth {}", depth.mean().unwrap_or(0.0));
//!     Ok(())
//! }
//! ```
//!
//! ### Modifying and writing
//!
//! ```rust,no_run
//! use ipw_rs::*;
//!
//! fn main() -> Result<()> {
//!     let mut grid = Grid::open("output/em.0100", FileType::Em, &IpwConfig::default())?;
//!
//!     grid.data_mut()?.mapv_inplace(|v| v * 2.0);
//!     grid.recalculate_header()?;
//!     grid.write_to("scaled/em.0100")?;
//!     Ok(())
//! }
//! ```
//!
//! ### Daily totals from hourly output
//!
//! ```rust,no_run
//! use ipw_rs::*;
//! use chrono::NaiveDate;
//!
//! fn main() -> Result<()> {
//!     let origin = NaiveDate::from_ymd_opt(2017, 10, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!     let config = IpwConfig::default().with_time_step(TimeStep::hourly(origin));
//!
//!     let paths: Vec<String> = (0..48).map(|i| format!("output/em.{:04}", i)).collect();
//!     let grids = batch::read_all(&paths, FileType::Em, &config, 4)
//!         .into_iter()
//!         .collect::<Result<Vec<_>>>()?;
//!
//!     for (day, grid) in Reaggregator::hours(24)?.aggregate(&grids)?.iter().enumerate() {
//!         grid.write_to(format!("daily/em.{:04}", day))?;
//!     }
//!     Ok(())
//! }
//! ```

// Modules
pub mod batch;
pub mod config;
pub mod error;
pub mod grid;
pub mod header;
pub mod raw_data;
pub mod resample;
pub mod types;

mod utils;

// Re-export commonly used types at the crate root for convenience
pub use error::{IpwError, Result};

pub use config::{ByteOrderPolicy, IpwConfig, TimeStep};

pub use types::{Endianness, FileKind, FileType, VariableTable};

pub use header::{BandDescriptor, ByteWidth, GeoFields, GlobalDescriptor, Header};

pub use raw_data::{PackBuffer, RawDataReader};

pub use grid::{GeoTransform, Grid, Interval, MemorySeries, TimeSeriesSource};

pub use resample::Reaggregator;

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use ipw_rs::prelude::*;
    //! ```

    pub use crate::config::{IpwConfig, TimeStep};
    pub use crate::error::{IpwError, Result};
    pub use crate::grid::Grid;
    pub use crate::header::ByteWidth;
    pub use crate::resample::Reaggregator;
    pub use crate::types::{FileType, VariableTable};
}

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
