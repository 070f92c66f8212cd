// src/error.rs
use chrono::NaiveDateTime;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IpwError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed IPW header: {0}")]
    Format(String),

    #[error("Band index {index} out of range for image with {bands} bands")]
    BandIndexOutOfRange { index: i64, bands: usize },

    #[error("Image size mismatch: header describes {expected} bytes of pixel data, found {found}")]
    LayoutMismatch { expected: usize, found: usize },

    #[error("Geo header of band {band} disagrees with the reference band")]
    GeoMismatch { band: usize },

    #[error("Value {value} of band '{band}' lies outside the quantization range [{min}, {max}]")]
    RangeViolation {
        band: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Grids are not consecutive: grid {index} ends at {end} but the next one starts at {next_start}")]
    Consecutiveness {
        index: usize,
        end: NaiveDateTime,
        next_start: NaiveDateTime,
    },

    #[error("Grid {0} has no time interval")]
    MissingInterval(usize),

    #[error("Incompatible grids: {0}")]
    IncompatibleGrids(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Not an IPW file: {0}")]
    UnsupportedFileKind(String),

    #[error("Invalid byte width: {0}")]
    InvalidByteWidth(u32),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Time series container error: {0}")]
    Container(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, IpwError>;
