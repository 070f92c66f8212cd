// src/raw_data/mod.rs
//! Pixel data handling for IPW images
//!
//! Pixel data follows the header directly. It is band-interleaved by pixel:
//! for each pixel in row-major order, one unsigned integer per band in band
//! order, each with its band's width and no padding.
//!
//! - [`PackBuffer`] - Quantizes physical values and accumulates records for writing
//! - [`RawDataReader`] - Splits pixel data into per-band columns and decodes them
//! - [`quantize`] - The linear integer/physical mapping shared by both
//!
//! # Examples
//!
//! ```
//! use ipw_rs::header::{BandDescriptor, ByteWidth};
//! use ipw_rs::raw_data::{pack_table, RawDataReader};
//! use ipw_rs::types::Endianness;
//! use ndarray::array;
//!
//! let bands = vec![
//!     BandDescriptor::new("melt", 0, ByteWidth::Two).with_range(0.0, 10.0),
//!     BandDescriptor::new("z_s", 1, ByteWidth::One).with_range(0.0, 2.0),
//! ];
//! let table = array![[1.0, 0.5], [2.5, 1.5]];
//!
//! let bytes = pack_table(table.view(), &bands, Endianness::Little).unwrap();
//! assert_eq!(bytes.len(), 6);
//!
//! let decoded = RawDataReader::read_table(&bytes, &bands, 2, Endianness::Little).unwrap();
//! assert!((decoded[[1, 0]] - 2.5).abs() <= 10.0 / 65535.0);
//! ```

mod buffer;
pub mod quantize;
mod reader;

pub use buffer::{pack_table, PackBuffer};
pub use quantize::{max_error, LinearMap};
pub use reader::RawDataReader;
