// src/grid/mod.rs
//! The IPW grid: one time step of one or more gridded variables
//!
//! A [`Grid`] owns a parsed [`Header`] and the pixel data that follows it.
//! Pixel data is kept as the raw bytes it was read from until something asks
//! for values, then decoded once into a `pixels x bands` table and cached.
//!
//! # Examples
//!
//! ```
//! use ipw_rs::prelude::*;
//! use ndarray::array;
//!
//! let data = array![[1.0, 0.5], [2.0, 0.25]];
//! let grid = Grid::from_array(
//!     FileType::Em,
//!     &[("melt", ByteWidth::Two), ("z_s", ByteWidth::One)],
//!     1,
//!     2,
//!     data,
//! )
//! .unwrap();
//!
//! let bytes = grid.write().unwrap();
//! let config = IpwConfig::default()
//!     .with_variables(VariableTable::empty().with(FileType::Em, &["melt", "z_s"]));
//! let parsed = Grid::parse(&bytes, FileType::Em, &config).unwrap();
//!
//! assert_eq!(parsed.band("melt").unwrap().float_max, 2.0);
//! assert_eq!(parsed.column("z_s").unwrap().len(), 2);
//! ```

#[cfg(feature = "async")]
mod async_io;
mod geo;
pub mod slice;

pub use geo::GeoTransform;
pub use slice::{MemorySeries, TimeSeriesSource};

use crate::config::IpwConfig;
use crate::error::{IpwError, Result};
use crate::header::{
    parse_header, write_header, BandDescriptor, ByteWidth, GeoFields, GlobalDescriptor, Header,
};
use crate::raw_data::{pack_table, RawDataReader};
use crate::types::{Endianness, FileKind, FileType};
use crate::utils::split_header;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView1};
use std::cell::OnceCell;
use std::path::Path;
use tracing::{debug, warn};

#[cfg(feature = "mmap")]
use memmap2::Mmap;

/// Half-open `[start, end)` time span covered by a grid
pub type Interval = (NaiveDateTime, NaiveDateTime);

/// Byte order tag written for grids built in code
pub const DEFAULT_BYTEORDER: &str = "0123";

/// One IPW image
#[derive(Debug, Clone)]
pub struct Grid {
    file_type: FileType,
    header: Header,
    byte_order: Endianness,
    /// Pixel bytes as read; dropped once the decoded table may diverge from them
    payload: Option<Bytes>,
    data: OnceCell<Array2<f64>>,
    interval: Option<Interval>,
}

impl Grid {
    /// Parse a complete IPW image held in memory
    pub fn parse(bytes: &[u8], file_type: FileType, config: &IpwConfig) -> Result<Self> {
        let (header, byte_order, offset) = read_header(bytes, file_type, config)?;
        Ok(Grid::undecoded(
            file_type,
            header,
            byte_order,
            Bytes::copy_from_slice(&bytes[offset..]),
        ))
    }

    /// Parse an image without copying its pixel data
    pub fn from_bytes(bytes: Bytes, file_type: FileType, config: &IpwConfig) -> Result<Self> {
        let (header, byte_order, offset) = read_header(&bytes, file_type, config)?;
        let payload = bytes.slice(offset..);
        Ok(Grid::undecoded(file_type, header, byte_order, payload))
    }

    /// Read and parse the image at `path`.
    ///
    /// When `config` carries a [`TimeStep`](crate::config::TimeStep) and the
    /// file is named `<prefix>.<index>`, the grid gets the matching interval.
    pub fn open(path: impl AsRef<Path>, file_type: FileType, config: &IpwConfig) -> Result<Self> {
        let path = path.as_ref();
        check_before_read(path, file_type, config)?;

        let bytes = std::fs::read(path)?;
        let mut grid = Grid::from_bytes(Bytes::from(bytes), file_type, config)?;
        grid.interval = interval_from_name(path, config);
        Ok(grid)
    }

    /// Read the image at `path` through a memory map, decoding pixels eagerly
    #[cfg(feature = "mmap")]
    pub fn open_mmap(
        path: impl AsRef<Path>,
        file_type: FileType,
        config: &IpwConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        check_before_read(path, file_type, config)?;

        let file = std::fs::File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let (header, byte_order, offset) = read_header(&mmap, file_type, config)?;
        let data = RawDataReader::read_table(
            &mmap[offset..],
            &header.bands,
            header.global.pixels(),
            byte_order,
        )?;

        let mut grid = Grid::from_parts(file_type, header, data)?;
        grid.byte_order = byte_order;
        grid.interval = interval_from_name(path, config);
        Ok(grid)
    }

    /// Build a grid from `pixels x bands` values, deriving every band's range
    /// from the data.
    ///
    /// `bands` lists each variable's name and storage width in band order.
    pub fn from_array(
        file_type: FileType,
        bands: &[(&str, ByteWidth)],
        nlines: usize,
        nsamps: usize,
        data: Array2<f64>,
    ) -> Result<Self> {
        if bands.is_empty() {
            return Err(IpwError::InvalidArgument("a grid needs at least one band".to_string()));
        }

        let header = Header {
            global: GlobalDescriptor::new(DEFAULT_BYTEORDER, nlines, nsamps, bands.len()),
            bands: bands
                .iter()
                .enumerate()
                .map(|(index, (name, width))| BandDescriptor::new(*name, index, *width))
                .collect(),
        };

        let mut grid = Grid::from_parts(file_type, header, data)?;
        grid.recalculate_header()?;
        Ok(grid)
    }

    /// Assemble a grid from an existing header and decoded values. The header
    /// ranges are kept as given.
    pub(crate) fn from_parts(file_type: FileType, header: Header, data: Array2<f64>) -> Result<Self> {
        check_shape(&header, &data)?;
        Ok(Grid {
            file_type,
            header,
            byte_order: Endianness::Little,
            payload: None,
            data: OnceCell::from(data),
            interval: None,
        })
    }

    /// New grid with an independent copy of this grid's header and byte order
    /// holding `data`
    pub(crate) fn derived(&self, data: Array2<f64>) -> Result<Self> {
        let mut grid = Grid::from_parts(self.file_type, self.header.clone(), data)?;
        grid.byte_order = self.byte_order;
        Ok(grid)
    }

    fn undecoded(file_type: FileType, header: Header, byte_order: Endianness, payload: Bytes) -> Self {
        debug!(
            file_type = %file_type,
            bands = header.bands.len(),
            payload_bytes = payload.len(),
            "Parsed IPW grid"
        );
        Grid {
            file_type,
            header,
            byte_order,
            payload: Some(payload),
            data: OnceCell::new(),
            interval: None,
        }
    }

    /// Decoded values, one column per band. Decodes on first call.
    pub fn data(&self) -> Result<&Array2<f64>> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let table = self.decode()?;
        Ok(self.data.get_or_init(|| table))
    }

    /// Mutable access to the decoded values.
    ///
    /// Band ranges are not updated; call [`Grid::recalculate_header`] before
    /// writing values that may fall outside them.
    pub fn data_mut(&mut self) -> Result<&mut Array2<f64>> {
        if self.data.get().is_none() {
            let table = self.decode()?;
            let _ = self.data.set(table);
        }
        self.payload = None;
        self.data
            .get_mut()
            .ok_or_else(|| IpwError::Format("grid has no pixel data".to_string()))
    }

    /// Replace all values. `data` must be `pixels x bands`.
    pub fn set_data(&mut self, data: Array2<f64>) -> Result<()> {
        check_shape(&self.header, &data)?;
        self.payload = None;
        self.data = OnceCell::from(data);
        Ok(())
    }

    fn decode(&self) -> Result<Array2<f64>> {
        let payload = self
            .payload
            .as_ref()
            .ok_or_else(|| IpwError::Format("grid has no pixel data".to_string()))?;
        RawDataReader::read_table(
            payload,
            &self.header.bands,
            self.header.global.pixels(),
            self.byte_order,
        )
    }

    /// Values of one variable in row-major pixel order
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let index = self.band_index(name)?;
        Ok(self.data()?.column(index))
    }

    /// Values of one variable as an `nlines x nsamps` image
    pub fn band_image(&self, name: &str) -> Result<Array2<f64>> {
        let global = &self.header.global;
        self.column(name)?
            .to_owned()
            .into_shape((global.nlines, global.nsamps))
            .map_err(|e| IpwError::InvalidArgument(e.to_string()))
    }

    fn band_index(&self, name: &str) -> Result<usize> {
        self.header
            .bands
            .iter()
            .position(|band| band.name == name)
            .ok_or_else(|| {
                IpwError::InvalidArgument(format!(
                    "grid of type '{}' has no variable '{}'",
                    self.file_type, name
                ))
            })
    }

    /// Re-derive every band's physical range from its values.
    ///
    /// Each range becomes the column's finite minimum and maximum. A constant
    /// band gets `float_max = float_min + 1.0` so the quantization stays
    /// defined. Byte widths and geo fields are left alone.
    pub fn recalculate_header(&mut self) -> Result<()> {
        let ranges: Vec<Option<(f64, f64)>> =
            self.data()?.columns().into_iter().map(column_range).collect();

        for (band, range) in self.header.bands.iter_mut().zip(ranges) {
            let Some((min, max)) = range else {
                continue;
            };
            band.float_min = min;
            band.float_max = if min == max {
                warn!(band = %band.name, value = min, "Constant band, widening range by 1.0");
                min + 1.0
            } else {
                max
            };
        }

        // the stored bytes were quantized with the old ranges
        self.payload = None;
        Ok(())
    }

    /// Serialize to header text followed by packed pixel data
    pub fn write(&self) -> Result<Bytes> {
        let text = write_header(&self.header);
        let pixels = pack_table(self.data()?.view(), &self.header.bands, self.byte_order)?;

        let mut out = BytesMut::with_capacity(text.len() + pixels.len());
        out.put_slice(text.as_bytes());
        out.put_slice(&pixels);

        debug!(
            file_type = %self.file_type,
            header_bytes = text.len(),
            payload_bytes = pixels.len(),
            "Serialized IPW grid"
        );
        Ok(out.freeze())
    }

    /// Serialize and write to `path`, replacing any existing file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.write()?;
        std::fs::write(path, &bytes)?;
        Ok(())
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn global(&self) -> &GlobalDescriptor {
        &self.header.global
    }

    pub fn bands(&self) -> &[BandDescriptor] {
        &self.header.bands
    }

    pub fn band(&self, name: &str) -> Option<&BandDescriptor> {
        self.header.band(name)
    }

    /// Mutable band descriptor, for adjusting a range before writing
    pub fn band_mut(&mut self, name: &str) -> Option<&mut BandDescriptor> {
        self.header.bands.iter_mut().find(|band| band.name == name)
    }

    pub fn variables(&self) -> Vec<&str> {
        self.header.variables().collect()
    }

    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// Pack pixels in `order` from now on and tag the header to match
    pub fn set_byte_order(&mut self, order: Endianness) {
        self.byte_order = order;
        self.header.global.byteorder = match order {
            Endianness::Little => "0123",
            Endianness::Big => "3210",
        }
        .to_string();
    }

    /// Placement of the pixel grid, if the image is georeferenced
    pub fn geo_transform(&self) -> Option<GeoTransform> {
        self.header
            .bands
            .first()
            .and_then(|band| band.geo.as_ref())
            .map(GeoTransform::from_geo)
    }

    /// Georeference every band with `geo`
    pub fn set_geo(&mut self, geo: GeoFields) {
        for band in &mut self.header.bands {
            band.geo = Some(geo.clone());
        }
    }

    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    pub fn set_interval(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
        if start >= end {
            return Err(IpwError::InvalidArgument(format!(
                "interval start {} is not before its end {}",
                start, end
            )));
        }
        self.interval = Some((start, end));
        Ok(())
    }

    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        self.interval.map(|(start, _)| start)
    }

    pub fn end_datetime(&self) -> Option<NaiveDateTime> {
        self.interval.map(|(_, end)| end)
    }
}

/// Split off and parse the header, check the pixel data length and resolve
/// the byte order. Returns the offset of the first pixel byte.
fn read_header(
    bytes: &[u8],
    file_type: FileType,
    config: &IpwConfig,
) -> Result<(Header, Endianness, usize)> {
    let (lines, offset) = split_header(bytes)?;
    let header = parse_header(&lines, file_type, &config.variables)?;
    let byte_order = config.byte_order.resolve(&header.global.byteorder)?;

    let expected = header
        .checked_payload_size()
        .ok_or_else(|| IpwError::Format("image dimensions overflow".to_string()))?;
    let found = bytes.len() - offset;
    if expected != found {
        return Err(IpwError::LayoutMismatch { expected, found });
    }

    Ok((header, byte_order, offset))
}

fn check_before_read(path: &Path, file_type: FileType, config: &IpwConfig) -> Result<()> {
    FileKind::require_ipw(path)?;
    config.variables.variables(file_type)?;
    Ok(())
}

fn check_shape(header: &Header, data: &Array2<f64>) -> Result<()> {
    let expected = (header.global.pixels(), header.bands.len());
    if data.dim() != expected {
        return Err(IpwError::InvalidArgument(format!(
            "data is {:?} but the grid holds {} pixels x {} bands",
            data.dim(),
            expected.0,
            expected.1
        )));
    }
    Ok(())
}

fn interval_from_name(path: &Path, config: &IpwConfig) -> Option<Interval> {
    let step = config.time_step.as_ref()?;
    match step.interval_for(path) {
        Ok(interval) => Some(interval),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No interval for grid");
            None
        }
    }
}

/// Finite minimum and maximum of a column, `None` if it has no finite values
fn column_range(column: ArrayView1<'_, f64>) -> Option<(f64, f64)> {
    column
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}
