// src/header/descriptor.rs
use crate::error::{IpwError, Result};

/// Width of one stored pixel value of a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ByteWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl ByteWidth {
    pub fn from_bytes(bytes: u32) -> Result<Self> {
        match bytes {
            1 => Ok(ByteWidth::One),
            2 => Ok(ByteWidth::Two),
            4 => Ok(ByteWidth::Four),
            other => Err(IpwError::InvalidByteWidth(other)),
        }
    }

    pub fn bytes(&self) -> usize {
        *self as usize
    }

    pub fn bits(&self) -> u32 {
        *self as u32 * 8
    }

    /// Largest raw integer a band of this width can hold
    pub fn int_max(&self) -> u32 {
        match self {
            ByteWidth::One => u8::MAX as u32,
            ByteWidth::Two => u16::MAX as u32,
            ByteWidth::Four => u32::MAX,
        }
    }
}

/// Image-wide header fields from the `basic_image_i` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDescriptor {
    /// Byte order tag as written in the header (e.g. `0123`)
    pub byteorder: String,
    pub nlines: usize,
    pub nsamps: usize,
    pub nbands: usize,
}

impl GlobalDescriptor {
    pub fn new(byteorder: impl Into<String>, nlines: usize, nsamps: usize, nbands: usize) -> Self {
        GlobalDescriptor {
            byteorder: byteorder.into(),
            nlines,
            nsamps,
            nbands,
        }
    }

    /// Number of pixels in one band
    pub fn pixels(&self) -> usize {
        self.nlines * self.nsamps
    }

    /// [`pixels`](Self::pixels), or `None` if the dimensions overflow
    pub fn checked_pixels(&self) -> Option<usize> {
        self.nlines.checked_mul(self.nsamps)
    }
}

/// Georeferencing of the image from a `geo` section
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFields {
    /// Coordinate of the first line
    pub bline: f64,
    /// Coordinate of the first sample
    pub bsamp: f64,
    /// Spacing between lines
    pub dline: f64,
    /// Spacing between samples
    pub dsamp: f64,
    pub units: String,
    pub coord_sys_id: String,
}

/// Per-band header: storage width plus the linear quantization range.
///
/// The integer side of the quantization always starts at zero and ends at
/// the largest value representable in the band's width; only the physical
/// range `[float_min, float_max]` is free.
#[derive(Debug, Clone, PartialEq)]
pub struct BandDescriptor {
    /// Variable stored in this band
    pub name: String,
    index: usize,
    width: ByteWidth,
    pub float_min: f64,
    pub float_max: f64,
    pub geo: Option<GeoFields>,
}

impl BandDescriptor {
    /// Create a band whose physical range equals its integer range,
    /// i.e. an image without an `lq` section.
    pub fn new(name: impl Into<String>, index: usize, width: ByteWidth) -> Self {
        BandDescriptor {
            name: name.into(),
            index,
            width,
            float_min: 0.0,
            float_max: width.int_max() as f64,
            geo: None,
        }
    }

    pub fn with_range(mut self, float_min: f64, float_max: f64) -> Self {
        self.float_min = float_min;
        self.float_max = float_max;
        self
    }

    pub fn with_geo(mut self, geo: GeoFields) -> Self {
        self.geo = Some(geo);
        self
    }

    /// Position of the band in the image
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> ByteWidth {
        self.width
    }

    pub fn bytes(&self) -> usize {
        self.width.bytes()
    }

    pub fn bits(&self) -> u32 {
        self.width.bits()
    }

    pub fn int_min(&self) -> u32 {
        0
    }

    pub fn int_max(&self) -> u32 {
        self.width.int_max()
    }
}
