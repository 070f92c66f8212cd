// src/header/mod.rs
mod descriptor;
mod marker;
mod parser;
mod writer;

pub use descriptor::{BandDescriptor, ByteWidth, GeoFields, GlobalDescriptor};
pub use marker::{Marker, SectionKind, MARKER_PREFIX};
pub use parser::parse_header;
pub use writer::write_header;

/// Parsed header of one IPW image: image-wide fields plus one descriptor
/// per band, ordered by band index.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub global: GlobalDescriptor,
    pub bands: Vec<BandDescriptor>,
}

impl Header {
    /// Look up a band by variable name
    pub fn band(&self, name: &str) -> Option<&BandDescriptor> {
        self.bands.iter().find(|band| band.name == name)
    }

    /// Bytes used by all bands of one pixel
    pub fn record_size(&self) -> usize {
        self.bands.iter().map(BandDescriptor::bytes).sum()
    }

    /// Length the pixel data following the header must have
    pub fn payload_size(&self) -> usize {
        self.record_size() * self.global.pixels()
    }

    /// [`payload_size`](Self::payload_size), or `None` if it overflows
    pub fn checked_payload_size(&self) -> Option<usize> {
        self.global.checked_pixels()?.checked_mul(self.record_size())
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|band| band.name.as_str())
    }
}
