// src/header/marker.rs
use crate::error::{IpwError, Result};
use smallvec::SmallVec;
use std::fmt;

/// Prefix of every section marker line
pub const MARKER_PREFIX: &str = "!<header>";

/// Type of a header section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `basic_image_i`: image dimensions and byte order
    Global,
    /// `basic_image`: storage width of one band
    BasicImage,
    /// `lq`: linear quantization of one band
    Lq,
    /// `geo`: georeferencing of one band
    Geo,
    /// `image`: last section, followed by the pixel data
    Image,
}

impl SectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Global => "basic_image_i",
            SectionKind::BasicImage => "basic_image",
            SectionKind::Lq => "lq",
            SectionKind::Geo => "geo",
            SectionKind::Image => "image",
        }
    }

    /// Revision written after each section type, kept for older readers
    pub fn revision(&self) -> &'static str {
        match self {
            SectionKind::Global | SectionKind::BasicImage => "1.11",
            SectionKind::Lq => "1.6",
            SectionKind::Geo => "1.7",
            SectionKind::Image => "1.5",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "basic_image_i" => Some(SectionKind::Global),
            "basic_image" => Some(SectionKind::BasicImage),
            "lq" => Some(SectionKind::Lq),
            "geo" => Some(SectionKind::Geo),
            "image" => Some(SectionKind::Image),
            _ => None,
        }
    }

    /// Whether sections of this kind describe a single band
    pub fn is_per_band(&self) -> bool {
        matches!(self, SectionKind::BasicImage | SectionKind::Lq | SectionKind::Geo)
    }
}

/// A section marker line, e.g. `!<header> lq 1 $Revision: 1.6 $`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub kind: SectionKind,
    /// Band number, `-1` for image-wide sections
    pub index: i64,
}

impl Marker {
    pub fn new(kind: SectionKind, index: i64) -> Self {
        Marker { kind, index }
    }

    pub fn global() -> Self {
        Marker::new(SectionKind::Global, -1)
    }

    pub fn image() -> Self {
        Marker::new(SectionKind::Image, -1)
    }

    /// Parse `line` as a marker. Returns `Ok(None)` for ordinary field lines.
    pub fn from_line(line: &str) -> Result<Option<Self>> {
        let rest = match line.strip_prefix(MARKER_PREFIX) {
            Some(rest) => rest,
            None => return Ok(None),
        };

        let tokens: SmallVec<[&str; 6]> = rest.split_whitespace().collect();
        let (name, index) = match tokens.as_slice() {
            [name, index, ..] => (*name, *index),
            _ => return Err(IpwError::Format(format!("truncated section marker '{}'", line))),
        };

        let kind = SectionKind::from_name(name)
            .ok_or_else(|| IpwError::Format(format!("unknown section type '{}'", name)))?;
        let index = index
            .parse::<i64>()
            .map_err(|_| IpwError::Format(format!("invalid section index '{}'", index)))?;

        Ok(Some(Marker { kind, index }))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} $Revision: {} $",
            MARKER_PREFIX,
            self.kind.name(),
            self.index,
            self.kind.revision()
        )
    }
}
