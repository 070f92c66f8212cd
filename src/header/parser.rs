// src/header/parser.rs
//! Header grammar parser.
//!
//! The header is a flat list of lines. Marker lines open a section and every
//! following `key = value` line belongs to it, so the parser is a fold over
//! the lines that carries the currently open section along with the fields
//! collected so far. The image-wide `basic_image_i` section comes first and
//! is read on its own, because its band count sizes everything after it.

use crate::error::{IpwError, Result};
use crate::header::descriptor::{BandDescriptor, ByteWidth, GeoFields, GlobalDescriptor};
use crate::header::marker::{Marker, SectionKind, MARKER_PREFIX};
use crate::header::Header;
use crate::types::{FileType, VariableTable};
use smallvec::SmallVec;
use std::str::FromStr;
use tracing::{debug, warn};

/// Parse header `lines` (form feed terminator excluded) of an image of `file_type`.
pub fn parse_header(lines: &[&str], file_type: FileType, table: &VariableTable) -> Result<Header> {
    let (first, rest) = lines
        .split_first()
        .ok_or_else(|| IpwError::Format("empty header".to_string()))?;

    match Marker::from_line(first)? {
        Some(marker) if marker.kind == SectionKind::Global => {}
        _ => {
            return Err(IpwError::Format(format!(
                "header must open with a basic_image_i section, found '{}'",
                first
            )))
        }
    }

    let global_len = rest
        .iter()
        .position(|line| line.starts_with(MARKER_PREFIX))
        .unwrap_or(rest.len());
    let (global_lines, band_lines) = rest.split_at(global_len);

    let global = global_lines
        .iter()
        .try_fold(GlobalDraft::default(), |draft, line| draft.consume(line))?
        .finish()?;

    let names = table.names_for(file_type, global.nbands)?;

    let bands = band_lines
        .iter()
        .try_fold(BandState::new(global.nbands), |state, line| state.consume(line))?
        .finish(names)?;

    let header = Header { global, bands };
    if header.checked_payload_size().is_none() {
        return Err(IpwError::Format(format!(
            "image dimensions overflow: {} lines x {} samples x {} bytes",
            header.global.nlines,
            header.global.nsamps,
            header.record_size()
        )));
    }

    debug!(
        file_type = %file_type,
        nlines = header.global.nlines,
        nsamps = header.global.nsamps,
        nbands = header.global.nbands,
        "Parsed IPW header"
    );

    Ok(header)
}

/// Split a `key = value` line. Blank lines yield `None`.
fn key_value(line: &str) -> Result<Option<(&str, &str)>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let (key, value) = line
        .split_once('=')
        .ok_or_else(|| IpwError::Format(format!("expected 'key = value', found '{}'", line)))?;
    Ok(Some((key.trim(), value.trim())))
}

fn number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| IpwError::Format(format!("field '{}' is not a number: '{}'", key, value)))
}

fn skip(kind: SectionKind, key: &str) {
    warn!(section = kind.name(), key = key, "Skipping unknown header field");
}

#[derive(Debug, Default)]
struct GlobalDraft {
    byteorder: Option<String>,
    nlines: Option<usize>,
    nsamps: Option<usize>,
    nbands: Option<usize>,
}

impl GlobalDraft {
    fn consume(mut self, line: &str) -> Result<Self> {
        if let Some((key, value)) = key_value(line)? {
            match key {
                "byteorder" => self.byteorder = Some(value.to_string()),
                "nlines" => self.nlines = Some(number(key, value)?),
                "nsamps" => self.nsamps = Some(number(key, value)?),
                "nbands" => self.nbands = Some(number(key, value)?),
                _ => skip(SectionKind::Global, key),
            }
        }
        Ok(self)
    }

    fn finish(self) -> Result<GlobalDescriptor> {
        let missing = |key: &str| IpwError::Format(format!("basic_image_i lacks '{}'", key));

        let nbands = self.nbands.ok_or_else(|| missing("nbands"))?;
        if nbands == 0 {
            return Err(IpwError::Format("image has no bands".to_string()));
        }

        Ok(GlobalDescriptor {
            byteorder: self.byteorder.unwrap_or_else(|| "0123".to_string()),
            nlines: self.nlines.ok_or_else(|| missing("nlines"))?,
            nsamps: self.nsamps.ok_or_else(|| missing("nsamps"))?,
            nbands,
        })
    }
}

#[derive(Debug, Default, Clone)]
struct GeoDraft {
    bline: Option<f64>,
    bsamp: Option<f64>,
    dline: Option<f64>,
    dsamp: Option<f64>,
    units: Option<String>,
    coord_sys_id: Option<String>,
}

impl GeoDraft {
    fn finish(self, band: usize) -> Result<GeoFields> {
        let missing =
            |key: &str| IpwError::Format(format!("geo section of band {} lacks '{}'", band, key));

        Ok(GeoFields {
            bline: self.bline.ok_or_else(|| missing("bline"))?,
            bsamp: self.bsamp.ok_or_else(|| missing("bsamp"))?,
            dline: self.dline.ok_or_else(|| missing("dline"))?,
            dsamp: self.dsamp.ok_or_else(|| missing("dsamp"))?,
            units: self.units.unwrap_or_default(),
            coord_sys_id: self.coord_sys_id.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default)]
struct BandDraft {
    bytes: Option<u32>,
    bits: Option<u32>,
    /// `(integer, float)` pairs in file order: minimum first, maximum second
    maps: SmallVec<[(u64, f64); 2]>,
    geo: Option<GeoDraft>,
}

impl BandDraft {
    fn set_basic_image(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "bytes" => self.bytes = Some(number(key, value)?),
            "bits" => self.bits = Some(number(key, value)?),
            _ => skip(SectionKind::BasicImage, key),
        }
        Ok(())
    }

    fn set_lq(&mut self, key: &str, value: &str, band: usize) -> Result<()> {
        if key != "map" {
            skip(SectionKind::Lq, key);
            return Ok(());
        }
        if self.maps.len() == 2 {
            return Err(IpwError::Format(format!(
                "lq section of band {} has more than two map lines",
                band
            )));
        }

        let mut tokens = value.split_whitespace();
        let (int, float) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(int), Some(float), None) => (number::<u64>(key, int)?, number::<f64>(key, float)?),
            _ => {
                return Err(IpwError::Format(format!(
                    "lq map of band {} must be '<int> <float>', found '{}'",
                    band, value
                )))
            }
        };
        self.maps.push((int, float));
        Ok(())
    }

    fn set_geo(&mut self, key: &str, value: &str) -> Result<()> {
        let geo = self.geo.get_or_insert_with(GeoDraft::default);
        match key {
            "bline" => geo.bline = Some(number(key, value)?),
            "bsamp" => geo.bsamp = Some(number(key, value)?),
            "dline" => geo.dline = Some(number(key, value)?),
            "dsamp" => geo.dsamp = Some(number(key, value)?),
            "units" => geo.units = Some(value.to_string()),
            "coord_sys_ID" => geo.coord_sys_id = Some(value.to_string()),
            _ => skip(SectionKind::Geo, key),
        }
        Ok(())
    }

    fn finish(self, name: String, index: usize) -> Result<BandDescriptor> {
        let bytes = self.bytes.ok_or_else(|| {
            IpwError::Format(format!("band {} has no basic_image section", index))
        })?;
        let width = ByteWidth::from_bytes(bytes)?;

        if let Some(bits) = self.bits {
            if bits != width.bits() {
                return Err(IpwError::Format(format!(
                    "band {} declares {} bits for {} bytes",
                    index, bits, bytes
                )));
            }
        }

        let mut band = BandDescriptor::new(name, index, width);

        match self.maps.as_slice() {
            [] => {}
            [(int_min, float_min), (int_max, float_max)] => {
                if *int_min != 0 {
                    return Err(IpwError::Format(format!(
                        "lq of band {} must map integer 0 first, found {}",
                        index, int_min
                    )));
                }
                if *int_max != u64::from(width.int_max()) {
                    return Err(IpwError::Format(format!(
                        "lq of band {} maps integer {} but {}-bit data ends at {}",
                        index,
                        int_max,
                        width.bits(),
                        width.int_max()
                    )));
                }
                band = band.with_range(*float_min, *float_max);
            }
            _ => {
                return Err(IpwError::Format(format!(
                    "lq section of band {} needs two map lines",
                    index
                )))
            }
        }

        if let Some(geo) = self.geo {
            band.geo = Some(geo.finish(index)?);
        }

        Ok(band)
    }
}

/// Section the parser is currently inside
#[derive(Debug, Clone, Copy)]
struct Cursor {
    kind: SectionKind,
    index: i64,
}

/// Fold state for everything after the image-wide section
#[derive(Debug)]
struct BandState {
    cursor: Cursor,
    bands: Vec<BandDraft>,
}

impl BandState {
    fn new(nbands: usize) -> Self {
        BandState {
            cursor: Cursor {
                kind: SectionKind::Global,
                index: -1,
            },
            bands: (0..nbands).map(|_| BandDraft::default()).collect(),
        }
    }

    fn consume(mut self, line: &str) -> Result<Self> {
        if let Some(marker) = Marker::from_line(line)? {
            if marker.kind == SectionKind::Global {
                return Err(IpwError::Format("repeated basic_image_i section".to_string()));
            }
            if marker.kind.is_per_band()
                && (marker.index < 0 || marker.index as usize >= self.bands.len())
            {
                return Err(IpwError::BandIndexOutOfRange {
                    index: marker.index,
                    bands: self.bands.len(),
                });
            }
            self.cursor = Cursor {
                kind: marker.kind,
                index: marker.index,
            };
            return Ok(self);
        }

        let (key, value) = match key_value(line)? {
            Some(kv) => kv,
            None => return Ok(self),
        };

        let band = self.cursor.index as usize;
        match self.cursor.kind {
            SectionKind::BasicImage => self.bands[band].set_basic_image(key, value)?,
            SectionKind::Lq => self.bands[band].set_lq(key, value, band)?,
            SectionKind::Geo => self.bands[band].set_geo(key, value)?,
            kind @ (SectionKind::Global | SectionKind::Image) => skip(kind, key),
        }

        Ok(self)
    }

    fn finish(self, names: Vec<String>) -> Result<Vec<BandDescriptor>> {
        let mut bands = self
            .bands
            .into_iter()
            .zip(names)
            .enumerate()
            .map(|(index, (draft, name))| draft.finish(name, index))
            .collect::<Result<Vec<_>>>()?;

        reconcile_geo(&mut bands)?;
        Ok(bands)
    }
}

/// Geo headers describe the whole image: bands that carry one must agree,
/// and bands without one take the first band's.
fn reconcile_geo(bands: &mut [BandDescriptor]) -> Result<()> {
    let reference = match bands.iter().find_map(|band| band.geo.clone()) {
        Some(geo) => geo,
        None => return Ok(()),
    };

    for band in bands.iter_mut() {
        match &band.geo {
            Some(geo) if *geo != reference => {
                return Err(IpwError::GeoMismatch { band: band.index() })
            }
            Some(_) => {}
            None => band.geo = Some(reference.clone()),
        }
    }

    Ok(())
}
