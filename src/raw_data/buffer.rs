// src/raw_data/buffer.rs
use crate::error::{IpwError, Result};
use crate::header::{BandDescriptor, ByteWidth};
use crate::raw_data::quantize::{range_violation, LinearMap};
use crate::types::Endianness;
use bytes::{BufMut, Bytes, BytesMut};
use ndarray::ArrayView2;

/// Buffer accumulating band-interleaved-by-pixel records for writing
///
/// Values are quantized with each band's current range as they are written,
/// so a value outside that range aborts the write instead of being stored
/// wrapped or clamped.
///
/// # Example
///
/// ```
/// use ipw_rs::header::{BandDescriptor, ByteWidth};
/// use ipw_rs::raw_data::PackBuffer;
/// use ipw_rs::types::Endianness;
///
/// let bands = vec![
///     BandDescriptor::new("this", 0, ByteWidth::Two).with_range(-100.0, 100.0),
///     BandDescriptor::new("that", 1, ByteWidth::One).with_range(-5.0, 10.0),
/// ];
/// let mut buffer = PackBuffer::new(&bands, Endianness::Little);
/// buffer.write_pixel(&[10.0, -1.0]).unwrap();
///
/// assert_eq!(buffer.pixel_count(), 1);
/// assert_eq!(buffer.as_bytes(), &[0xcc, 0x8c, 68]);
/// ```
pub struct PackBuffer<'a> {
    buffer: BytesMut,
    bands: &'a [BandDescriptor],
    maps: Vec<LinearMap>,
    order: Endianness,
    pixel_count: usize,
}

impl<'a> PackBuffer<'a> {
    /// Create a new buffer with room for 4096 pixels
    pub fn new(bands: &'a [BandDescriptor], order: Endianness) -> Self {
        Self::with_capacity(bands, order, 4096)
    }

    /// Create a new buffer with room for `pixels` records
    pub fn with_capacity(bands: &'a [BandDescriptor], order: Endianness, pixels: usize) -> Self {
        let record_size: usize = bands.iter().map(BandDescriptor::bytes).sum();
        PackBuffer {
            buffer: BytesMut::with_capacity(record_size * pixels),
            bands,
            maps: bands.iter().map(LinearMap::for_band).collect(),
            order,
            pixel_count: 0,
        }
    }

    /// Quantize and append one pixel, one value per band in band order
    pub fn write_pixel(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.bands.len() {
            return Err(IpwError::InvalidArgument(format!(
                "pixel has {} values for {} bands",
                values.len(),
                self.bands.len()
            )));
        }

        // Encode the whole record first so a failure leaves no partial pixel behind
        let mut raw = smallvec::SmallVec::<[u32; 16]>::with_capacity(values.len());
        for ((&value, map), band) in values.iter().zip(&self.maps).zip(self.bands) {
            raw.push(map.encode(value).ok_or_else(|| range_violation(value, band))?);
        }

        for (&raw, band) in raw.iter().zip(self.bands) {
            self.put(raw, band.width());
        }
        self.pixel_count += 1;
        Ok(())
    }

    /// Append every row of a `pixels x bands` table
    pub fn write_table(&mut self, table: ArrayView2<'_, f64>) -> Result<()> {
        if table.ncols() != self.bands.len() {
            return Err(IpwError::InvalidArgument(format!(
                "table has {} columns for {} bands",
                table.ncols(),
                self.bands.len()
            )));
        }

        let mut pixel = vec![0.0; self.bands.len()];
        for row in table.rows() {
            for (slot, &value) in pixel.iter_mut().zip(row.iter()) {
                *slot = value;
            }
            self.write_pixel(&pixel)?;
        }
        Ok(())
    }

    #[inline]
    fn put(&mut self, raw: u32, width: ByteWidth) {
        match (width, self.order) {
            (ByteWidth::One, _) => self.buffer.put_u8(raw as u8),
            (ByteWidth::Two, Endianness::Little) => self.buffer.put_u16_le(raw as u16),
            (ByteWidth::Two, Endianness::Big) => self.buffer.put_u16(raw as u16),
            (ByteWidth::Four, Endianness::Little) => self.buffer.put_u32_le(raw),
            (ByteWidth::Four, Endianness::Big) => self.buffer.put_u32(raw),
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn byte_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Freeze the buffer into immutable bytes
    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }
}

/// Quantize a whole table into pixel data
pub fn pack_table(
    table: ArrayView2<'_, f64>,
    bands: &[BandDescriptor],
    order: Endianness,
) -> Result<Bytes> {
    let mut buffer = PackBuffer::with_capacity(bands, order, table.nrows());
    buffer.write_table(table)?;
    Ok(buffer.freeze())
}
