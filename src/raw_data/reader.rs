// src/raw_data/reader.rs
use crate::error::{IpwError, Result};
use crate::header::{BandDescriptor, ByteWidth};
use crate::raw_data::quantize::LinearMap;
use crate::types::Endianness;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use ndarray::Array2;

/// Unpacks band-interleaved-by-pixel data.
///
/// Each pixel is one record holding one unsigned integer per band, in band
/// order and with the band's width, with no padding anywhere.
pub struct RawDataReader;

impl RawDataReader {
    /// Split `payload` into one raw integer column per band.
    ///
    /// # Arguments
    ///
    /// * `payload` - Pixel data following the header
    /// * `bands` - Band descriptors in band order
    /// * `pixels` - Number of pixels (`nlines * nsamps`)
    /// * `order` - Byte order of multi-byte values
    ///
    /// # Example
    ///
    /// ```
    /// use ipw_rs::header::{BandDescriptor, ByteWidth};
    /// use ipw_rs::raw_data::RawDataReader;
    /// use ipw_rs::types::Endianness;
    ///
    /// let bands = vec![
    ///     BandDescriptor::new("a", 0, ByteWidth::Two),
    ///     BandDescriptor::new("b", 1, ByteWidth::One),
    /// ];
    /// let payload = [0x01, 0x02, 7, 0xff, 0xff, 9];
    /// let columns = RawDataReader::read_columns(&payload, &bands, 2, Endianness::Little).unwrap();
    /// assert_eq!(columns, vec![vec![0x0201, 0xffff], vec![7, 9]]);
    /// ```
    pub fn read_columns(
        payload: &[u8],
        bands: &[BandDescriptor],
        pixels: usize,
        order: Endianness,
    ) -> Result<Vec<Vec<u32>>> {
        let record_size: usize = bands.iter().map(BandDescriptor::bytes).sum();
        let expected = record_size * pixels;
        if payload.len() != expected {
            return Err(IpwError::LayoutMismatch {
                expected,
                found: payload.len(),
            });
        }

        let mut columns: Vec<Vec<u32>> = bands.iter().map(|_| Vec::with_capacity(pixels)).collect();
        if record_size == 0 {
            return Ok(columns);
        }

        for record in payload.chunks_exact(record_size) {
            let mut offset = 0;
            for (band, column) in bands.iter().zip(columns.iter_mut()) {
                let width = band.width();
                column.push(read_value(&record[offset..offset + width.bytes()], width, order));
                offset += width.bytes();
            }
        }

        Ok(columns)
    }

    /// Unpack and decode `payload` into a `pixels x bands` table of physical values
    pub fn read_table(
        payload: &[u8],
        bands: &[BandDescriptor],
        pixels: usize,
        order: Endianness,
    ) -> Result<Array2<f64>> {
        let columns = Self::read_columns(payload, bands, pixels, order)?;
        Ok(Self::decode_columns(&columns, bands, pixels))
    }

    /// Apply each band's quantization to its raw column
    pub fn decode_columns(columns: &[Vec<u32>], bands: &[BandDescriptor], pixels: usize) -> Array2<f64> {
        let mut table = Array2::<f64>::zeros((pixels, bands.len()));

        for ((band, raw), mut out) in bands.iter().zip(columns).zip(table.columns_mut()) {
            let map = LinearMap::for_band(band);
            for (value, &raw) in out.iter_mut().zip(raw) {
                *value = map.decode(raw);
            }
        }

        table
    }
}

#[inline]
fn read_value(bytes: &[u8], width: ByteWidth, order: Endianness) -> u32 {
    match (width, order) {
        (ByteWidth::One, _) => bytes[0] as u32,
        (ByteWidth::Two, Endianness::Little) => LittleEndian::read_u16(bytes) as u32,
        (ByteWidth::Two, Endianness::Big) => BigEndian::read_u16(bytes) as u32,
        (ByteWidth::Four, Endianness::Little) => LittleEndian::read_u32(bytes),
        (ByteWidth::Four, Endianness::Big) => BigEndian::read_u32(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> Vec<BandDescriptor> {
        vec![
            BandDescriptor::new("wide", 0, ByteWidth::Four),
            BandDescriptor::new("narrow", 1, ByteWidth::One),
        ]
    }

    #[test]
    fn test_big_endian_columns() {
        let payload = [0, 0, 1, 2, 5, 0xff, 0, 0, 0, 6];
        let columns = RawDataReader::read_columns(&payload, &bands(), 2, Endianness::Big).unwrap();
        assert_eq!(columns[0], vec![0x0102, 0xff000000]);
        assert_eq!(columns[1], vec![5, 6]);
    }

    #[test]
    fn test_length_mismatch() {
        let payload = [0u8; 9];
        match RawDataReader::read_columns(&payload, &bands(), 2, Endianness::Little) {
            Err(IpwError::LayoutMismatch { expected, found }) => {
                assert_eq!(expected, 10);
                assert_eq!(found, 9);
            }
            other => panic!("expected layout mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_to_table() {
        let bands = vec![
            BandDescriptor::new("a", 0, ByteWidth::One).with_range(-5.0, 10.0),
            BandDescriptor::new("b", 1, ByteWidth::One),
        ];
        let payload = [0, 3, 255, 4, 68, 5];
        let table = RawDataReader::read_table(&payload, &bands, 3, Endianness::Little).unwrap();

        assert_eq!(table.dim(), (3, 2));
        assert_eq!(table[[0, 0]], -5.0);
        assert_eq!(table[[1, 0]], 10.0);
        assert_eq!(table[[2, 0]], -1.0);
        assert_eq!(table.column(1).to_vec(), vec![3.0, 4.0, 5.0]);
    }
}
