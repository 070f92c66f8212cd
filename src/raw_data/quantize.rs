// src/raw_data/quantize.rs
//! Linear quantization between physical values and stored integers.
//!
//! A band maps the integer range `[0, int_max]` linearly onto the physical
//! range `[float_min, float_max]`. Encoding is lossy; the error of a decoded
//! value is bounded by one quantization step, see [`max_error`].

use crate::error::{IpwError, Result};
use crate::header::BandDescriptor;

/// Quantization parameters of one band, detached from its descriptor so a
/// whole column can be converted without touching the header again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMap {
    pub float_min: f64,
    pub float_max: f64,
    pub int_max: u32,
}

impl LinearMap {
    pub fn for_band(band: &BandDescriptor) -> Self {
        LinearMap {
            float_min: band.float_min,
            float_max: band.float_max,
            int_max: band.int_max(),
        }
    }

    /// Integer → physical value
    #[inline]
    pub fn decode(&self, raw: u32) -> f64 {
        raw as f64 * (self.float_max - self.float_min) / self.int_max as f64 + self.float_min
    }

    /// Physical value → integer, or `None` when `value` is outside the range.
    ///
    /// Halfway cases round to even.
    #[inline]
    pub fn encode(&self, value: f64) -> Option<u32> {
        if !(self.float_min <= value && value <= self.float_max) {
            return None;
        }
        let span = self.float_max - self.float_min;
        if span == 0.0 {
            return Some(0);
        }
        let scaled = ((value - self.float_min) * self.int_max as f64 / span)
            .round_ties_even()
            .floor();
        Some(scaled as u32)
    }

    /// Largest difference between a value and its decoded encoding
    pub fn step(&self) -> f64 {
        (self.float_max - self.float_min).abs() / self.int_max as f64
    }
}

/// Decode a raw integer of `band`
pub fn decode(raw: u32, band: &BandDescriptor) -> f64 {
    LinearMap::for_band(band).decode(raw)
}

/// Encode `value` for `band`.
///
/// Values outside `[float_min, float_max]` (and NaN) are rejected with
/// [`IpwError::RangeViolation`]; they are never clamped.
pub fn encode(value: f64, band: &BandDescriptor) -> Result<u32> {
    LinearMap::for_band(band)
        .encode(value)
        .ok_or_else(|| range_violation(value, band))
}

/// Error bound of a decode(encode(v)) round trip for `band`
pub fn max_error(band: &BandDescriptor) -> f64 {
    LinearMap::for_band(band).step()
}

pub(crate) fn range_violation(value: f64, band: &BandDescriptor) -> IpwError {
    IpwError::RangeViolation {
        band: band.name.clone(),
        value,
        min: band.float_min,
        max: band.float_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ByteWidth;
    use float_cmp::approx_eq;

    fn this() -> BandDescriptor {
        BandDescriptor::new("this", 0, ByteWidth::Two).with_range(-100.0, 100.0)
    }

    fn that() -> BandDescriptor {
        BandDescriptor::new("that", 1, ByteWidth::One).with_range(-5.0, 10.0)
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(10.0, &this()).unwrap(), 36044);
        assert_eq!(encode(-1.0, &that()).unwrap(), 68);
    }

    #[test]
    fn test_encode_range_ends() {
        assert_eq!(encode(-100.0, &this()).unwrap(), 0);
        assert_eq!(encode(100.0, &this()).unwrap(), 65535);
        assert_eq!(encode(10.0, &that()).unwrap(), 255);
    }

    #[test]
    fn test_decode_known_value() {
        let band = BandDescriptor::new("T_s", 0, ByteWidth::One).with_range(-27.5, 33.0);
        assert!(approx_eq!(f64, decode(10, &band), -25.1274509804, epsilon = 1e-9));
        assert_eq!(decode(0, &band), -27.5);
        assert!(approx_eq!(f64, decode(255, &band), 33.0, epsilon = 1e-12));
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        match encode(100.5, &this()) {
            Err(IpwError::RangeViolation { band, value, min, max }) => {
                assert_eq!(band, "this");
                assert_eq!(value, 100.5);
                assert_eq!((min, max), (-100.0, 100.0));
            }
            other => panic!("expected range violation, got {:?}", other),
        }
        assert!(encode(-5.01, &that()).is_err());
        assert!(encode(f64::NAN, &that()).is_err());
    }

    #[test]
    fn test_degenerate_range() {
        let band = BandDescriptor::new("mask", 0, ByteWidth::One).with_range(1.0, 1.0);
        assert_eq!(encode(1.0, &band).unwrap(), 0);
        assert_eq!(decode(0, &band), 1.0);
        assert!(encode(1.5, &band).is_err());
    }

    #[test]
    fn test_halfway_rounds_to_even() {
        // 0.5 and 1.5 steps above the minimum
        let band = BandDescriptor::new("x", 0, ByteWidth::One).with_range(0.0, 255.0);
        assert_eq!(encode(0.5, &band).unwrap(), 0);
        assert_eq!(encode(1.5, &band).unwrap(), 2);
    }

    #[test]
    fn test_max_error() {
        assert!(approx_eq!(f64, max_error(&that()), 15.0 / 255.0, ulps = 2));
    }
}
