// tests/quantize_tests.rs
use float_cmp::approx_eq;
use ipw_rs::raw_data::quantize::{decode, encode, max_error};
use ipw_rs::*;
use proptest::prelude::*;

fn width() -> impl Strategy<Value = ByteWidth> {
    prop_oneof![Just(ByteWidth::One), Just(ByteWidth::Two), Just(ByteWidth::Four)]
}

proptest! {
    #[test]
    fn round_trip_stays_within_one_step(
        width in width(),
        min in -1.0e4f64..1.0e4,
        span in 1.0e-3f64..1.0e4,
        t in 0.0f64..=1.0,
    ) {
        let max = min + span;
        let band = BandDescriptor::new("v", 0, width).with_range(min, max);
        let value = (min + t * span).min(max);

        let raw = encode(value, &band).unwrap();
        prop_assert!(raw <= band.int_max());
        let decoded = decode(raw, &band);
        // one step, plus float noise at the magnitude of the range ends
        let noise = 8.0 * f64::EPSILON * min.abs().max(max.abs());
        prop_assert!((decoded - value).abs() <= max_error(&band) + noise);
    }

    #[test]
    fn values_outside_the_range_are_rejected(
        min in -1.0e4f64..1.0e4,
        span in 1.0e-3f64..1.0e4,
        excess in 1.0e-2f64..1.0e3,
    ) {
        let band = BandDescriptor::new("v", 0, ByteWidth::Two).with_range(min, min + span);
        let is_range_violation = |r: ipw_rs::Result<u32>| matches!(r, Err(IpwError::RangeViolation { .. }));
        prop_assert!(is_range_violation(encode(min + span + excess, &band)));
        prop_assert!(is_range_violation(encode(min - excess, &band)));
    }
}

#[test]
fn test_documented_values() {
    let this = BandDescriptor::new("this", 0, ByteWidth::Two).with_range(-100.0, 100.0);
    let that = BandDescriptor::new("that", 1, ByteWidth::One).with_range(-5.0, 10.0);
    assert_eq!(encode(10.0, &this).unwrap(), 36044);
    assert_eq!(encode(-1.0, &that).unwrap(), 68);

    let t_s = BandDescriptor::new("T_s", 0, ByteWidth::One).with_range(-27.5, 33.0);
    assert!(approx_eq!(f64, decode(10, &t_s), -25.1274509804, epsilon = 1e-9));
}
