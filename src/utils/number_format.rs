// src/utils/number_format.rs

/// Render a header number the way IPW tools expect it: whole values without
/// a decimal point (`500`, not `500.0`), everything else at full precision.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_numbers() {
        assert_eq!(format_number(500.0), "500");
        assert_eq!(format_number(-100.0), "-100");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(4294967295.0), "4294967295");
    }

    #[test]
    fn test_fractional_numbers_round_trip() {
        for value in [-27.5, 0.1, 33.000001, -0.0001234, 1.0 / 3.0] {
            let text = format_number(value);
            assert_eq!(text.parse::<f64>().unwrap(), value);
        }
        assert_eq!(format_number(-27.5), "-27.5");
    }
}
