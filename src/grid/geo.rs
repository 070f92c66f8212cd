// src/grid/geo.rs
use crate::header::GeoFields;

/// Affine placement of the pixel grid, derived from a band's geo fields.
///
/// IPW stores the coordinate of the first line and sample and the spacing
/// between them; lines run along y, samples along x. There is no rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_x: f64,
    pub origin_y: f64,
    pub pixel_y: f64,
}

impl GeoTransform {
    pub fn from_geo(geo: &GeoFields) -> Self {
        GeoTransform {
            origin_x: geo.bsamp,
            pixel_x: geo.dsamp,
            origin_y: geo.bline,
            pixel_y: geo.dline,
        }
    }

    /// Coordinate of every sample (column)
    pub fn x_coords(&self, nsamps: usize) -> Vec<f64> {
        (0..nsamps)
            .map(|j| self.origin_x + self.pixel_x * j as f64)
            .collect()
    }

    /// Coordinate of every line (row)
    pub fn y_coords(&self, nlines: usize) -> Vec<f64> {
        (0..nlines)
            .map(|i| self.origin_y + self.pixel_y * i as f64)
            .collect()
    }

    /// `[origin_x, pixel_x, 0, origin_y, 0, pixel_y]`, the GDAL ordering
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_x, 0.0, self.origin_y, 0.0, self.pixel_y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates() {
        let geo = GeoFields {
            bline: 4_000_000.0,
            bsamp: 600_000.0,
            dline: -50.0,
            dsamp: 50.0,
            units: "m".to_string(),
            coord_sys_id: "UTM".to_string(),
        };
        let transform = GeoTransform::from_geo(&geo);

        assert_eq!(transform.x_coords(3), vec![600_000.0, 600_050.0, 600_100.0]);
        assert_eq!(transform.y_coords(2), vec![4_000_000.0, 3_999_950.0]);
        assert_eq!(
            transform.to_gdal(),
            [600_000.0, 50.0, 0.0, 4_000_000.0, 0.0, -50.0]
        );
    }
}
