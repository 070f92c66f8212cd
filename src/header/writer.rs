// src/header/writer.rs
use crate::header::marker::{Marker, SectionKind};
use crate::header::Header;
use crate::utils::format_number;
use std::fmt::Display;

/// Render `header` as IPW header text, closing form feed line included.
///
/// Sections are written image-wide first, then `basic_image`, `lq` and `geo`
/// for each band in band order. Every field line ends in a space before the
/// newline, which the IPW tools expect.
pub fn write_header(header: &Header) -> String {
    let mut out = String::with_capacity(256 + header.bands.len() * 160);

    marker(&mut out, Marker::global());
    field(&mut out, "byteorder", &header.global.byteorder);
    field(&mut out, "nlines", header.global.nlines);
    field(&mut out, "nsamps", header.global.nsamps);
    field(&mut out, "nbands", header.global.nbands);

    for band in &header.bands {
        marker(&mut out, Marker::new(SectionKind::BasicImage, band.index() as i64));
        field(&mut out, "bytes", band.bytes());
        field(&mut out, "bits", band.bits());
    }

    for band in &header.bands {
        marker(&mut out, Marker::new(SectionKind::Lq, band.index() as i64));
        field(
            &mut out,
            "map",
            format!("{} {}", band.int_min(), format_number(band.float_min)),
        );
        field(
            &mut out,
            "map",
            format!("{} {}", band.int_max(), format_number(band.float_max)),
        );
    }

    for band in &header.bands {
        if let Some(geo) = &band.geo {
            marker(&mut out, Marker::new(SectionKind::Geo, band.index() as i64));
            field(&mut out, "bline", format_number(geo.bline));
            field(&mut out, "bsamp", format_number(geo.bsamp));
            field(&mut out, "dline", format_number(geo.dline));
            field(&mut out, "dsamp", format_number(geo.dsamp));
            field(&mut out, "units", &geo.units);
            field(&mut out, "coord_sys_ID", &geo.coord_sys_id);
        }
    }

    marker(&mut out, Marker::image());
    out.push('\x0c');
    out.push('\n');

    out
}

fn marker(out: &mut String, marker: Marker) {
    out.push_str(&marker.to_string());
    out.push('\n');
}

fn field(out: &mut String, key: &str, value: impl Display) {
    out.push_str(&format!("{} = {} \n", key, value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{parse_header, BandDescriptor, ByteWidth, GeoFields, GlobalDescriptor};
    use crate::types::{FileType, VariableTable};

    fn header() -> Header {
        let geo = GeoFields {
            bline: 4000000.0,
            bsamp: 600000.5,
            dline: -50.0,
            dsamp: 50.0,
            units: "m".to_string(),
            coord_sys_id: "UTM".to_string(),
        };
        Header {
            global: GlobalDescriptor::new("0123", 1, 2, 2),
            bands: vec![
                BandDescriptor::new("this", 0, ByteWidth::Two)
                    .with_range(-100.0, 100.0)
                    .with_geo(geo.clone()),
                BandDescriptor::new("that", 1, ByteWidth::One)
                    .with_range(-5.0, 10.25)
                    .with_geo(geo),
            ],
        }
    }

    #[test]
    fn test_exact_layout() {
        let text = write_header(&header());
        let expected = "!<header> basic_image_i -1 $Revision: 1.11 $\n\
                        byteorder = 0123 \n\
                        nlines = 1 \n\
                        nsamps = 2 \n\
                        nbands = 2 \n\
                        !<header> basic_image 0 $Revision: 1.11 $\n\
                        bytes = 2 \n\
                        bits = 16 \n\
                        !<header> basic_image 1 $Revision: 1.11 $\n\
                        bytes = 1 \n\
                        bits = 8 \n\
                        !<header> lq 0 $Revision: 1.6 $\n\
                        map = 0 -100 \n\
                        map = 65535 100 \n\
                        !<header> lq 1 $Revision: 1.6 $\n\
                        map = 0 -5 \n\
                        map = 255 10.25 \n\
                        !<header> geo 0 $Revision: 1.7 $\n\
                        bline = 4000000 \n\
                        bsamp = 600000.5 \n\
                        dline = -50 \n\
                        dsamp = 50 \n\
                        units = m \n\
                        coord_sys_ID = UTM \n\
                        !<header> geo 1 $Revision: 1.7 $\n\
                        bline = 4000000 \n\
                        bsamp = 600000.5 \n\
                        dline = -50 \n\
                        dsamp = 50 \n\
                        units = m \n\
                        coord_sys_ID = UTM \n\
                        !<header> image -1 $Revision: 1.5 $\n\
                        \x0c\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_written_header_parses_back() {
        let original = header();
        let text = write_header(&original);
        let lines: Vec<&str> = text.lines().filter(|line| *line != "\x0c").collect();
        let table = VariableTable::empty().with(FileType::Em, &["this", "that"]);

        let parsed = parse_header(&lines, FileType::Em, &table).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_bands_without_geo_write_no_geo_section() {
        let mut header = header();
        for band in &mut header.bands {
            band.geo = None;
        }
        let text = write_header(&header);
        assert!(!text.contains(" geo "));
    }
}
