// src/utils/header_lines.rs
use crate::error::{IpwError, Result};

/// Line that closes the header; pixel data starts right after its newline
pub const END_OF_HEADER: &[u8] = b"\x0c";

/// Split the ASCII header off `bytes`.
///
/// Returns the header lines (without the closing form feed) and the offset of
/// the first pixel byte. Pixel data may itself contain newlines, so the scan
/// stops at the form feed line and never looks past it.
pub fn split_header(bytes: &[u8]) -> Result<(Vec<&str>, usize)> {
    let mut lines = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let len = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| IpwError::Format("header line is not newline terminated".to_string()))?;
        let raw = &bytes[pos..pos + len];
        pos += len + 1;

        if raw == END_OF_HEADER {
            return Ok((lines, pos));
        }

        let line = std::str::from_utf8(raw)
            .map_err(|_| IpwError::Format(format!("non-ASCII header line {}", lines.len() + 1)))?;
        lines.push(line.trim_end_matches('\r'));
    }

    Err(IpwError::Format("missing end of header".to_string()))
}
