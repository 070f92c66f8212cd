// src/utils/mod.rs
mod header_lines;
mod number_format;

pub(crate) use header_lines::*;
pub(crate) use number_format::*;
