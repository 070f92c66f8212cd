// src/types.rs
use crate::error::{IpwError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Kind of IPW image, which decides the variables stored in its bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Forcing inputs (`in.<step>`)
    In,
    /// Energy and mass flux outputs (`em.<step>`)
    Em,
    /// Snowpack state outputs (`snow.<step>`)
    Snow,
    /// Initial snowpack conditions
    Init,
    /// Precipitation inputs
    Precip,
    Mask,
    Dem,
}

impl FileType {
    pub const ALL: [FileType; 7] = [
        FileType::In,
        FileType::Em,
        FileType::Snow,
        FileType::Init,
        FileType::Precip,
        FileType::Mask,
        FileType::Dem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::In => "in",
            FileType::Em => "em",
            FileType::Snow => "snow",
            FileType::Init => "init",
            FileType::Precip => "precip",
            FileType::Mask => "mask",
            FileType::Dem => "dem",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = IpwError;

    fn from_str(s: &str) -> Result<Self> {
        FileType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| IpwError::UnsupportedFileType(s.to_string()))
    }
}

/// Container format of a file on disk, decided once from its path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Tif,
    Ipw,
    NetCdf,
}

impl FileKind {
    /// IPW files carry no fixed extension (`snow.0042`, `dem.ipw`, `mask`),
    /// so anything that is not recognisably GeoTIFF or NetCDF is taken as IPW.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("tif") | Some("tiff") => FileKind::Tif,
            Some("nc") | Some("nc4") | Some("netcdf") => FileKind::NetCdf,
            _ => FileKind::Ipw,
        }
    }

    /// Fails with [`IpwError::UnsupportedFileKind`] unless `path` names an IPW file
    pub fn require_ipw(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match FileKind::from_path(path) {
            FileKind::Ipw => Ok(()),
            _ => Err(IpwError::UnsupportedFileKind(path.display().to_string())),
        }
    }
}

/// Byte order used for multi-byte pixel values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Map an IPW `byteorder` tag to an order. Each digit is the
    /// significance of the byte at that position, so `0123` stores the
    /// least significant byte first.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "0123" => Ok(Endianness::Little),
            "3210" => Ok(Endianness::Big),
            other => Err(IpwError::Format(format!("unknown byteorder tag '{}'", other))),
        }
    }
}

/// Lookup table from file type to the ordered variable names of its bands.
///
/// The table is deployment data rather than behaviour: [`Default`] yields the
/// iSnobal layout, and callers running a different model can replace entries
/// with [`VariableTable::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableTable {
    entries: HashMap<FileType, Vec<String>>,
}

impl VariableTable {
    /// Create a table with no file types
    pub fn empty() -> Self {
        VariableTable {
            entries: HashMap::new(),
        }
    }

    pub fn insert<I, S>(&mut self, file_type: FileType, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(file_type, names.into_iter().map(Into::into).collect());
    }

    pub fn with(mut self, file_type: FileType, names: &[&str]) -> Self {
        self.insert(file_type, names.iter().copied());
        self
    }

    /// All variable names configured for `file_type`
    pub fn variables(&self, file_type: FileType) -> Result<&[String]> {
        self.entries
            .get(&file_type)
            .map(Vec::as_slice)
            .ok_or_else(|| IpwError::UnsupportedFileType(file_type.to_string()))
    }

    /// Names of the first `nbands` variables of `file_type`.
    ///
    /// Images may carry fewer bands than the table lists (night-time `in`
    /// files have no solar band); more bands than names is a format error.
    pub fn names_for(&self, file_type: FileType, nbands: usize) -> Result<Vec<String>> {
        let names = self.variables(file_type)?;
        if nbands > names.len() {
            return Err(IpwError::Format(format!(
                "{} bands found but file type '{}' defines only {} variables",
                nbands,
                file_type,
                names.len()
            )));
        }
        Ok(names[..nbands].to_vec())
    }
}

impl Default for VariableTable {
    fn default() -> Self {
        VariableTable::empty()
            .with(FileType::In, &["I_lw", "T_a", "e_a", "u", "T_g", "S_n"])
            .with(
                FileType::Em,
                &[
                    "R_n", "H", "L_v_E", "G", "M", "delta_Q", "E_s", "melt", "ro_predict", "cc_s",
                ],
            )
            .with(
                FileType::Snow,
                &["z_s", "rho", "m_s", "h2o", "T_s_0", "T_s_l", "T_s", "z_s_l", "h2o_sat"],
            )
            .with(
                FileType::Init,
                &["z", "z_0", "z_s", "rho", "T_s_0", "T_s_l", "T_s", "h2o_sat"],
            )
            .with(FileType::Precip, &["m_pp", "percent_snow", "rho_snow", "T_pp"])
            .with(FileType::Mask, &["mask"])
            .with(FileType::Dem, &["dem"])
    }
}
