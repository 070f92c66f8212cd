// src/config.rs
//! Codec configuration supplied by the caller.
//!
//! Nothing here is read from disk: deployments build an [`IpwConfig`] in code
//! (or, for the `ipw` binary, from command-line flags).

use crate::error::{IpwError, Result};
use crate::types::{Endianness, VariableTable};
use chrono::{Duration, NaiveDateTime};
use std::path::Path;

/// How the `byteorder` tag of the global header is applied to pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrderPolicy {
    /// Keep the tag as text only and always use little-endian pixels.
    /// Matches files written by the historical toolchain.
    #[default]
    Fixed,
    /// Decode and encode pixels in the order named by the tag
    HonorTag,
}

impl ByteOrderPolicy {
    pub fn resolve(&self, tag: &str) -> Result<Endianness> {
        match self {
            ByteOrderPolicy::Fixed => Ok(Endianness::Little),
            ByteOrderPolicy::HonorTag => Endianness::from_tag(tag),
        }
    }
}

/// Model time stepping used to turn `prefix.<index>` file names into intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStep {
    /// Start of time step zero
    pub origin: NaiveDateTime,
    /// Length of one time step
    pub step: Duration,
}

impl TimeStep {
    pub fn new(origin: NaiveDateTime, step: Duration) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(IpwError::InvalidArgument(format!(
                "time step must be positive, got {}",
                step
            )));
        }
        Ok(TimeStep { origin, step })
    }

    pub fn hourly(origin: NaiveDateTime) -> Self {
        TimeStep {
            origin,
            step: Duration::hours(1),
        }
    }

    /// Half-open interval covered by time step `index`.
    ///
    /// Fails with `InvalidArgument` when the interval falls outside the
    /// representable datetimes.
    pub fn interval_at(&self, index: i64) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let out_of_range = || {
            IpwError::InvalidArgument(format!(
                "time step {} of {} from {} is out of range",
                index, self.step, self.origin
            ))
        };
        let offset = self
            .step
            .num_milliseconds()
            .checked_mul(index)
            .and_then(Duration::try_milliseconds)
            .ok_or_else(out_of_range)?;
        let start = self
            .origin
            .checked_add_signed(offset)
            .ok_or_else(out_of_range)?;
        let end = start.checked_add_signed(self.step).ok_or_else(out_of_range)?;
        Ok((start, end))
    }

    /// Interval of the file at `path`, named `<prefix>.<index>` (e.g. `em.0023`)
    pub fn interval_for(&self, path: impl AsRef<Path>) -> Result<(NaiveDateTime, NaiveDateTime)> {
        self.interval_at(step_index(path.as_ref())?)
    }
}

/// Numeric extension of a `<prefix>.<index>` file name
pub fn step_index(path: &Path) -> Result<i64> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<i64>().ok())
        .ok_or_else(|| {
            IpwError::InvalidArgument(format!(
                "cannot infer a time step index from '{}'",
                path.display()
            ))
        })
}

/// Everything the codec needs besides the bytes themselves
#[derive(Debug, Clone, Default)]
pub struct IpwConfig {
    pub variables: VariableTable,
    pub time_step: Option<TimeStep>,
    pub byte_order: ByteOrderPolicy,
}

impl IpwConfig {
    pub fn with_variables(mut self, variables: VariableTable) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_time_step(mut self, time_step: TimeStep) -> Self {
        self.time_step = Some(time_step);
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrderPolicy) -> Self {
        self.byte_order = byte_order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn origin() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 10, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_interval_from_name() {
        let step = TimeStep::hourly(origin());
        let (start, end) = step.interval_for("output/em.0023").unwrap();
        assert_eq!(start, origin() + Duration::hours(23));
        assert_eq!(end, origin() + Duration::hours(24));
    }

    #[test]
    fn test_interval_requires_numeric_extension() {
        let step = TimeStep::hourly(origin());
        assert!(matches!(
            step.interval_for("dem.ipw"),
            Err(IpwError::InvalidArgument(_))
        ));
        assert!(step.interval_for("mask").is_err());
    }

    #[test]
    fn test_large_step_indices() {
        let step = TimeStep::hourly(origin());
        assert!(matches!(
            step.interval_for("em.4294967297"),
            Err(IpwError::InvalidArgument(_))
        ));
        assert!(step.interval_at(i64::MAX).is_err());
        assert!(step.interval_at(i64::MIN).is_err());

        // past i32::MAX and still representable
        let (start, end) = step.interval_for("em.2147483653").unwrap();
        assert_eq!(start - origin(), Duration::hours(2_147_483_653));
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn test_non_positive_step_rejected() {
        assert!(TimeStep::new(origin(), Duration::zero()).is_err());
        assert!(TimeStep::new(origin(), Duration::hours(-1)).is_err());
        assert!(TimeStep::new(origin(), Duration::hours(3)).is_ok());
    }

    #[test]
    fn test_byte_order_policy() {
        assert_eq!(ByteOrderPolicy::Fixed.resolve("0123").unwrap(), Endianness::Little);
        assert_eq!(ByteOrderPolicy::HonorTag.resolve("0123").unwrap(), Endianness::Little);
        assert_eq!(ByteOrderPolicy::HonorTag.resolve("3210").unwrap(), Endianness::Big);
        assert!(ByteOrderPolicy::HonorTag.resolve("xyz").is_err());
        assert!(ByteOrderPolicy::Fixed.resolve("xyz").is_ok());
    }
}
