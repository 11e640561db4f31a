//! Flattened observation summaries for scheduling queries.
//!
//! The summarizer walks a schedulable block, simulating component
//! inheritance, and produces one [`ObsSummary`] per observation plus a
//! single merged [`MsbSummary`] that an external query layer matches
//! against the night's conditions.

pub mod instruments;
pub mod target;
pub mod walk;


pub use instruments::{summarize_instrument, InstrumentSummary, MODE_IMAGING, MODE_SPECTROSCOPY};
pub use target::{resolve_target, ResolvedTarget};

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;

use crate::program::{Priority, SchedulingWindowComponent, SiteQualityComponent};

/// Sentinel substituted when a merged field has no value at all.
pub const NONE_STRING: &str = "NONE";

/// Sentinel cloud/moon value meaning "no constraint".
pub const DONT_CARE: i32 = 101;

/// Coordinate type of a synthesized calibration target.
pub const CALIBRATION: &str = "CALIBRATION";

static FAR_PAST: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(1971, 1, 1, 0, 0, 0).unwrap());
static FAR_FUTURE: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap());

/// Site-quality constraints with "don't care" defaults filled in.
///
/// # Examples
///
/// ```
/// use omp_msb::summary::SiteQuality;
///
/// let sq = SiteQuality::default();
/// assert_eq!(sq.cloud, 101);
/// assert_eq!(sq.tau_min, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SiteQuality {
    pub tau_min: f64,
    pub tau_max: f64,
    pub seeing_min: f64,
    pub seeing_max: f64,
    pub cloud: i32,
    pub moon: i32,
}

impl Default for SiteQuality {
    fn default() -> Self {
        SiteQuality {
            tau_min: 0.0,
            tau_max: f64::INFINITY,
            seeing_min: 0.0,
            seeing_max: f64::INFINITY,
            cloud: DONT_CARE,
            moon: DONT_CARE,
        }
    }
}

impl SiteQualityComponent {
    /// Fills unset bounds with the unconstrained defaults.
    pub fn to_quality(&self) -> SiteQuality {
        SiteQuality {
            tau_min: self.tau_min.unwrap_or(0.0),
            tau_max: self.tau_max.unwrap_or(f64::INFINITY),
            seeing_min: self.seeing_min.unwrap_or(0.0),
            seeing_max: self.seeing_max.unwrap_or(f64::INFINITY),
            cloud: self.cloud.unwrap_or(DONT_CARE),
            moon: self.moon.unwrap_or(DONT_CARE),
        }
    }
}

/// Scheduling window, defaulting to an effectively unbounded range.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SchedulingWindow {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl Default for SchedulingWindow {
    fn default() -> Self {
        SchedulingWindow {
            earliest: *FAR_PAST,
            latest: *FAR_FUTURE,
        }
    }
}

impl SchedulingWindowComponent {
    pub fn to_window(&self) -> SchedulingWindow {
        SchedulingWindow {
            earliest: self.earliest.unwrap_or(*FAR_PAST),
            latest: self.latest.unwrap_or(*FAR_FUTURE),
        }
    }
}

/// Summary of a single observation inside a block.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ObsSummary {
    pub telescope: Option<String>,
    pub instrument: Option<String>,
    pub target: String,
    /// Coordinate type; `CALIBRATION` for a synthesized target.
    pub coordstype: String,
    pub waveband: Option<String>,
    pub disperser: Option<String>,
    pub pol: bool,
    pub mode: Option<String>,
    /// Every distinct observe action encountered, in discovery order.
    pub obstypes: Vec<String>,
}

/// Merged, queryable summary of one schedulable block.
///
/// String fields holding per-observation values are merged by joining the
/// distinct values with `/` in first-discovery order, so a block observing
/// with two cameras reads `"CGS4/UFTI"` rather than hiding one of them.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MsbSummary {
    pub checksum: String,
    pub project_id: Option<String>,
    pub title: String,
    pub priority: Priority,
    pub remaining: i64,
    pub estimated_seconds: f64,
    pub telescope: String,
    pub instrument: String,
    pub target: String,
    pub coordstype: String,
    pub waveband: String,
    pub disperser: String,
    pub pol: bool,
    pub mode: String,
    pub obstypes: Vec<String>,
    pub site_quality: SiteQuality,
    pub scheduling_window: SchedulingWindow,
    pub observations: Vec<ObsSummary>,
}

/// Joins distinct values with `/` in first-discovery order, substituting
/// [`NONE_STRING`] for absent values.
pub(crate) fn join_distinct<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        let value = value.unwrap_or(NONE_STRING);
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    if seen.is_empty() {
        return NONE_STRING.to_string();
    }
    seen.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_distinct_discovery_order() {
        let joined = join_distinct(vec![Some("CGS4"), Some("UFTI"), Some("CGS4")]);
        assert_eq!(joined, "CGS4/UFTI");
    }

    #[test]
    fn test_join_distinct_substitutes_none() {
        assert_eq!(join_distinct(vec![None, Some("K98")]), "NONE/K98");
        assert_eq!(join_distinct(Vec::<Option<&str>>::new()), "NONE");
    }

    #[test]
    fn test_window_defaults_are_unbounded() {
        let w = SchedulingWindow::default();
        assert!(w.earliest < Utc::now());
        assert!(w.latest > Utc::now());
    }
}
