// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// A calendar month. The monthly datasets are keyed by it and it is always
/// written out as `YYYY-MM`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<YearMonth, RiskErrors> {
        if !(1..=12).contains(&month) {
            return Err(RiskErrors::InvalidMonth(format!("{}-{}", year, month)));
        }
        Ok(YearMonth { year, month })
    }

    // Only for the compile-time tables, where the month is known to be valid.
    pub(crate) const fn new_unchecked(year: i32, month: u32) -> YearMonth {
        YearMonth { year, month }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month right after this one.
    pub fn succ(&self) -> YearMonth {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// All the months from `start` to `end`, both included. Empty if `start`
    /// comes after `end`.
    pub fn range_inclusive(start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
        let mut res: Vec<YearMonth> = Vec::new();
        let mut cur = start;
        while cur <= end {
            res.push(cur);
            cur = cur.succ();
        }
        res
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = RiskErrors;

    /// Accepts `YYYY-MM`, and also a full `YYYY-MM-DD` date since some exports
    /// store the month as the first day of the month.
    fn from_str(s: &str) -> Result<YearMonth, RiskErrors> {
        let invalid = || RiskErrors::InvalidMonth(s.to_string());
        let parts: Vec<&str> = s.trim().split('-').collect();
        let (y, m) = match parts.as_slice() {
            [y, m] => (y, m),
            [y, m, d] if !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()) => (y, m),
            _ => return Err(invalid()),
        };
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year = y.parse::<i32>().map_err(|_| invalid())?;
        let month = m.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

/// The number of editors, as found in the source data.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum EditorCount {
    /// A published count.
    Count(u64),
    /// The source explicitly marked this count as withheld (`-1`).
    Withheld,
    /// The source value could not be understood as a count.
    Missing,
}

impl EditorCount {
    pub const WITHHELD_SENTINEL: i64 = -1;

    /// Coerces a raw field. Anything that is not a non-negative integer or the
    /// `-1` sentinel becomes `Missing`.
    pub fn parse(raw: &str) -> EditorCount {
        let s = raw.trim();
        let value: Option<i64> = match s.parse::<i64>() {
            Ok(x) => Some(x),
            // Integer-valued floats, as written by some dataframe exports.
            Err(_) => match s.parse::<f64>() {
                Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
                _ => None,
            },
        };
        match value {
            Some(Self::WITHHELD_SENTINEL) => EditorCount::Withheld,
            Some(x) if x >= 0 => EditorCount::Count(x as u64),
            _ => EditorCount::Missing,
        }
    }

    /// The published count, if there is one.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            EditorCount::Count(x) => Some(*x),
            _ => None,
        }
    }

    /// The raw representation, used when writing rows back out.
    pub fn to_raw(&self) -> String {
        match self {
            EditorCount::Count(x) => x.to_string(),
            EditorCount::Withheld => Self::WITHHELD_SENTINEL.to_string(),
            EditorCount::Missing => "".to_string(),
        }
    }
}

/// One row of the monthly geoeditors dataset.
///
/// The auxiliary columns (`count_eps`, `sum_eps`, `count_release_thresh`,
/// `edits`) are not used by the classification, they are kept so that a row
/// can be written back unchanged. Unparseable auxiliary values are `None`.
#[derive(PartialEq, Debug, Clone)]
pub struct EditorCountRow {
    pub wiki_db: String,
    pub project: String,
    pub country: String,
    pub country_code: String,
    pub activity_level: String,
    pub count_eps: Option<u64>,
    pub sum_eps: Option<f64>,
    pub count_release_thresh: Option<u64>,
    pub editors: EditorCount,
    pub edits: Option<u64>,
    pub month: YearMonth,
}

// ******** Output data structures *********

/// How strictly the editor counts of a country are redacted.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    NotPublished,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::NotPublished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::NotPublished => "not_published",
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The display properties attached to a risk level.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct RiskInfo {
    /// The radius of the 95% confidence interval shown around a count.
    pub ci_radius: Option<f64>,
    pub can_show_edits: bool,
}

/// Why a count is not shown.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum WithheldReason {
    /// The country is not published at all.
    CountryPolicy,
    /// The source row carried the `-1` sentinel.
    SourceSentinel,
    /// The source value was not a number.
    NonNumeric,
}

/// The editor value that is safe to present.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum DisplayEditors {
    Count(u64),
    Withheld(WithheldReason),
}

impl DisplayEditors {
    pub fn is_withheld(&self) -> bool {
        matches!(self, DisplayEditors::Withheld(_))
    }

    /// The value used to order and plot: the count, or -1 when withheld.
    pub fn plot_value(&self) -> i64 {
        match self {
            DisplayEditors::Count(x) => *x as i64,
            DisplayEditors::Withheld(_) => EditorCount::WITHHELD_SENTINEL,
        }
    }
}

/// A row after classification and redaction.
#[derive(PartialEq, Debug, Clone)]
pub struct ClassifiedRow {
    pub row: EditorCountRow,
    pub risk_level: RiskLevel,
    pub display_editors: DisplayEditors,
    /// `None` exactly when the country is not published.
    pub confidence_interval: Option<f64>,
}

/// Errors raised while building the reference tables.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RiskErrors {
    InvalidMonth(String),
    OverlappingRiskSets {
        code: String,
        first: RiskLevel,
        second: RiskLevel,
    },
}

impl Error for RiskErrors {}

impl Display for RiskErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskErrors::InvalidMonth(s) => write!(f, "invalid month {:?}, expected YYYY-MM", s),
            RiskErrors::OverlappingRiskSets {
                code,
                first,
                second,
            } => write!(
                f,
                "country code {} is listed both as {} and {}",
                code, first, second
            ),
        }
    }
}
