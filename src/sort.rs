//! Column ordering for the result tables.
//!
//! Each column has a sorter kind. Numeric kinds map a cell's display text to
//! a key; cells whose key cannot be computed sort after every other cell.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

use crate::elements::z_for_symbol;
use crate::format::HOURS_PER_YEAR;

const SECONDS_PER_YEAR: f64 = HOURS_PER_YEAR * 3600.0;

static ISOTOPE_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ *[A-Z][a-z]?-[0-9]+[sm+]* *$").expect("valid regex"));
static HALF_LIFE_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ *[0-9.+\-eE]+ *[kMG]?[smhdy] *$").expect("valid regex"));
static FLOAT_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ *[0-9.+\-eE]+ *$").expect("valid regex"));
static ISOTOPE_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z]+)-([0-9]+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Isotope,
    Text,
    HalfLife,
    Float,
}

impl SortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKind::Isotope => "isotope",
            SortKind::Text => "text",
            SortKind::HalfLife => "half-life",
            SortKind::Float => "float",
        }
    }

    pub fn detect(cell: &str) -> Self {
        if ISOTOPE_CELL.is_match(cell) {
            SortKind::Isotope
        } else if HALF_LIFE_CELL.is_match(cell) {
            SortKind::HalfLife
        } else if FLOAT_CELL.is_match(cell) || cell.trim() == "---" {
            SortKind::Float
        } else {
            SortKind::Text
        }
    }

    /// Numeric key for a cell, `None` for text columns or unparseable cells.
    pub fn key(self, cell: &str) -> Option<f64> {
        match self {
            SortKind::Isotope => parse_isotope(cell),
            SortKind::HalfLife => parse_half_life(cell),
            SortKind::Float => parse_activity(cell),
            SortKind::Text => None,
        }
    }

    /// Order two cells. Cells without a key go last in either direction.
    pub fn compare(self, a: &str, b: &str, order: SortOrder) -> Ordering {
        let directed = |ord: Ordering| match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        };
        match self {
            SortKind::Text => directed(compare_text(a, b)),
            _ => match (self.key(a), self.key(b)) {
                (Some(x), Some(y)) => directed(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// Case-insensitive, with exact text breaking ties. The page script sorts
/// text cells with the same rule.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// `Co-60m` becomes 27.060: atomic number plus mass number / 1000.
pub fn parse_isotope(s: &str) -> Option<f64> {
    let caps = ISOTOPE_PARTS.captures(s)?;
    let z = z_for_symbol(caps.get(1)?.as_str())?;
    let mass: u32 = caps.get(2)?.as_str().parse().ok()?;
    Some(z as f64 + mass as f64 / 1000.0)
}

/// Seconds per half-life unit. The year units are multiples of the 365 day
/// year; `ky` is carried at 100 years as the tables have always sorted it.
fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit {
        "Gy" => 1e9 * SECONDS_PER_YEAR,
        "My" => 1e6 * SECONDS_PER_YEAR,
        "ky" => 100.0 * SECONDS_PER_YEAR,
        "y" | "yrs" => SECONDS_PER_YEAR,
        "d" | "days" => 24.0 * 3600.0,
        "h" | "hrs" => 3600.0,
        "m" | "min" => 60.0,
        "s" | "sec" => 1.0,
        _ => return None,
    };
    Some(seconds)
}

/// Half-life text such as `5.27 y` or `10.5 min` in seconds.
pub fn parse_half_life(s: &str) -> Option<f64> {
    let mut parts = s.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    let unit = unit_seconds(parts.next()?)?;
    Some(value * unit)
}

/// Activity cells; the below-cutoff placeholder sorts as zero.
pub fn parse_activity(s: &str) -> Option<f64> {
    let s = s.trim();
    if s == "---" {
        return Some(0.0);
    }
    s.parse().ok()
}
