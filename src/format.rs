//! Number formatting for the rendered reports.
//!
//! The helpers reproduce the browser's `Number.prototype.toExponential`,
//! `toFixed`, `toPrecision` and number-to-string conversions exactly, so the
//! report text matches what the calculator has always shown. Rounding is done
//! half-up on the exact decimal expansion of the double.

use once_cell::sync::Lazy;
use regex::Regex;

/// Activation calculations use a 365 day year.
pub const HOURS_PER_YEAR: f64 = 365.0 * 24.0;

/// Digits needed to print any finite double without rounding.
const EXACT_PRECISION: usize = 780;

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid regex")
});

/// Significant digits of a finite, non-zero magnitude with the decimal
/// exponent of the first digit.
struct Decimal {
    digits: Vec<u8>,
    exp: i32,
}

impl Decimal {
    fn exact(v: f64) -> Self {
        let text = format!("{:.*e}", EXACT_PRECISION, v.abs());
        let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        let mut digits: Vec<u8> = mantissa
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        while digits.len() > 1 && digits.last() == Some(&0) {
            digits.pop();
        }
        Decimal {
            digits,
            exp: exp.parse().unwrap_or(0),
        }
    }

    /// Keep `keep` significant digits, rounding half away from zero.
    /// A result with no digits means the value rounded to zero.
    fn round(mut self, keep: i64) -> Self {
        if keep < 0 {
            self.digits.clear();
            return self;
        }
        let keep = keep as usize;
        if keep >= self.digits.len() {
            self.digits.resize(keep, 0);
            return self;
        }
        let round_up = self.digits[keep] >= 5;
        self.digits.truncate(keep);
        if round_up {
            let mut idx = keep;
            loop {
                if idx == 0 {
                    self.digits.insert(0, 1);
                    self.exp += 1;
                    if keep > 0 {
                        self.digits.truncate(keep);
                    }
                    break;
                }
                idx -= 1;
                if self.digits[idx] == 9 {
                    self.digits[idx] = 0;
                } else {
                    self.digits[idx] += 1;
                    break;
                }
            }
        }
        self
    }

    fn digit_string(&self) -> String {
        self.digits.iter().map(|d| char::from(b'0' + d)).collect()
    }
}

fn non_finite(v: f64) -> Option<String> {
    if v.is_nan() {
        Some("NaN".to_string())
    } else if v.is_infinite() {
        Some(if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
    } else {
        None
    }
}

fn sign(v: f64) -> &'static str {
    if v < 0.0 {
        "-"
    } else {
        ""
    }
}

fn exponent_suffix(exp: i32) -> String {
    if exp < 0 {
        format!("e-{}", -exp)
    } else {
        format!("e+{exp}")
    }
}

/// `Number.prototype.toExponential(fraction_digits)`.
pub fn to_exponential(v: f64, fraction_digits: usize) -> String {
    if let Some(s) = non_finite(v) {
        return s;
    }
    if v == 0.0 {
        let zeros = "0".repeat(fraction_digits);
        return if fraction_digits == 0 {
            "0e+0".to_string()
        } else {
            format!("0.{zeros}e+0")
        };
    }
    let dec = Decimal::exact(v).round(fraction_digits as i64 + 1);
    let digits = dec.digit_string();
    let (head, tail) = digits.split_at(1);
    let mantissa = if tail.is_empty() {
        head.to_string()
    } else {
        format!("{head}.{tail}")
    };
    format!("{}{}{}", sign(v), mantissa, exponent_suffix(dec.exp))
}

/// `Number.prototype.toFixed(fraction_digits)`.
pub fn to_fixed(v: f64, fraction_digits: usize) -> String {
    if let Some(s) = non_finite(v) {
        return s;
    }
    if v.abs() >= 1e21 {
        return js_number_string(v);
    }
    let f = fraction_digits as i32;
    let dec = if v == 0.0 {
        Decimal {
            digits: Vec::new(),
            exp: 0,
        }
    } else {
        let exact = Decimal::exact(v);
        let keep = exact.exp as i64 + 1 + f as i64;
        exact.round(keep)
    };

    let top = dec.exp.max(0);
    let mut out = String::from(sign(v));
    for pos in (-f..=top).rev() {
        if pos == -1 {
            out.push('.');
        }
        let idx = dec.exp - pos;
        let digit = if idx >= 0 {
            dec.digits.get(idx as usize).copied().unwrap_or(0)
        } else {
            0
        };
        out.push(char::from(b'0' + digit));
    }
    out
}

/// `Number.prototype.toPrecision(precision)`.
pub fn to_precision(v: f64, precision: usize) -> String {
    if let Some(s) = non_finite(v) {
        return s;
    }
    let p = precision.max(1);
    if v == 0.0 {
        return if p == 1 {
            "0".to_string()
        } else {
            format!("0.{}", "0".repeat(p - 1))
        };
    }
    let dec = Decimal::exact(v).round(p as i64);
    let digits = dec.digit_string();
    let e = dec.exp;
    let body = if e < -6 || e >= p as i32 {
        let (head, tail) = digits.split_at(1);
        let mantissa = if tail.is_empty() {
            head.to_string()
        } else {
            format!("{head}.{tail}")
        };
        format!("{mantissa}{}", exponent_suffix(e))
    } else if e == p as i32 - 1 {
        digits
    } else if e >= 0 {
        let (int, frac) = digits.split_at(e as usize + 1);
        format!("{int}.{frac}")
    } else {
        format!("0.{}{}", "0".repeat((-(e + 1)) as usize), digits)
    };
    format!("{}{}", sign(v), body)
}

/// Default number-to-string conversion used when a value is concatenated
/// into text.
pub fn js_number_string(v: f64) -> String {
    if let Some(s) = non_finite(v) {
        return s;
    }
    if v == 0.0 {
        return "0".to_string();
    }
    // `{:e}` gives the shortest round-tripping digits.
    let shortest = format!("{:e}", v.abs());
    let (mantissa, exp) = shortest.split_once('e').unwrap_or((shortest.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = digits.len() as i32;
    let n = exp.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let (head, tail) = digits.split_at(1);
        let mantissa = if tail.is_empty() {
            head.to_string()
        } else {
            format!("{head}.{tail}")
        };
        format!("{mantissa}{}", exponent_suffix(n - 1))
    };
    format!("{}{}", sign(v), body)
}

/// Leading-number parse in the manner of the global `parseFloat`: trailing
/// garbage is ignored and an unparseable string gives NaN.
pub fn parse_float(s: &str) -> f64 {
    let trimmed = s.trim_start();
    match LEADING_FLOAT.find(trimmed) {
        Some(m) => {
            let text = m.as_str().replace("Infinity", "inf");
            text.parse().unwrap_or(f64::NAN)
        }
        None => f64::NAN,
    }
}

/// Whole numbers print without decimals, everything else with one.
pub fn nice_number(v: f64) -> String {
    let rounded = (v + 0.5).floor();
    if (rounded - v).abs() < 0.001 {
        js_number_string(rounded + 0.0)
    } else {
        to_fixed(v, 1)
    }
}

/// Activity in μCi, or `---` when below the display cutoff.
pub fn format_activation_value(v: f64, cutoff: f64) -> String {
    if v < cutoff {
        "---".to_string()
    } else {
        to_exponential(v, 4)
    }
}

pub fn format_mass(v: f64) -> String {
    if v >= 1000.0 {
        format!("{}&thinsp;g", to_fixed(v, 0))
    } else if v >= 1.0 {
        format!("{}&thinsp;g", to_fixed(v, 3))
    } else if v >= 1e-3 {
        format!("{}&thinsp;mg", to_fixed(1e3 * v, 3))
    } else if v >= 1e-6 {
        format!("{}&thinsp;ug", to_fixed(1e6 * v, 3))
    } else if v >= 1e-9 {
        format!("{}&thinsp;ng", to_fixed(1e9 * v, 3))
    } else {
        format!("{}&thinsp;ng", to_exponential(1e9 * v, 4))
    }
}

pub fn format_time(v: f64) -> String {
    if v >= HOURS_PER_YEAR {
        format!("{} yrs", nice_number(v / HOURS_PER_YEAR))
    } else if v >= 48.0 || v == 24.0 {
        format!("{} days", nice_number(v / 24.0))
    } else if v >= 2.0 || v == 1.0 {
        format!("{} hrs", nice_number(v))
    } else if v >= 2.0 / 60.0 || v == 1.0 / 60.0 {
        format!("{} min", nice_number(v * 60.0))
    } else {
        format!("{} sec", to_precision(v * 3600.0, 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_matches_browser_output() {
        assert_eq!(to_exponential(1234.0, 4), "1.2340e+3");
        assert_eq!(to_exponential(0.000123456, 4), "1.2346e-4");
        assert_eq!(to_exponential(0.0, 4), "0.0000e+0");
        assert_eq!(to_exponential(-5.0, 2), "-5.00e+0");
        assert_eq!(to_exponential(9.99996, 4), "1.0000e+1");
        // exact ties round away from zero
        assert_eq!(to_exponential(1.25, 1), "1.3e+0");
        assert_eq!(to_exponential(f64::NAN, 4), "NaN");
    }

    #[test]
    fn fixed_matches_browser_output() {
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(0.0006, 3), "0.001");
        assert_eq!(to_fixed(0.0004, 3), "0.000");
        assert_eq!(to_fixed(123.456, 1), "123.5");
        assert_eq!(to_fixed(999.96, 1), "1000.0");
        assert_eq!(to_fixed(-0.0001, 3), "-0.000");
        assert_eq!(to_fixed(-0.0, 2), "0.00");
        assert_eq!(to_fixed(1500.0, 0), "1500");
    }

    #[test]
    fn precision_switches_notation_like_browser() {
        assert_eq!(to_precision(1.5, 3), "1.50");
        assert_eq!(to_precision(123456.0, 3), "1.23e+5");
        assert_eq!(to_precision(0.000001234, 3), "0.00000123");
        assert_eq!(to_precision(0.0000001234, 3), "1.23e-7");
        assert_eq!(to_precision(99.96, 3), "100");
        assert_eq!(to_precision(0.0, 3), "0.00");
        assert_eq!(to_precision(100000.0, 4), "1.000e+5");
    }

    #[test]
    fn number_string_matches_browser_output() {
        assert_eq!(js_number_string(30.0), "30");
        assert_eq!(js_number_string(0.5), "0.5");
        assert_eq!(js_number_string(1e-7), "1e-7");
        assert_eq!(js_number_string(1e21), "1e+21");
        assert_eq!(js_number_string(123456.789), "123456.789");
        assert_eq!(js_number_string(-0.0), "0");
    }

    #[test]
    fn parse_float_reads_leading_number() {
        assert_eq!(parse_float("1e5"), 1e5);
        assert_eq!(parse_float("  2.5 n/cm2/s"), 2.5);
        assert_eq!(parse_float(".5"), 0.5);
        assert!(parse_float("flux").is_nan());
        assert!(parse_float("").is_nan());
    }

    #[test]
    fn activation_value_dashes_below_cutoff() {
        assert_eq!(format_activation_value(0.0004, 0.0005), "---");
        assert_eq!(format_activation_value(0.0005, 0.0005), "5.0000e-4");
        assert_eq!(format_activation_value(0.0, 0.0), "0.0000e+0");
    }

    #[test]
    fn mass_tiers_are_closed_below() {
        assert_eq!(format_mass(1000.0), "1000&thinsp;g");
        assert_eq!(format_mass(1.0), "1.000&thinsp;g");
        assert_eq!(format_mass(0.999), "999.000&thinsp;mg");
        assert_eq!(format_mass(1e-3), "1.000&thinsp;mg");
        assert_eq!(format_mass(1e-6), "1.000&thinsp;ug");
        assert_eq!(format_mass(1e-9), "1.000&thinsp;ng");
        assert_eq!(format_mass(2.5e-12), "2.5000e-3&thinsp;ng");
    }

    #[test]
    fn time_picks_unit_tier() {
        assert_eq!(format_time(8760.0), "1 yrs");
        assert_eq!(format_time(13140.0), "1.5 yrs");
        assert_eq!(format_time(360.0), "15 days");
        assert_eq!(format_time(24.0), "1 days");
        assert_eq!(format_time(30.0), "30 hrs");
        assert_eq!(format_time(1.0), "1 hrs");
        assert_eq!(format_time(1.5), "90 min");
        assert_eq!(format_time(1.0 / 60.0), "1 min");
        assert_eq!(format_time(0.01), "36.0 sec");
        assert_eq!(format_time(0.0), "0.00 sec");
    }

    #[test]
    fn nice_number_snaps_near_integers() {
        assert_eq!(nice_number(2.0004), "2");
        assert_eq!(nice_number(2.25), "2.3");
        assert_eq!(nice_number(0.0), "0");
    }
}
