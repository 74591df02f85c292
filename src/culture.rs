//! Culture-sensitive number literals.
//!
//! A [`Culture`] decides the decimal separator and digit-grouping separator used when
//! numbers are written as text, and accepted when text is read back. Dates are always
//! written in ISO 8601 unless a column or option format says otherwise, so they do not
//! depend on the culture.
//!
//! Column formats support a small numeric subset:
//!
//! | Format | Meaning | `1234.5` under `it-IT` |
//! |--------|---------|------------------------|
//! | (none) | shortest round-trip text | `1234,5` |
//! | `F<n>` | exactly `n` decimals | `F2` → `1234,50` |
//! | `N<n>` | `n` decimals plus digit grouping | `N2` → `1.234,50` |
//!
//! ```rust
//! use colspec::Culture;
//!
//! let italian = Culture::from_name("it-IT").unwrap();
//! assert_eq!(italian.format_f64(12.34, None), "12,34");
//! assert_eq!(italian.parse_f64("12,34", None), Some(12.34));
//! assert_eq!(italian.format_f64(1234.5, Some("N2")), "1.234,50");
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

/// Number formatting conventions of a locale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Culture {
    name: String,
    decimal_separator: char,
    group_separator: char,
}

// name, decimal separator, group separator
const KNOWN: &[(&str, char, char)] = &[
    ("", '.', ','),
    ("en", '.', ','),
    ("en-US", '.', ','),
    ("en-GB", '.', ','),
    ("ja-JP", '.', ','),
    ("zh-CN", '.', ','),
    ("de", ',', '.'),
    ("de-DE", ',', '.'),
    ("es-ES", ',', '.'),
    ("it", ',', '.'),
    ("it-IT", ',', '.'),
    ("nl-NL", ',', '.'),
    ("pt-BR", ',', '.'),
    ("fr", ',', '\u{202f}'),
    ("fr-FR", ',', '\u{202f}'),
    ("ru-RU", ',', '\u{a0}'),
    ("de-CH", '.', '\''),
];

impl Default for Culture {
    fn default() -> Self {
        Culture::invariant()
    }
}

impl Culture {
    /// The culture-independent convention: `.` decimals, `,` grouping.
    #[must_use]
    pub fn invariant() -> Self {
        Culture::custom("", '.', ',')
    }

    /// Looks up a culture by its language tag, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN
            .iter()
            .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
            .map(|(n, d, g)| Culture::custom(n, *d, *g))
    }

    /// Builds a culture with explicit separators.
    #[must_use]
    pub fn custom(name: &str, decimal_separator: char, group_separator: char) -> Self {
        Culture {
            name: name.to_string(),
            decimal_separator,
            group_separator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn group_separator(&self) -> char {
        self.group_separator
    }

    pub fn format_i64(&self, value: i64, format: Option<&str>) -> String {
        let digits = value.to_string();
        match NumberFormat::parse(format) {
            NumberFormat::General => digits,
            NumberFormat::Fixed { decimals, grouped } => {
                let mut text = if grouped {
                    self.group(&digits)
                } else {
                    digits
                };
                if decimals > 0 {
                    text.push(self.decimal_separator);
                    text.extend(std::iter::repeat('0').take(decimals));
                }
                text
            }
        }
    }

    pub fn format_f64(&self, value: f64, format: Option<&str>) -> String {
        if let Some(special) = special_text(value.is_nan(), value.is_infinite(), value < 0.0) {
            return special.to_string();
        }
        match NumberFormat::parse(format) {
            NumberFormat::General => self.localize(&value.to_string(), false),
            NumberFormat::Fixed { decimals, grouped } => {
                self.localize(&format!("{:.*}", decimals, value), grouped)
            }
        }
    }

    pub fn format_f32(&self, value: f32, format: Option<&str>) -> String {
        if let Some(special) = special_text(value.is_nan(), value.is_infinite(), value < 0.0) {
            return special.to_string();
        }
        match NumberFormat::parse(format) {
            NumberFormat::General => self.localize(&value.to_string(), false),
            NumberFormat::Fixed { decimals, grouped } => {
                self.localize(&format!("{:.*}", decimals, value), grouped)
            }
        }
    }

    pub fn format_decimal(&self, value: &Decimal, format: Option<&str>) -> String {
        match NumberFormat::parse(format) {
            NumberFormat::General => self.localize(&value.to_string(), false),
            NumberFormat::Fixed { decimals, grouped } => {
                let rounded = value.round_dp(decimals as u32);
                self.localize(&format!("{:.*}", decimals, rounded), grouped)
            }
        }
    }

    pub fn parse_i64(&self, text: &str, format: Option<&str>) -> Option<i64> {
        let normalized = self.normalize(text, format)?;
        // Fixed formats write integers with a zero fraction.
        let integral = match normalized.split_once('.') {
            Some((int, frac)) if frac.bytes().all(|b| b == b'0') => int,
            Some(_) => return None,
            None => normalized.as_str(),
        };
        integral.parse().ok()
    }

    pub fn parse_f64(&self, text: &str, format: Option<&str>) -> Option<f64> {
        let normalized = self.normalize(text, format)?;
        parse_special(&normalized).or_else(|| normalized.parse().ok())
    }

    pub fn parse_f32(&self, text: &str, format: Option<&str>) -> Option<f32> {
        let normalized = self.normalize(text, format)?;
        parse_special(&normalized)
            .map(|v| v as f32)
            .or_else(|| normalized.parse().ok())
    }

    pub fn parse_decimal(&self, text: &str, format: Option<&str>) -> Option<Decimal> {
        let normalized = self.normalize(text, format)?;
        Decimal::from_str(&normalized)
            .or_else(|_| Decimal::from_scientific(&normalized))
            .ok()
    }

    /// Rewrites invariant number text (`-1234.5`) in this culture's conventions.
    fn localize(&self, invariant: &str, grouped: bool) -> String {
        let (int_part, frac_part) = match invariant.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (invariant, None),
        };
        let mut text = if grouped {
            self.group(int_part)
        } else {
            int_part.to_string()
        };
        if let Some(frac) = frac_part {
            text.push(self.decimal_separator);
            text.push_str(frac);
        }
        text
    }

    fn group(&self, int_part: &str) -> String {
        let (sign, digits) = match int_part.strip_prefix('-') {
            Some(d) => ("-", d),
            None => ("", int_part),
        };
        let mut text = String::with_capacity(int_part.len() + digits.len() / 3);
        text.push_str(sign);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                text.push(self.group_separator);
            }
            text.push(ch);
        }
        text
    }

    /// Converts culture text back to invariant text; group separators are only
    /// accepted for grouped formats.
    fn normalize(&self, text: &str, format: Option<&str>) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let grouped = matches!(
            NumberFormat::parse(format),
            NumberFormat::Fixed { grouped: true, .. }
        );
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            if ch == self.decimal_separator {
                out.push('.');
            } else if grouped && ch == self.group_separator {
                continue;
            } else {
                out.push(ch);
            }
        }
        Some(out)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NumberFormat {
    General,
    Fixed { decimals: usize, grouped: bool },
}

impl NumberFormat {
    /// Widest `F<n>`/`N<n>` precision; wider requests fall back to general formatting.
    const MAX_DECIMALS: usize = 99;

    fn parse(format: Option<&str>) -> Self {
        let mut chars = match format {
            Some(f) => f.chars(),
            None => return NumberFormat::General,
        };
        let grouped = match chars.next() {
            Some('F' | 'f') => false,
            Some('N' | 'n') => true,
            _ => return NumberFormat::General,
        };
        let digits = chars.as_str();
        let decimals = if digits.is_empty() {
            2
        } else {
            match digits.parse() {
                Ok(d) if d <= Self::MAX_DECIMALS => d,
                _ => return NumberFormat::General,
            }
        };
        NumberFormat::Fixed { decimals, grouped }
    }
}

fn special_text(nan: bool, infinite: bool, negative: bool) -> Option<&'static str> {
    match (nan, infinite, negative) {
        (true, _, _) => Some("NaN"),
        (_, true, true) => Some("-Infinity"),
        (_, true, false) => Some("Infinity"),
        _ => None,
    }
}

fn parse_special(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" | "\u{221e}" => Some(f64::INFINITY),
        "-Infinity" | "-\u{221e}" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_round_trip() {
        let c = Culture::invariant();
        for v in [0.0, -1.5, 12.34, 1e-7, 123456789.125, f64::MAX] {
            let text = c.format_f64(v, None);
            assert_eq!(c.parse_f64(&text, None), Some(v), "{}", text);
        }
    }

    #[test]
    fn test_comma_decimal_culture() {
        let de = Culture::from_name("de-DE").unwrap();
        assert_eq!(de.format_f64(-0.5, None), "-0,5");
        assert_eq!(de.parse_f64("-0,5", None), Some(-0.5));
        assert_eq!(de.format_decimal(&Decimal::new(1234, 2), None), "12,34");
    }

    #[test]
    fn test_grouped_format() {
        let en = Culture::from_name("en-us").unwrap();
        assert_eq!(en.format_f64(1234567.891, Some("N2")), "1,234,567.89");
        assert_eq!(en.parse_f64("1,234,567.89", Some("N2")), Some(1234567.89));
        // grouping is rejected without a grouped format
        assert_eq!(en.parse_f64("1,234", None), None);
        assert_eq!(en.format_i64(-1234, Some("N0")), "-1,234");
        assert_eq!(en.parse_i64("-1,234", Some("N0")), Some(-1234));
    }

    #[test]
    fn test_fixed_integer() {
        let c = Culture::invariant();
        assert_eq!(c.format_i64(7, Some("F2")), "7.00");
        assert_eq!(c.parse_i64("7.00", Some("F2")), Some(7));
        assert_eq!(c.parse_i64("7.50", Some("F2")), None);
    }

    #[test]
    fn test_special_values() {
        let c = Culture::invariant();
        assert_eq!(c.format_f64(f64::INFINITY, None), "Infinity");
        assert_eq!(c.format_f64(f64::NEG_INFINITY, None), "-Infinity");
        assert!(c.parse_f64("NaN", None).unwrap().is_nan());
        assert_eq!(c.parse_f64("-Infinity", None), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_non_ascii_format_is_general() {
        let c = Culture::invariant();
        assert_eq!(c.format_f64(1.5, Some("\u{20ac}")), "1.5");
        assert_eq!(c.format_i64(3, Some("\u{e9}2")), "3");
        assert_eq!(c.parse_f64("1.5", Some("\u{20ac}")), Some(1.5));
    }

    #[test]
    fn test_precision_is_bounded() {
        let c = Culture::invariant();
        assert_eq!(c.format_f64(2.5, Some("F4000000000")), "2.5");
        assert_eq!(c.format_i64(7, Some("N100")), "7");
        assert_eq!(c.format_i64(7, Some("F99")).len(), 101);
    }

    #[test]
    fn test_unknown_culture() {
        assert!(Culture::from_name("xx-YY").is_none());
    }
}
