//! Range Text Parsing
//!
//! Parses the range strings printed on lab reports ("30-80", "6.0–7.0",
//! "≥0.9", ">0.2-<1.2") into a [`Threshold`]. The separator is the first
//! dash that follows a digit, so signed bounds such as "-5--2" parse as
//! `[-5, -2]` rather than splitting on every dash.

use super::Threshold;
use crate::classify::ClassifyError;

/// Which side a single-sided range constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Floor,
    Ceiling,
}

/// Parse range text into a [`Threshold`]
///
/// Accepted forms:
/// - `a-b`, `a–b`, `a — b`, `a to b` (either bound may be negative)
/// - `≥a`, `>=a`, `>a` (floor only)
/// - `≤b`, `<=b`, `<b` (ceiling only)
/// - `>a-<b` (decorated two-sided)
///
/// Comparison marks are treated as inclusive; the table has no strict bounds.
pub fn parse_range(text: &str) -> Result<Threshold, ClassifyError> {
    let malformed = || ClassifyError::MalformedRange(text.to_string());

    let normalized: Vec<char> = normalize(text).chars().collect();
    if normalized.is_empty() {
        return Err(malformed());
    }

    match find_separator(&normalized) {
        Some(idx) => {
            let left: String = normalized[..idx].iter().collect();
            let right: String = normalized[idx + 1..].iter().collect();

            // A ceiling mark on the lower bound (or floor on the upper) is contradictory
            let (lower, upper) = match (parse_bound(&left), parse_bound(&right)) {
                (
                    Some((None | Some(Side::Floor), lower)),
                    Some((None | Some(Side::Ceiling), upper)),
                ) => (lower, upper),
                _ => return Err(malformed()),
            };
            Threshold::new(lower, upper)
        }
        None => {
            let whole: String = normalized.iter().collect();
            match parse_bound(&whole).ok_or_else(malformed)? {
                (Some(Side::Floor), v) => Threshold::at_least(v),
                (Some(Side::Ceiling), v) => Threshold::at_most(v),
                // A bare number is a reading, not a range
                (None, _) => Err(malformed()),
            }
        }
    }
}

/// Lowercase, unify dash variants, turn "to" into a dash, drop whitespace
fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(" to ", "-")
        .chars()
        .map(|c| match c {
            '–' | '—' | '−' => '-',
            other => other,
        })
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Index of the dash separating two bounds: the first '-' preceded by a
/// digit or decimal point.
fn find_separator(chars: &[char]) -> Option<usize> {
    (1..chars.len()).find(|&i| chars[i] == '-' && (chars[i - 1].is_ascii_digit() || chars[i - 1] == '.'))
}

/// Parse one bound with an optional comparison prefix
fn parse_bound(text: &str) -> Option<(Option<Side>, f64)> {
    const PREFIXES: &[(&str, Side)] = &[
        (">=", Side::Floor),
        ("≥", Side::Floor),
        (">", Side::Floor),
        ("<=", Side::Ceiling),
        ("≤", Side::Ceiling),
        ("<", Side::Ceiling),
    ];

    let (side, rest) = PREFIXES
        .iter()
        .find_map(|(prefix, side)| text.strip_prefix(prefix).map(|rest| (Some(*side), rest)))
        .unwrap_or((None, text));

    let value: f64 = rest.parse().ok()?;
    value.is_finite().then_some((side, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plain_ranges() {
        let t = parse_range("30-80").unwrap();
        assert_relative_eq!(t.lower(), 30.0);
        assert_relative_eq!(t.upper(), 80.0);

        let t = parse_range("6.0–7.0").unwrap();
        assert_relative_eq!(t.lower(), 6.0);
        assert_relative_eq!(t.upper(), 7.0);

        let t = parse_range(" 0.02 - 0.07 ").unwrap();
        assert_relative_eq!(t.lower(), 0.02);
        assert_relative_eq!(t.upper(), 0.07);

        let t = parse_range("10 to 14").unwrap();
        assert_relative_eq!(t.lower(), 10.0);
        assert_relative_eq!(t.upper(), 14.0);
    }

    #[test]
    fn test_negative_bounds() {
        let t = parse_range("-5--2").unwrap();
        assert_relative_eq!(t.lower(), -5.0);
        assert_relative_eq!(t.upper(), -2.0);

        let t = parse_range("-30-80").unwrap();
        assert_relative_eq!(t.lower(), -30.0);
        assert_relative_eq!(t.upper(), 80.0);

        let t = parse_range("-1.5 to 2").unwrap();
        assert_relative_eq!(t.lower(), -1.5);
        assert_relative_eq!(t.upper(), 2.0);
    }

    #[test]
    fn test_one_sided() {
        let t = parse_range("≥0.9").unwrap();
        assert_relative_eq!(t.lower(), 0.9);
        assert!(!t.has_upper_bound());

        let t = parse_range(">0.85").unwrap();
        assert_relative_eq!(t.lower(), 0.85);
        assert!(!t.has_upper_bound());

        let t = parse_range("<=1.2").unwrap();
        assert!(!t.has_lower_bound());
        assert_relative_eq!(t.upper(), 1.2);
    }

    #[test]
    fn test_decorated_two_sided() {
        let t = parse_range(">0.2-<1.2").unwrap();
        assert_relative_eq!(t.lower(), 0.2);
        assert_relative_eq!(t.upper(), 1.2);

        let t = parse_range(">=1-<=2").unwrap();
        assert_relative_eq!(t.lower(), 1.0);
        assert_relative_eq!(t.upper(), 2.0);
    }

    #[test]
    fn test_contradictory_marks() {
        for text in ["<5-10", "≥1-≥2", "5->10", "≤1-≤2"] {
            assert!(
                matches!(parse_range(text), Err(ClassifyError::MalformedRange(_))),
                "expected malformed for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["30-80", "≥0.9", "≤1.2", "0.02-0.07"] {
            assert_eq!(parse_range(text).unwrap().display(), text);
        }
    }

    #[test]
    fn test_malformed() {
        for text in ["", "abc", "30-", "-80x", "30-80-90", "5", "inf-NaN", "1e400-2"] {
            assert!(
                matches!(parse_range(text), Err(ClassifyError::MalformedRange(_))),
                "expected malformed for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_inverted() {
        assert!(matches!(
            parse_range("80-30"),
            Err(ClassifyError::InvertedRange { .. })
        ));
    }
}
