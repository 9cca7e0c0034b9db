//! Locale-aware number parsing for published scores.

use crate::model::RawValue;

/// Converts a published cell to `f64`.
///
/// Numbers pass through. Text has its first comma replaced by a period and
/// its leading decimal literal is parsed, so trailing units such as `" pt"`
/// are ignored. Anything without a finite leading number yields `NaN`, never
/// an error.
pub fn to_number(raw: &RawValue) -> f64 {
    match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => leading_number(&s.replacen(',', ".", 1)).unwrap_or(f64::NAN),
        RawValue::Missing => f64::NAN,
    }
}

/// Like [`to_number`] but maps `NaN` to `None`.
pub fn parse_score(raw: &RawValue) -> Option<f64> {
    let n = to_number(raw);
    if n.is_nan() { None } else { Some(n) }
}

/// Parses the longest `[+-]digits[.digits][e[+-]digits]` prefix of `s`.
///
/// Words like `inf` or `NaN` are not digits and never match.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_decimal() {
        assert_eq!(to_number(&"12,5".into()), 12.5);
    }

    #[test]
    fn test_period_decimal() {
        assert_eq!(to_number(&"12.5".into()), 12.5);
    }

    #[test]
    fn test_numeric_passthrough() {
        assert_eq!(to_number(&RawValue::Number(87.0)), 87.0);
    }

    #[test]
    fn test_garbage_is_nan() {
        assert!(to_number(&"abc".into()).is_nan());
        assert!(to_number(&"".into()).is_nan());
        assert!(to_number(&"-".into()).is_nan());
        assert!(to_number(&RawValue::Missing).is_nan());
        assert_eq!(parse_score(&"abc".into()), None);
    }

    #[test]
    fn test_non_finite_words_are_nan() {
        for text in ["inf", "Infinity", "-inf", "NaN", "nan"] {
            assert!(to_number(&text.into()).is_nan(), "{text}");
        }
        assert!(to_number(&"1e999".into()).is_nan());
    }

    #[test]
    fn test_trailing_text_is_ignored() {
        assert_eq!(to_number(&"80,5 pt".into()), 80.5);
        assert_eq!(to_number(&"  72 punti".into()), 72.0);
        assert_eq!(to_number(&"-3,25".into()), -3.25);
        assert_eq!(to_number(&"1,5e2x".into()), 150.0);
        assert_eq!(to_number(&"7e".into()), 7.0);
    }

    #[test]
    fn test_only_first_comma_replaced() {
        assert_eq!(to_number(&"1,2,3".into()), 1.2);
    }
}
