//! Decimal-string conversion with per-field failure isolation
//!
//! Every numeric field Cost Explorer returns is a decimal string. A field that
//! does not parse is logged, flags the fetch span as failed and is skipped;
//! its siblings are still published.

use pac_common::ConversionError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{warn, Span};

/// Significant digits a [`Decimal`] holds without rounding
const DECIMAL_DIGITS: usize = 28;

/// Parse a provider decimal string into an `f64`
///
/// Accepts plain (`"42.50"`) and scientific (`"1.5E-3"`) notation. Plain
/// strings that fit in a [`Decimal`] are converted through it; longer ones and
/// scientific notation are parsed straight to `f64` so that neither range nor
/// scale is lost. Missing, blank, padded and non-numeric input is rejected,
/// and so are `NaN` and infinities, which are not decimals.
pub fn parse_decimal(field: &'static str, raw: Option<&str>) -> Result<f64, ConversionError> {
    let fail = || ConversionError {
        field,
        raw: raw.unwrap_or_default().to_string(),
    };

    let text = raw.unwrap_or_default();
    if text.is_empty() {
        return Err(fail());
    }

    let plain = text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+'));
    let digits = text.bytes().filter(u8::is_ascii_digit).count();
    let exact = if plain && digits <= DECIMAL_DIGITS {
        Decimal::from_str(text).ok().and_then(|d| d.to_f64())
    } else {
        None
    };

    let value = match exact {
        Some(value) => value,
        None => f64::from_str(text).map_err(|_| fail())?,
    };
    if !value.is_finite() {
        return Err(fail());
    }
    Ok(value)
}

/// Status recorded on a fetch span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error,
}

/// Applies the parse-or-skip policy for one fetch and tracks its span status
///
/// The span must declare `otel.status_code` and `otel.status_message` fields.
#[derive(Debug)]
pub struct FieldPublisher {
    span: Span,
    status: SpanStatus,
    published: usize,
    skipped: usize,
}

impl FieldPublisher {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            status: SpanStatus::Unset,
            published: 0,
            skipped: 0,
        }
    }

    /// Parse `raw` and hand the value to `set`, or warn and skip the field
    ///
    /// Returns whether the value was published.
    pub fn publish<F>(&mut self, field: &'static str, raw: Option<&str>, set: F) -> bool
    where
        F: FnOnce(f64),
    {
        match parse_decimal(field, raw) {
            Ok(value) => {
                set(value);
                self.published += 1;
                true
            }
            Err(err) => {
                warn!(field = err.field, raw = %err.raw, "Cannot convert to float");
                self.mark_error(&format!("Error while computing {}", field));
                self.skipped += 1;
                false
            }
        }
    }

    /// Record a failed status on the span
    pub fn mark_error(&mut self, message: &str) {
        self.span.record("otel.status_code", "ERROR");
        self.span.record("otel.status_message", message);
        self.status = SpanStatus::Error;
    }

    /// Record a successful status on the span
    pub fn mark_ok(&mut self, message: &str) {
        self.span.record("otel.status_code", "OK");
        self.span.record("otel.status_message", message);
        self.status = SpanStatus::Ok;
    }

    pub fn status(&self) -> SpanStatus {
        self.status
    }

    pub fn published(&self) -> usize {
        self.published
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_plain_decimals() {
        for raw in ["42.5", "100.00", "0", "-3.25", "1300.00", "0.000123", "7.5"] {
            let parsed = parse_decimal("TotalCost", Some(raw)).unwrap();
            let expected: f64 = raw.parse().unwrap();
            assert!((parsed - expected).abs() < 1e-12, "{raw} -> {parsed}");
        }
    }

    #[test]
    fn test_parse_matches_decimal_value() {
        let parsed = parse_decimal("NetSavings", Some("300.00")).unwrap();
        assert_eq!(parsed, dec!(300.00).to_f64().unwrap());
        assert_eq!(format!("{:.2}", parsed), "300.00");
    }

    #[test]
    fn test_parse_scientific_notation() {
        let parsed = parse_decimal("OnDemandCost", Some("1.5E-3")).unwrap();
        assert!((parsed - 0.0015).abs() < 1e-12);
    }

    #[test]
    fn test_parse_beyond_decimal_range_and_scale() {
        for raw in [
            "1E-30",
            "0.00000000000000000000000000000012",
            "1e30",
            "123456789012345678901234567890.5",
        ] {
            let parsed = parse_decimal("OnDemandCost", Some(raw)).unwrap();
            let expected: f64 = raw.parse().unwrap();
            assert_eq!(parsed, expected, "{raw}");
            assert!(parsed != 0.0, "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        for raw in [
            "", "   ", " 7.5 ", "N/A", "12,5", "NaN", "inf", "1.2.3", "1e400",
        ] {
            let err = parse_decimal("CoveragePercentage", Some(raw)).unwrap_err();
            assert_eq!(err.field, "CoveragePercentage");
            assert_eq!(err.raw, raw);
        }
    }

    #[test]
    fn test_parse_missing_field() {
        let err = parse_decimal("UsedCommitment", None).unwrap_err();
        assert_eq!(err.raw, "");
    }

    #[test]
    fn test_publisher_isolates_failures() {
        let mut publisher = FieldPublisher::new(Span::none());
        let mut values = Vec::new();

        assert!(publisher.publish("A", Some("1.5"), |v| values.push(v)));
        assert!(!publisher.publish("B", Some("oops"), |v| values.push(v)));
        assert!(publisher.publish("C", Some("2.5"), |v| values.push(v)));

        assert_eq!(values, vec![1.5, 2.5]);
        assert_eq!(publisher.published(), 2);
        assert_eq!(publisher.skipped(), 1);
        assert_eq!(publisher.status(), SpanStatus::Error);
    }

    #[test]
    fn test_publisher_status_transitions() {
        let mut publisher = FieldPublisher::new(Span::none());
        assert_eq!(publisher.status(), SpanStatus::Unset);

        publisher.mark_ok("done");
        assert_eq!(publisher.status(), SpanStatus::Ok);
    }
}
