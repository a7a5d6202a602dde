use std::sync::LazyLock;

use regex::Regex;

use crate::CellValue;

static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("integer pattern must compile"));

/// Numeric coercion rule applied at a computation boundary.
///
/// Cells that cannot be coerced yield `None` and are excluded row by row by the
/// caller; coercion never fails a whole computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericCoercion {
    /// Finite numbers, and text that parses as a finite number after trimming.
    #[default]
    Direct,
    /// [`Direct`](Self::Direct) first; if that fails, the first run of digits
    /// inside the text (so `"7 - Very satisfied"` becomes `7`).
    LabelTolerant,
}

impl NumericCoercion {
    /// Coerces a cell according to this rule.
    ///
    /// ```
    /// use npscope_table::{CellValue, NumericCoercion};
    ///
    /// let label = CellValue::from("6 - Satisfied");
    /// assert_eq!(NumericCoercion::Direct.coerce(&label), None);
    /// assert_eq!(NumericCoercion::LabelTolerant.coerce(&label), Some(6.0));
    /// assert_eq!(NumericCoercion::Direct.coerce(&CellValue::from(" 8 ")), Some(8.0));
    /// ```
    #[must_use]
    pub fn coerce(self, cell: &CellValue) -> Option<f64> {
        match self {
            Self::Direct => parse_number(cell),
            Self::LabelTolerant => parse_number(cell).or_else(|| match cell {
                CellValue::Text(text) => extract_leading_integer(text),
                CellValue::Missing | CellValue::Number(_) => None,
            }),
        }
    }
}

/// Direct numeric coercion: finite numbers pass through, text is trimmed and parsed.
///
/// Non-finite values (`NaN`, infinities) are treated as non-coercible.
#[must_use]
pub fn parse_number(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Missing => return None,
        CellValue::Number(n) => *n,
        CellValue::Text(text) => text.trim().parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Extracts the first run of ASCII digits in `text` as a number.
///
/// ```
/// use npscope_table::extract_leading_integer;
///
/// assert_eq!(extract_leading_integer("7 - Extremely satisfied"), Some(7.0));
/// assert_eq!(extract_leading_integer("Very satisfied"), None);
/// ```
#[must_use]
pub fn extract_leading_integer(text: &str) -> Option<f64> {
    let digits = INTEGER_PATTERN.find(text)?;
    digits.as_str().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_rejects_labels_and_missing() {
        assert_eq!(NumericCoercion::Direct.coerce(&CellValue::Missing), None);
        assert_eq!(NumericCoercion::Direct.coerce(&CellValue::from("abc")), None);
        assert_eq!(NumericCoercion::Direct.coerce(&CellValue::from("")), None);
    }

    #[test]
    fn test_direct_rejects_non_finite() {
        assert_eq!(NumericCoercion::Direct.coerce(&CellValue::from("NaN")), None);
        assert_eq!(NumericCoercion::Direct.coerce(&CellValue::from("inf")), None);
        assert_eq!(NumericCoercion::Direct.coerce(&CellValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_direct_takes_precedence_over_extraction() {
        // "7.5" parses directly; extraction alone would give 7
        assert_eq!(
            NumericCoercion::LabelTolerant.coerce(&CellValue::from("7.5")),
            Some(7.5)
        );
    }

    #[test]
    fn test_label_tolerant_uses_first_digits() {
        assert_eq!(
            NumericCoercion::LabelTolerant.coerce(&CellValue::from("Score: 10 (max)")),
            Some(10.0)
        );
        assert_eq!(
            NumericCoercion::LabelTolerant.coerce(&CellValue::from("no digits")),
            None
        );
        assert_eq!(NumericCoercion::LabelTolerant.coerce(&CellValue::Missing), None);
    }
}
