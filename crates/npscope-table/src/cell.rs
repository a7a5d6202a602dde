use std::fmt;

use serde::{Deserialize, Serialize};

/// A single table cell.
///
/// Serialized untagged: JSON `null` is [`CellValue::Missing`], a JSON number is
/// [`CellValue::Number`] and a JSON string is [`CellValue::Text`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Returns `true` for missing cells and for text that is empty or whitespace-only.
    ///
    /// ```
    /// use npscope_table::CellValue;
    ///
    /// assert!(CellValue::Missing.is_blank());
    /// assert!(CellValue::from("  ").is_blank());
    /// assert!(!CellValue::from(0.0).is_blank());
    /// ```
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
        }
    }

    /// String form of the cell.
    ///
    /// Integral numbers render without a fractional part (`1.0` becomes `"1"`),
    /// missing cells render as the empty string.
    #[must_use]
    pub fn to_label(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Number(n) => n.to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    /// String form with every whitespace character removed.
    ///
    /// This is the normalization applied to each component of a segment key,
    /// so `"20대 이하"` and `"20대이하"` compare equal.
    ///
    /// ```
    /// use npscope_table::CellValue;
    ///
    /// assert_eq!(CellValue::from(" Male ").to_compact_label(), "Male");
    /// assert_eq!(CellValue::from("20 - 29").to_compact_label(), "20-29");
    /// assert_eq!(CellValue::from(1.0).to_compact_label(), "1");
    /// ```
    #[must_use]
    pub fn to_compact_label(&self) -> String {
        self.to_label()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    #[expect(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_untagged() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"[null, 3, 4.5, "x"]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                CellValue::Missing,
                CellValue::Number(3.0),
                CellValue::Number(4.5),
                CellValue::Text("x".to_owned()),
            ]
        );
    }

    #[test]
    fn test_serialize_untagged() {
        let cells = vec![CellValue::Missing, CellValue::from(2.0), CellValue::from("a")];
        assert_eq!(serde_json::to_string(&cells).unwrap(), r#"[null,2.0,"a"]"#);
    }

    #[test]
    fn test_label_of_numbers() {
        assert_eq!(CellValue::from(10.0).to_label(), "10");
        assert_eq!(CellValue::from(0.5).to_label(), "0.5");
        assert_eq!(CellValue::from(3_i64).to_label(), "3");
        assert_eq!(CellValue::Missing.to_label(), "");
    }

    #[test]
    fn test_compact_label_strips_all_whitespace() {
        let cell = CellValue::from("\tMale \u{3000}\n");
        assert_eq!(cell.to_compact_label(), "Male");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(CellValue::from(None::<f64>), CellValue::Missing);
        assert_eq!(CellValue::from(Some("a")), CellValue::from("a"));
    }
}
