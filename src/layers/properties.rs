use geojson::JsonObject;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// One feature attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl PropertyValue {
    /// Finite numbers, or text that parses as one. "NaN" and "inf" do not count.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            PropertyValue::Number(n) => *n,
            PropertyValue::Text(s) => s.trim().parse().ok()?,
            PropertyValue::Bool(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// `true`, non-zero numbers and non-empty text
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Bool(b) => *b,
            PropertyValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropertyValue::Text(s) => !s.is_empty(),
        }
    }

    /// Compare against a raw attribute string, numerically for numbers
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            PropertyValue::Text(s) => s == raw,
            PropertyValue::Number(n) => raw.trim().parse::<f64>().is_ok_and(|v| v == *n),
            PropertyValue::Bool(b) => raw.parse::<bool>().is_ok_and(|v| v == *b),
        }
    }

    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(PropertyValue::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(PropertyValue::Number),
            JsonValue::String(s) => Some(PropertyValue::Text(s.clone())),
            other => Some(PropertyValue::Text(other.to_string())),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// Attribute bag of a feature, keyed by attribute name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert GeoJSON properties. `null` values are dropped, arrays and
    /// objects are kept as JSON text.
    pub fn from_json(object: &JsonObject) -> Self {
        Self(
            object
                .iter()
                .filter_map(|(k, v)| PropertyValue::from_json(v).map(|v| (k.clone(), v)))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_text)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropertyValue::as_number)
    }

    /// Absent attributes are falsy
    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(PropertyValue::is_truthy)
    }

    /// Display form of an attribute, empty when absent
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Copy of `self` with every key of `overlay` written over it
    pub fn merged(&self, overlay: &Properties) -> Properties {
        let mut out = self.clone();
        out.0.extend(overlay.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: JsonValue) -> JsonObject {
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn converts_json_properties() {
        let props = Properties::from_json(&object(json!({
            "wk_code": "WK036301",
            "Percentage": 27.5,
            "unselectable": true,
            "missing": null,
            "tags": ["a", "b"]
        })));

        assert_eq!(props.text("wk_code"), Some("WK036301"));
        assert_eq!(props.number("Percentage"), Some(27.5));
        assert!(props.is_truthy("unselectable"));
        assert_eq!(props.get("missing"), None);
        assert_eq!(props.text("tags"), Some(r#"["a","b"]"#));
    }

    #[test]
    fn numeric_text_reads_as_number() {
        let props: Properties = [("latitude", "52.09"), ("longitude", "n/a"), ("nan", "NaN"), ("inf", "-infinity")]
            .into_iter()
            .collect();
        assert_eq!(props.number("latitude"), Some(52.09));
        assert_eq!(props.number("longitude"), None);
        assert_eq!(props.number("absent"), None);
        assert_eq!(props.number("nan"), None);
        assert_eq!(props.number("inf"), None);
    }

    #[test]
    fn truthiness() {
        let mut props = Properties::new();
        props.insert("empty", "");
        props.insert("zero", 0.0);
        props.insert("off", false);
        props.insert("on", "yes");
        assert!(!props.is_truthy("empty"));
        assert!(!props.is_truthy("zero"));
        assert!(!props.is_truthy("off"));
        assert!(!props.is_truthy("absent"));
        assert!(props.is_truthy("on"));
    }

    #[test]
    fn overlay_wins_on_merge() {
        let base: Properties = [("a", "base"), ("b", "kept")].into_iter().collect();
        let overlay: Properties = [("a", "overlay")].into_iter().collect();
        let merged = base.merged(&overlay);
        assert_eq!(merged.text("a"), Some("overlay"));
        assert_eq!(merged.text("b"), Some("kept"));
    }

    #[test]
    fn matches_raw_attribute_values() {
        assert!(PropertyValue::Number(123456789.0).matches("123456789"));
        assert!(PropertyValue::from("WK01").matches("WK01"));
        assert!(!PropertyValue::from("WK01").matches("WK02"));
        assert_eq!(PropertyValue::Number(14.0).to_string(), "14");
        assert_eq!(PropertyValue::Number(2.5).to_string(), "2.5");
    }
}
