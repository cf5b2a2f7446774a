//! Typed tag parameters.
//!
//! [`Params`] is a small ordered map. Raw values arrive from the tokenizer
//! as text (bare flags as `true`); the resolver normalizes declared numeric
//! parameters into [`ParamValue::Number`]. Accessors coerce where the
//! conversion is unambiguous and return `None` otherwise, so a malformed
//! value is indistinguishable from an absent one.

use std::fmt;

/// One parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A number.
    Number(f64),
    /// Free text (colors, enum names, ids).
    Text(String),
    /// A boolean flag.
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered, case-insensitive-keyed parameter map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    /// An empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from raw `key=value` pairs as produced by the tokenizer.
    ///
    /// All values are kept as text; later duplicates replace earlier ones.
    pub fn from_raw<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, ParamValue::Text(value.to_string()));
        }
        params
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, key: &str, value: ParamValue) {
        let key = key.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let key = key.to_ascii_lowercase();
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Raw access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Numeric value. Text is parsed; NaN and booleans read as absent.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        let n = match self.get(key)? {
            ParamValue::Number(n) => *n,
            ParamValue::Text(s) => s.trim().parse::<f64>().ok()?,
            ParamValue::Bool(_) => return None,
        };
        (!n.is_nan()).then_some(n)
    }

    /// Boolean value. Accepts `true/false`, `yes/no`, `on/off`, `1/0`.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Number(n) if *n == 0.0 => Some(false),
            ParamValue::Number(n) if *n == 1.0 => Some(true),
            ParamValue::Number(_) => None,
            ParamValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
        }
    }

    /// Text value. Numbers and booleans read as absent.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            ParamValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let params = Params::from_raw([("Speed", "2")]);
        assert_eq!(params.number("speed"), Some(2.0));
        assert_eq!(params.number("SPEED"), Some(2.0));
    }

    #[test]
    fn later_duplicate_wins_in_place() {
        let params = Params::from_raw([("a", "1"), ("b", "2"), ("a", "3")]);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(params.number("a"), Some(3.0));
    }

    #[test]
    fn number_coercion() {
        let params = Params::new()
            .with("n", 1.5)
            .with("t", " 42 ")
            .with("bad", "fast")
            .with("nan", "NaN")
            .with("b", true);
        assert_eq!(params.number("n"), Some(1.5));
        assert_eq!(params.number("t"), Some(42.0));
        assert_eq!(params.number("bad"), None);
        assert_eq!(params.number("nan"), None);
        assert_eq!(params.number("b"), None);
        assert_eq!(params.number("missing"), None);
    }

    #[test]
    fn flag_coercion() {
        let params = Params::new()
            .with("a", "true")
            .with("b", "off")
            .with("c", 1.0)
            .with("d", 0.5)
            .with("e", "maybe");
        assert_eq!(params.flag("a"), Some(true));
        assert_eq!(params.flag("b"), Some(false));
        assert_eq!(params.flag("c"), Some(true));
        assert_eq!(params.flag("d"), None);
        assert_eq!(params.flag("e"), None);
    }

    #[test]
    fn text_does_not_coerce() {
        let params = Params::new().with("n", 3.0).with("s", "left");
        assert_eq!(params.text("n"), None);
        assert_eq!(params.text("s"), Some("left"));
    }

    #[test]
    fn remove_returns_value() {
        let mut params = Params::new().with("x", "1");
        assert_eq!(params.remove("X"), Some(ParamValue::Text("1".into())));
        assert!(params.is_empty());
    }
}
