//! Typed access to optional fields in nested JSON
//!
//! A [`Field`] is a cursor into a `serde_json::Value` that may point at
//! nothing. Descending through a missing key, a `null` or a non-object keeps
//! pointing at nothing, and every accessor returns an empty default in that
//! case, so extractors never branch on partial data.

use serde_json::Value;

/// Cursor into an optional JSON value
#[derive(Debug, Clone, Copy)]
pub struct Field<'a>(Option<&'a Value>);

impl<'a> Field<'a> {
    /// Starts a lookup at `value`
    pub fn of(value: &'a Value) -> Self {
        Self(Some(value))
    }

    /// A cursor pointing at nothing
    pub fn missing() -> Self {
        Self(None)
    }

    /// Descends into an object key
    pub fn get(self, key: &str) -> Self {
        Self(self.0.and_then(|v| v.as_object()).and_then(|o| o.get(key)))
    }

    /// Descends through a fixed path of object keys
    pub fn path(self, keys: &[&str]) -> Self {
        keys.iter().fold(self, |field, key| field.get(key))
    }

    /// The underlying value, if present and not `null`
    pub fn value(self) -> Option<&'a Value> {
        self.0.filter(|v| !v.is_null())
    }

    pub fn is_present(self) -> bool {
        self.value().is_some()
    }

    /// Scalar rendered as text; missing, `null`, arrays and objects give `""`
    pub fn text(self) -> String {
        match self.value() {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Like [`Field::text`], but `None` instead of an empty string
    pub fn opt_text(self) -> Option<String> {
        Some(self.text()).filter(|s| !s.is_empty())
    }

    /// Non-negative integer, accepting numeric strings
    pub fn u64(self) -> Option<u64> {
        match self.value() {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Array elements, or an empty slice
    pub fn items(self) -> &'a [Value] {
        self.value()
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Human-readable labels of an array
    ///
    /// Elements may be plain scalars or objects carrying a `name` or `value`
    /// key. Blank labels are dropped.
    pub fn labels(self) -> Vec<String> {
        self.items()
            .iter()
            .map(|item| {
                let field = Field::of(item);
                if item.is_object() {
                    field.get("name").opt_text().unwrap_or_else(|| field.get("value").text())
                } else {
                    field.text()
                }
            })
            .filter(|label| !label.is_empty())
            .collect()
    }
}

/// Joins labels the way every list-valued column is rendered
pub fn join_labels<S: AsRef<str>>(labels: &[S]) -> String {
    labels
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}
