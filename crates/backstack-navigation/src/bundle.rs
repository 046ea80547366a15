use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrArray(Vec<String>),
    Bundle(Bundle),
}

impl From<&str> for BundleValue {
    fn from(v: &str) -> Self {
        BundleValue::Str(v.to_owned())
    }
}

impl From<String> for BundleValue {
    fn from(v: String) -> Self {
        BundleValue::Str(v)
    }
}

impl From<i64> for BundleValue {
    fn from(v: i64) -> Self {
        BundleValue::Int(v)
    }
}

impl From<f64> for BundleValue {
    fn from(v: f64) -> Self {
        BundleValue::Float(v)
    }
}

impl From<bool> for BundleValue {
    fn from(v: bool) -> Self {
        BundleValue::Bool(v)
    }
}

impl From<Vec<String>> for BundleValue {
    fn from(v: Vec<String>) -> Self {
        BundleValue::StrArray(v)
    }
}

impl From<Bundle> for BundleValue {
    fn from(v: Bundle) -> Self {
        BundleValue::Bundle(v)
    }
}

/// Insertion-ordered key/value map used for navigation arguments and saved
/// state. Keys are unique; putting an existing key replaces its value in
/// place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    entries: IndexMap<String, BundleValue>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Bundle::put`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<BundleValue>) -> Self {
        self.put(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BundleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&BundleValue> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<BundleValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<BundleValue> {
        // keeps the order of the remaining keys
        self.entries.shift_remove(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            BundleValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            BundleValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            BundleValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            BundleValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string_array(&self, key: &str) -> Option<&[String]> {
        match self.get(key)? {
            BundleValue::StrArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_bundle(&self, key: &str) -> Option<&Bundle> {
        match self.get(key)? {
            BundleValue::Bundle(b) => Some(b),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<BundleValue>> FromIterator<(K, V)> for Bundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut b = Bundle::new();
        for (k, v) in iter {
            b.put(k, v);
        }
        b
    }
}
