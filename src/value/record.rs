use super::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// An insertion-ordered mapping from field names to [`Value`]s.
///
/// Records are the shape of store state and of every property set a binding
/// handles. They are never compared deeply: [`Record::shallow_eq`] checks the
/// key sets and then each value with [`Value`]'s identity-aware equality.
#[derive(Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<Arc<str>, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Insert a field, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder form of [`Record::insert`].
    pub fn with(mut self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| &**k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (&**k, v))
    }

    /// Shallow overlay: every field of `self`, then every field of `overlay`.
    ///
    /// Fields present in both take `overlay`'s value but keep the position
    /// they had in `self`.
    pub fn merged(&self, overlay: &Record) -> Record {
        let mut out = Record::with_capacity(self.len() + overlay.len());
        out.fields.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        out.fields.extend(overlay.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }

    /// Same key set and pairwise-equal values, ignoring field order.
    pub fn shallow_eq(&self, other: &Record) -> bool {
        self.len() == other.len()
            && self
                .fields
                .iter()
                .all(|(key, value)| other.fields.get(key).is_some_and(|theirs| theirs == value))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<Arc<str>>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Record
where
    K: Into<Arc<str>>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.fields
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

/// Build a [`Record`] from `key => value` pairs.
///
/// ```
/// use tether::record;
///
/// let state = record! { "msg" => "hello", "count" => 0 };
/// assert_eq!(state.get("msg").and_then(|v| v.as_str()), Some("hello"));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert($key, $value); )+
        record
    }};
}
