//! Key/value pair that remembers what it held before.
//!
//! Equality only looks at the current key and value; the history is for
//! inspection and never affects comparisons.

/// A key/value pair where either side may be absent.
///
/// Every setter keeps the value it replaced, so a caller can see the
/// immediately-previous key or value after an update.
#[derive(Debug, Clone)]
pub struct Pair<K, V> {
    key: Option<K>,
    value: Option<V>,
    previous_key: Option<K>,
    previous_value: Option<V>,
}

impl<K, V> Pair<K, V> {
    pub fn new(key: Option<K>, value: Option<V>) -> Self {
        Self {
            key,
            value,
            previous_key: None,
            previous_value: None,
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn previous_key(&self) -> Option<&K> {
        self.previous_key.as_ref()
    }

    pub fn previous_value(&self) -> Option<&V> {
        self.previous_value.as_ref()
    }

    /// Replace the key; the old key moves into `previous_key`
    pub fn set_key(&mut self, key: Option<K>) {
        self.previous_key = std::mem::replace(&mut self.key, key);
    }

    pub fn set_value(&mut self, value: Option<V>) {
        self.previous_value = std::mem::replace(&mut self.value, value);
    }

    pub fn set(&mut self, key: Option<K>, value: Option<V>) {
        self.set_key(key);
        self.set_value(value);
    }

    pub fn into_parts(self) -> (Option<K>, Option<V>) {
        (self.key, self.value)
    }
}

impl<K, V> Default for Pair<K, V> {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl<K, V> From<(K, V)> for Pair<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(Some(key), Some(value))
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Pair<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl<K: Eq, V: Eq> Eq for Pair<K, V> {}
