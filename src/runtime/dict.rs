//! Insertion-ordered `dict` and `set` storage.
//!
//! Keys are stored twice: the original [`Value`] (so `repr` and iteration return what target code inserted) and
//! its [`HashKey`] (so `1`, `1.0` and `True` collide the way Python's hashing makes them collide).

use std::collections::HashMap;

use super::error::Exception;
use super::value::{HashKey, Value};

/// Backing store of a `dict`.
#[derive(Debug, Clone, Default)]
pub struct PyDict {
    entries: Vec<(Value, Value)>,
    index: HashMap<HashKey, usize>,
}

impl PyDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`; raises `TypeError` for unhashable keys.
    pub fn get(&self, key: &Value) -> Result<Option<Value>, Exception> {
        let hk = key.hash_key()?;
        Ok(self.index.get(&hk).map(|&i| self.entries[i].1.clone()))
    }

    pub fn contains_key(&self, key: &Value) -> Result<bool, Exception> {
        Ok(self.index.contains_key(&key.hash_key()?))
    }

    /// Insert or overwrite. An existing key keeps its position and its original key object.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), Exception> {
        let hk = key.hash_key()?;
        match self.index.get(&hk) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(hk, self.entries.len());
                self.entries.push((key, value));
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>, Exception> {
        let hk = key.hash_key()?;
        let Some(pos) = self.index.remove(&hk) else {
            return Ok(None);
        };
        let (_, value) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Ok(Some(value))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Same keys in the same order, each value passed through `f`.
    pub fn map_values(&self, mut f: impl FnMut(&Value) -> Value) -> PyDict {
        PyDict {
            entries: self.entries.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
            index: self.index.clone(),
        }
    }
}

/// Backing store of a `set`.
#[derive(Debug, Clone, Default)]
pub struct PySet {
    items: Vec<Value>,
    index: HashMap<HashKey, usize>,
}

impl PySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &Value) -> Result<bool, Exception> {
        Ok(self.index.contains_key(&item.hash_key()?))
    }

    /// Add `item`; returns `false` if it was already present.
    pub fn insert(&mut self, item: Value) -> Result<bool, Exception> {
        let hk = item.hash_key()?;
        if self.index.contains_key(&hk) {
            return Ok(false);
        }
        self.index.insert(hk, self.items.len());
        self.items.push(item);
        Ok(true)
    }

    /// Remove `item`; returns `false` if it was absent.
    pub fn remove(&mut self, item: &Value) -> Result<bool, Exception> {
        let hk = item.hash_key()?;
        let Some(pos) = self.index.remove(&hk) else {
            return Ok(false);
        };
        self.items.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_collide_like_python() {
        let mut d = PyDict::new();
        d.insert(Value::Int(1), Value::str("int")).unwrap();
        d.insert(Value::Float(1.0), Value::str("float")).unwrap();
        d.insert(Value::Bool(true), Value::str("bool")).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.keys()[0].repr(), "1");
        assert_eq!(d.get(&Value::Int(1)).unwrap().unwrap().to_str(), "bool");
    }

    #[test]
    fn test_remove_keeps_order_and_index() {
        let mut d = PyDict::new();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            d.insert(Value::str(k), Value::Int(i as i64)).unwrap();
        }
        assert_eq!(d.remove(&Value::str("a")).unwrap().map(|v| v.repr()), Some("0".to_string()));
        assert_eq!(d.get(&Value::str("c")).unwrap().map(|v| v.repr()), Some("2".to_string()));
        let keys: Vec<String> = d.keys().iter().map(Value::repr).collect();
        assert_eq!(keys, vec!["'b'", "'c'"]);
    }

    #[test]
    fn test_unhashable_key_is_type_error() {
        let mut d = PyDict::new();
        let err = d.insert(Value::list(vec![]), Value::None).unwrap_err();
        assert_eq!(err.message(), "unhashable type: 'list'");
    }

    #[test]
    fn test_set_dedupes() {
        let mut s = PySet::new();
        assert!(s.insert(Value::Int(2)).unwrap());
        assert!(!s.insert(Value::Float(2.0)).unwrap());
        assert!(s.remove(&Value::Int(2)).unwrap());
        assert!(s.is_empty());
    }
}
