//! Hash keys and insertion-ordered hashes.
//!
//! A hash stores its pairs in an `FxHashMap` keyed by [`HashKey`] and keeps a
//! separate `order` list. Every new key is appended to `order`, every removal
//! deletes it from `order`, and all iteration walks `order`. The map's own
//! iteration order is never observable.

use rustc_hash::FxHashMap;

use super::Value;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 1_099_511_628_211;

/// 64-bit FNV-1a digest.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Runtime type tag of a hash key.
///
/// Keys of different kinds never collide, so `1` and `"1"` are distinct keys.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum KeyTag {
    Int,
    Float,
    Bool,
    Str,
    /// Key supplied by a host object's `hash_key`.
    Host,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct HashKey {
    pub tag: KeyTag,
    pub hash: u64,
}

impl HashKey {
    pub const fn new(tag: KeyTag, hash: u64) -> Self {
        HashKey { tag, hash }
    }

    #[expect(
        clippy::cast_sign_loss,
        reason = "the integer's bit pattern is the hash"
    )]
    pub const fn int(value: i64) -> Self {
        HashKey::new(KeyTag::Int, value as u64)
    }

    pub fn float(value: f64) -> Self {
        HashKey::new(KeyTag::Float, value.to_bits())
    }

    pub fn boolean(value: bool) -> Self {
        HashKey::new(KeyTag::Bool, u64::from(value))
    }

    pub fn string(value: &str) -> Self {
        HashKey::new(KeyTag::Str, fnv1a(value.as_bytes()))
    }
}

/// A stored key/value pair. The original key is kept for iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Insertion-ordered hash.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HashValue {
    order: Vec<HashKey>,
    pairs: FxHashMap<HashKey, HashPair>,
}

impl HashValue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert or overwrite; returns the previous value for an existing key.
    ///
    /// Overwriting keeps the key's original position.
    pub fn insert(&mut self, hash: HashKey, key: Value, value: Value) -> Option<Value> {
        match self.pairs.get_mut(&hash) {
            Some(pair) => Some(std::mem::replace(&mut pair.value, value)),
            None => {
                self.order.push(hash);
                self.pairs.insert(hash, HashPair { key, value });
                None
            }
        }
    }

    pub fn get(&self, hash: &HashKey) -> Option<&HashPair> {
        self.pairs.get(hash)
    }

    pub fn contains_key(&self, hash: &HashKey) -> bool {
        self.pairs.contains_key(hash)
    }

    pub fn remove(&mut self, hash: &HashKey) -> Option<HashPair> {
        let pair = self.pairs.remove(hash)?;
        if let Some(idx) = self.order.iter().position(|k| k == hash) {
            self.order.remove(idx);
        }
        Some(pair)
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HashPair> + '_ {
        self.order.iter().filter_map(|k| self.pairs.get(k))
    }

    pub fn keys(&self) -> Vec<Value> {
        self.iter().map(|p| p.key.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.iter().map(|p| p.value.clone()).collect()
    }

    /// Key hashes in iteration order.
    pub fn order(&self) -> &[HashKey] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn put(h: &mut HashValue, k: &str, v: i64) {
        h.insert(HashKey::string(k), Value::string(k), Value::int(v));
    }

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn equal_strings_hash_equal() {
        let owned = String::from("key");
        assert_eq!(HashKey::string(&owned), HashKey::string("key"));
        assert_ne!(HashKey::string("1"), HashKey::int(1));
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut h = HashValue::new();
        put(&mut h, "a", 1);
        put(&mut h, "b", 2);
        put(&mut h, "a", 3);
        assert_eq!(h.keys(), vec![Value::string("a"), Value::string("b")]);
        assert_eq!(h.values(), vec![Value::int(3), Value::int(2)]);
    }

    #[test]
    fn remove_drops_from_order() {
        let mut h = HashValue::new();
        put(&mut h, "a", 1);
        put(&mut h, "b", 2);
        put(&mut h, "c", 3);
        let removed = h.remove(&HashKey::string("b"));
        assert_eq!(removed.map(|p| p.value), Some(Value::int(2)));
        assert_eq!(h.keys(), vec![Value::string("a"), Value::string("c")]);
        assert_eq!(h.order().len(), 2);
        assert!(h.remove(&HashKey::string("b")).is_none());
    }

    #[test]
    fn reinsert_after_remove_goes_last() {
        let mut h = HashValue::new();
        put(&mut h, "a", 1);
        put(&mut h, "b", 2);
        h.remove(&HashKey::string("a"));
        put(&mut h, "a", 9);
        assert_eq!(h.keys(), vec![Value::string("b"), Value::string("a")]);
    }
}
