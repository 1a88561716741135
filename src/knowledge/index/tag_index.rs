//! Incrementally maintained `key -> set(id)` index.
//!
//! Used for the store's type and tag indices and for the memory layer's
//! association index. Buckets are updated per changed key; an emptied bucket
//! is dropped so the key count tracks live keys only.

use std::collections::{BTreeSet, HashMap};

/// Secondary index from a string key to the ids carrying it.
#[derive(Clone, Debug)]
pub struct TagIndex<Id> {
    buckets: HashMap<String, BTreeSet<Id>>,
}

impl<Id> Default for TagIndex<Id> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }
}

impl<Id: Copy + Ord> TagIndex<Id> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to the bucket for `key`.
    pub fn insert(&mut self, key: &str, id: Id) {
        self.buckets.entry(key.to_string()).or_default().insert(id);
    }

    /// Add `id` under every key.
    pub fn insert_all<'a, I>(&mut self, keys: I, id: Id)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for key in keys {
            self.insert(key, id);
        }
    }

    /// Remove `id` from the bucket for `key`, dropping the bucket if it empties.
    pub fn remove(&mut self, key: &str, id: Id) {
        if let Some(bucket) = self.buckets.get_mut(key) {
            bucket.remove(&id);
            if bucket.is_empty() {
                self.buckets.remove(key);
            }
        }
    }

    /// Remove `id` from every listed key.
    pub fn remove_all<'a, I>(&mut self, keys: I, id: Id)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for key in keys {
            self.remove(key, id);
        }
    }

    /// Ids under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BTreeSet<Id>> {
        self.buckets.get(key)
    }

    /// Number of ids under `key`.
    #[must_use]
    pub fn bucket_len(&self, key: &str) -> usize {
        self.buckets.get(key).map_or(0, BTreeSet::len)
    }

    /// Whether `id` is indexed under `key`.
    #[must_use]
    pub fn contains(&self, key: &str, id: Id) -> bool {
        self.buckets.get(key).is_some_and(|bucket| bucket.contains(&id))
    }

    /// Ids present under every one of `keys`.
    ///
    /// An empty key list yields an empty set. A key with no bucket
    /// short-circuits to an empty set.
    #[must_use]
    pub fn intersect<'a, I>(&self, keys: I) -> BTreeSet<Id>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut buckets = Vec::new();
        for key in keys {
            match self.buckets.get(key) {
                Some(bucket) => buckets.push(bucket),
                None => return BTreeSet::new(),
            }
        }

        buckets.sort_by_key(|bucket| bucket.len());
        let mut iter = buckets.into_iter();
        let Some(smallest) = iter.next() else {
            return BTreeSet::new();
        };

        let rest: Vec<&BTreeSet<Id>> = iter.collect();
        smallest
            .iter()
            .filter(|id| rest.iter().all(|bucket| bucket.contains(id)))
            .copied()
            .collect()
    }

    /// Iterate over `(key, ids)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Id>)> {
        self.buckets.iter().map(|(key, ids)| (key.as_str(), ids))
    }

    /// Number of live keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// Drop every bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
