//! Inverted tag index: tag -> keys currently carrying it

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct TagIndex {
    tags: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    pub fn add(&mut self, tag: &str, key: &str) {
        self.tags
            .entry(tag.to_string())
            .or_default()
            .insert(key.to_string());
    }

    /// Remove `key` from `tag`, dropping the tag once it has no keys
    pub fn remove(&mut self, tag: &str, key: &str) {
        let Some(keys) = self.tags.get_mut(tag) else {
            return;
        };
        keys.remove(key);
        if keys.is_empty() {
            self.tags.remove(tag);
        }
    }

    /// Union of keys for `tags`, each key once
    pub fn keys_for(&self, tags: &[String]) -> Vec<String> {
        let keys: HashSet<&String> = tags
            .iter()
            .filter_map(|tag| self.tags.get(tag))
            .flatten()
            .collect();
        keys.into_iter().cloned().collect()
    }

    pub fn contains(&self, tag: &str, key: &str) -> bool {
        self.tags.get(tag).is_some_and(|keys| keys.contains(key))
    }

    pub fn tags(&self) -> impl Iterator<Item = (&String, &HashSet<String>)> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_is_duplicate_free() {
        let mut index = TagIndex::default();
        index.add("a", "k1");
        index.add("a", "k2");
        index.add("b", "k2");

        let mut keys = index.keys_for(&["a".to_string(), "b".to_string(), "c".to_string()]);
        keys.sort();
        assert_eq!(keys, vec!["k1", "k2"]);
    }

    #[test]
    fn test_empty_tags_are_dropped() {
        let mut index = TagIndex::default();
        index.add("a", "k1");
        index.remove("a", "k1");
        assert!(index.is_empty());

        // removing from an unknown tag is a no-op
        index.remove("missing", "k1");
        assert_eq!(index.len(), 0);
    }
}
