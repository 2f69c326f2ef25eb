//! Bidirectional tag index.
//!
//! Tracks tag → keys and key → tags so invalidation can find every entry
//! carrying a tag, and eviction can clean up after a single key. Each tag
//! also carries a generation counter bumped on invalidation; fills compare
//! generations to detect an invalidation that happened while they ran.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::keys::Tag;

/// Snapshot of tag generations taken before a fill starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillTicket {
    generations: Vec<(Tag, u64)>,
}

#[derive(Debug, Default)]
pub(crate) struct TagIndex {
    tag_to_keys: HashMap<Tag, HashSet<String>>,
    key_to_tags: HashMap<String, BTreeSet<Tag>>,
    generations: HashMap<Tag, u64>,
}

impl TagIndex {
    /// Register `key` under `tags`. Any previous registration is replaced.
    pub fn register(&mut self, key: String, tags: BTreeSet<Tag>) {
        self.unregister(&key);
        for tag in &tags {
            self.tag_to_keys
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        self.key_to_tags.insert(key, tags);
    }

    /// Drop `key` from the index, returning the tags it carried.
    pub fn unregister(&mut self, key: &str) -> Option<BTreeSet<Tag>> {
        let tags = self.key_to_tags.remove(key)?;
        for tag in &tags {
            if let Some(keys) = self.tag_to_keys.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_to_keys.remove(tag);
                }
            }
        }
        Some(tags)
    }

    /// Every key carrying at least one of `tags`.
    pub fn keys_for_tags(&self, tags: &[Tag]) -> HashSet<String> {
        tags.iter()
            .filter_map(|tag| self.tag_to_keys.get(tag))
            .flatten()
            .cloned()
            .collect()
    }

    /// Advance the generation of every tag in `tags`.
    pub fn bump(&mut self, tags: &[Tag]) {
        for tag in tags {
            *self.generations.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    pub fn ticket(&self, tags: &[Tag]) -> FillTicket {
        FillTicket {
            generations: tags
                .iter()
                .map(|tag| (tag.clone(), self.generation(tag)))
                .collect(),
        }
    }

    /// Whether no tag of `ticket` was invalidated since it was issued.
    pub fn is_current(&self, ticket: &FillTicket) -> bool {
        ticket
            .generations
            .iter()
            .all(|(tag, generation)| self.generation(tag) == *generation)
    }

    pub fn generation(&self, tag: &Tag) -> u64 {
        self.generations.get(tag).copied().unwrap_or(0)
    }

    pub fn key_count(&self) -> usize {
        self.key_to_tags.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tag_to_keys.len()
    }

    /// Forget every key. Generations are kept so in-flight fills stay
    /// comparable.
    pub fn clear(&mut self) {
        self.tag_to_keys.clear();
        self.key_to_tags.clear();
    }
}
