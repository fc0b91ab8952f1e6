//! Keyed upsert shared by every record collection.
//!
//! Incoming records whose key already exists replace the existing record in
//! place; records with a new key are appended in the order supplied. Neither
//! the collection nor the incoming records are mutated; the merged sequence is
//! returned.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::models::{Area, Asset, Category, LocalId, Log, Unit};

/// A record with an identifier that is unique within its collection.
pub trait Keyed: Clone {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

impl Keyed for Log {
    type Key = LocalId;

    fn key(&self) -> LocalId {
        self.local_id()
    }
}

impl Keyed for Asset {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Keyed for Area {
    type Key = String;

    fn key(&self) -> String {
        self.tid.clone()
    }
}

impl Keyed for Unit {
    type Key = String;

    fn key(&self) -> String {
        self.tid.clone()
    }
}

impl Keyed for Category {
    type Key = String;

    fn key(&self) -> String {
        self.tid.clone()
    }
}

/// Merge `incoming` into `collection` using the record's own key.
pub fn upsert<E: Keyed>(collection: &[E], incoming: Vec<E>) -> Vec<E> {
    upsert_by(collection, incoming, E::key)
}

/// Merge a single record into `collection`.
pub fn upsert_one<E: Keyed>(collection: &[E], item: E) -> Vec<E> {
    let key = item.key();
    let mut merged = collection.to_vec();
    match collection.iter().position(|existing| existing.key() == key) {
        Some(index) => merged[index] = item,
        None => merged.push(item),
    }
    merged
}

/// Merge `incoming` into `collection` using an arbitrary key selector.
///
/// When `incoming` repeats a key, its last occurrence wins: it is the one
/// substituted for an existing record, or the one appended (at its own
/// position among the appended records) for a new key.
pub fn upsert_by<E, K, F>(collection: &[E], incoming: Vec<E>, key: F) -> Vec<E>
where
    E: Clone,
    K: Eq + Hash,
    F: Fn(&E) -> K,
{
    let mut last_seen: HashMap<K, usize> = HashMap::with_capacity(incoming.len());
    for (index, item) in incoming.iter().enumerate() {
        last_seen.insert(key(item), index);
    }
    let existing: HashSet<K> = collection.iter().map(&key).collect();

    let mut slots: Vec<Option<E>> = incoming.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(collection.len() + slots.len());

    for current in collection {
        let replacement = last_seen
            .get(&key(current))
            .and_then(|&index| slots[index].take());
        merged.push(replacement.unwrap_or_else(|| current.clone()));
    }

    for (index, slot) in slots.into_iter().enumerate() {
        if let Some(item) = slot {
            let item_key = key(&item);
            if !existing.contains(&item_key) && last_seen.get(&item_key) == Some(&index) {
                merged.push(item);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.id.as_str()).collect()
    }

    fn names(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.name.as_str()).collect()
    }

    fn sample() -> Vec<Asset> {
        vec![
            Asset::new("1", "Tractor"),
            Asset::new("2", "Sprayer"),
            Asset::new("3", "Trailer"),
        ]
    }

    #[test]
    fn test_upsert_appends_new_in_supplied_order() {
        let merged = upsert(
            &sample(),
            vec![Asset::new("5", "Mower"), Asset::new("4", "Baler")],
        );
        assert_eq!(keys(&merged), vec!["1", "2", "3", "5", "4"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let merged = upsert(
            &sample(),
            vec![Asset::new("4", "Baler"), Asset::new("2", "Big sprayer")],
        );
        assert_eq!(keys(&merged), vec!["1", "2", "3", "4"]);
        assert_eq!(names(&merged), vec!["Tractor", "Big sprayer", "Trailer", "Baler"]);
    }

    #[test]
    fn test_upsert_does_not_mutate_input() {
        let original = sample();
        let _ = upsert(&original, vec![Asset::new("1", "Renamed")]);
        assert_eq!(original, sample());
    }

    #[test]
    fn test_upsert_last_duplicate_wins() {
        let merged = upsert(
            &sample(),
            vec![
                Asset::new("2", "first"),
                Asset::new("9", "new first"),
                Asset::new("2", "second"),
                Asset::new("9", "new second"),
            ],
        );
        assert_eq!(keys(&merged), vec!["1", "2", "3", "9"]);
        assert_eq!(merged[1].name, "second");
        assert_eq!(merged[3].name, "new second");
    }

    #[test]
    fn test_upsert_never_duplicates_keys() {
        let incoming = vec![
            Asset::new("3", "a"),
            Asset::new("3", "b"),
            Asset::new("7", "c"),
            Asset::new("1", "d"),
            Asset::new("7", "e"),
        ];
        let merged = upsert(&sample(), incoming);
        let unique: HashSet<&str> = merged.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(unique.len(), merged.len());
    }

    #[test]
    fn test_upsert_one_is_idempotent() {
        let item = Asset::new("2", "Big sprayer");
        let once = upsert_one(&sample(), item.clone());
        let twice = upsert_one(&once, item);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_upsert_one_fast_path_appends() {
        let merged = upsert_one(&sample(), Asset::new("4", "Baler"));
        assert_eq!(keys(&merged), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_upsert_one_matches_batch_of_one() {
        for item in [Asset::new("2", "Big sprayer"), Asset::new("8", "Plough")] {
            assert_eq!(
                upsert_one(&sample(), item.clone()),
                upsert(&sample(), vec![item])
            );
        }
    }

    #[test]
    fn test_upsert_preserves_matched_positions() {
        let original = sample();
        let merged = upsert(
            &original,
            vec![Asset::new("3", "x"), Asset::new("1", "y")],
        );
        for (position, asset) in original.iter().enumerate() {
            assert_eq!(merged[position].id, asset.id);
        }
    }

    #[test]
    fn test_upsert_by_custom_selector() {
        let units = vec![Unit::new("1", "kg"), Unit::new("2", "lbs")];
        let merged = upsert_by(&units, vec![Unit::new("9", "kg")], |u| u.name.clone());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].tid, "9");
    }

    #[test]
    fn test_logs_keyed_by_local_id() {
        let first = Log::new(LocalId::new(), "a").with_remote_id("1");
        let second = Log::new(LocalId::new(), "b").with_remote_id("1");
        let merged = upsert(&[first], vec![second]);
        assert_eq!(merged.len(), 2);
    }
}
