// =============================================================================
// store.rs - Historique des couleurs capturées
// store.rs - Captured color history
// =============================================================================

use serde::Serialize;
use std::collections::VecDeque;

use crate::color::{ColorModelSet, Rgb};
use crate::config;

/// Une couleur capturée
/// One captured color
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Numéro d'ordre croissant, jamais réutilisé
    /// Increasing sequence number, never reused
    pub seq: u64,
    pub colors: ColorModelSet,
}

impl HistoryEntry {
    pub fn rgb(&self) -> Rgb {
        self.colors.rgb
    }
}

/// Résultat d'une capture
/// Result of a capture
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CaptureOutcome {
    Appended(HistoryEntry),
    /// History was full: the oldest entry made room for the new one.
    Evicted {
        entry: HistoryEntry,
        evicted: HistoryEntry,
    },
    /// Same RGB as the most recent entry; nothing was added.
    Duplicate(HistoryEntry),
}

impl CaptureOutcome {
    /// Entry now at the end of history
    pub fn entry(&self) -> &HistoryEntry {
        match self {
            CaptureOutcome::Appended(entry)
            | CaptureOutcome::Evicted { entry, .. }
            | CaptureOutcome::Duplicate(entry) => entry,
        }
    }

    pub fn is_new(&self) -> bool {
        !matches!(self, CaptureOutcome::Duplicate(_))
    }
}

/// Historique borné, ordre d'insertion, sans doublon consécutif
/// Bounded history, insertion order, no consecutive duplicates
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    next_seq: u64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(config::DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn push(&mut self, colors: ColorModelSet) -> CaptureOutcome {
        if let Some(last) = self.entries.back() {
            if last.colors.rgb == colors.rgb {
                return CaptureOutcome::Duplicate(*last);
            }
        }

        let entry = HistoryEntry {
            seq: self.next_seq,
            colors,
        };
        self.next_seq += 1;

        // Évince la plus ancienne avant d'ajouter pour ne jamais dépasser la capacité
        // Evict the oldest before appending so the capacity is never exceeded
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);

        match evicted {
            Some(evicted) => CaptureOutcome::Evicted { entry, evicted },
            None => CaptureOutcome::Appended(entry),
        }
    }

    /// Copie ordonnée, de la plus ancienne à la plus récente
    /// Ordered copy, oldest first
    pub fn export(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Replaces the contents, applying the same dedup and bound as `push`.
    /// Sequence numbers keep increasing across replacements.
    pub fn replace(&mut self, colors: impl IntoIterator<Item = Rgb>) {
        self.entries.clear();
        for rgb in colors {
            self.push(ColorModelSet::from(rgb));
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Removes the entry at `index` (0 = oldest).
    pub fn remove(&mut self, index: usize) -> Option<HistoryEntry> {
        self.entries.remove(index)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn set(r: u8, g: u8, b: u8) -> ColorModelSet {
        ColorModelSet::from(Rgb::new(r, g, b))
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut store = HistoryStore::new(5);
        assert!(matches!(store.push(set(1, 0, 0)), CaptureOutcome::Appended(_)));
        assert!(matches!(store.push(set(2, 0, 0)), CaptureOutcome::Appended(_)));

        let exported = store.export();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].rgb(), Rgb::new(1, 0, 0));
        assert_eq!(exported[1].rgb(), Rgb::new(2, 0, 0));
        assert!(exported[0].seq < exported[1].seq);
    }

    #[test]
    fn test_consecutive_duplicate_is_ignored() {
        let mut store = HistoryStore::new(5);
        store.push(set(9, 9, 9));
        let outcome = store.push(set(9, 9, 9));
        assert!(matches!(outcome, CaptureOutcome::Duplicate(_)));
        assert!(!outcome.is_new());
        assert_eq!(store.len(), 1);

        // Non consécutif : accepté / Not consecutive: accepted
        store.push(set(1, 1, 1));
        store.push(set(9, 9, 9));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = HistoryStore::new(3);
        for i in 0..3 {
            store.push(set(i, 0, 0));
        }
        match store.push(set(3, 0, 0)) {
            CaptureOutcome::Evicted { entry, evicted } => {
                assert_eq!(entry.rgb(), Rgb::new(3, 0, 0));
                assert_eq!(evicted.rgb(), Rgb::new(0, 0, 0));
            }
            other => panic!("Expected eviction, got {other:?}"),
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.export()[0].rgb(), Rgb::new(1, 0, 0));
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut store = HistoryStore::new(4);
        for i in 0..=255u8 {
            store.push(set(i, i, 0));
            assert!(store.len() <= 4);
        }
        assert_eq!(store.last().map(HistoryEntry::rgb), Some(Rgb::new(255, 255, 0)));
    }

    #[test]
    fn test_replace_clear_remove() {
        let mut store = HistoryStore::new(3);
        store.push(set(7, 7, 7));
        let before = store.last().map(|e| e.seq);

        store.replace([
            Rgb::new(1, 0, 0),
            Rgb::new(1, 0, 0),
            Rgb::new(2, 0, 0),
            Rgb::new(3, 0, 0),
            Rgb::new(4, 0, 0),
        ]);
        let rgbs: Vec<Rgb> = store.iter().map(HistoryEntry::rgb).collect();
        assert_eq!(rgbs, vec![Rgb::new(2, 0, 0), Rgb::new(3, 0, 0), Rgb::new(4, 0, 0)]);
        assert!(store.export()[0].seq > before.unwrap_or(0));

        let removed = store.remove(1).map(|e| e.rgb());
        assert_eq!(removed, Some(Rgb::new(3, 0, 0)));
        assert_eq!(store.remove(10), None);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut store = HistoryStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.push(set(1, 2, 3));
        assert!(matches!(store.push(set(3, 2, 1)), CaptureOutcome::Evicted { .. }));
    }
}
