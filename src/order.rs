use std::cmp::Reverse;

use crate::entry::Entry;
use crate::watermark::Watermark;

/// Sorts entries newest first.
///
/// The sort is stable: entries with equal timestamps keep their input order, and so do undated
/// entries, which all end up after every dated one.
pub fn sort_newest_first(entries: &mut [Entry]) {
    // `None < Some(_)`, so reversing puts undated entries last.
    entries.sort_by_key(|entry| Reverse(entry.published_at));
}

/// Keeps the entries published strictly after the watermark, preserving their order.
pub fn newer_than(entries: Vec<Entry>, watermark: Watermark) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|entry| {
            entry
                .published_at
                .is_some_and(|published_at| watermark.is_before(published_at))
        })
        .collect()
}
