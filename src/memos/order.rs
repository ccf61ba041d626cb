use std::cmp::Ordering;

use crate::storage::OrderMap;
use crate::types::{Memo, MemoMetadata};

fn by_index(a: Option<&usize>, b: Option<&usize>) -> Option<Ordering> {
    match (a, b) {
        (Some(a_idx), Some(b_idx)) => Some(a_idx.cmp(b_idx)),
        (Some(_), None) => Some(Ordering::Less),
        (None, Some(_)) => Some(Ordering::Greater),
        (None, None) => None,
    }
}

/// Pinned memos first. Inside each partition the persisted index wins;
/// unindexed pinned memos follow pin time, unindexed unpinned memos the most
/// recently updated first.
pub(crate) fn sort_memos(memos: &mut [MemoMetadata], order: &OrderMap) {
    memos.sort_by(|a, b| match (a.pinned, b.pinned) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => by_index(order.get(&a.filename), order.get(&b.filename)).unwrap_or_else(
            || match (&a.pinned_at, &b.pinned_at) {
                (Some(a_time), Some(b_time)) => a_time.cmp(b_time),
                _ => Ordering::Equal,
            },
        ),
        (false, false) => by_index(order.get(&a.filename), order.get(&b.filename))
            .unwrap_or_else(|| b.updated_at.cmp(&a.updated_at)),
    });
}

pub(crate) fn order_from_filenames<'a>(filenames: impl IntoIterator<Item = &'a String>) -> OrderMap {
    filenames
        .into_iter()
        .enumerate()
        .map(|(index, filename)| (filename.clone(), index))
        .collect()
}

pub(crate) fn pinned_count(memos: &[Memo]) -> usize {
    memos.iter().take_while(|memo| memo.pinned).count()
}

/// Filenames with `filename` placed at the head of the unpinned partition.
pub(crate) fn insert_after_pinned(memos: &[Memo], filename: &str) -> Vec<String> {
    let mut filenames: Vec<String> = memos
        .iter()
        .filter(|memo| memo.filename != filename)
        .map(|memo| memo.filename.clone())
        .collect();
    let position = pinned_count(memos).min(filenames.len());
    filenames.insert(position, filename.to_string());
    filenames
}

/// Drag and drop move of `source` onto `target`'s slot. `None` when either is
/// unknown or the move would cross the pinned/unpinned boundary.
pub(crate) fn move_within_partition(
    memos: &[Memo],
    source: &str,
    target: &str,
) -> Option<Vec<String>> {
    let from = memos.iter().position(|memo| memo.filename == source)?;
    let to = memos.iter().position(|memo| memo.filename == target)?;
    if memos[from].pinned != memos[to].pinned {
        return None;
    }
    let mut filenames: Vec<String> = memos.iter().map(|memo| memo.filename.clone()).collect();
    let moved = filenames.remove(from);
    filenames.insert(to, moved);
    Some(filenames)
}

/// Accepts a full ordering only if it keeps every pinned memo ahead of every
/// unpinned one.
pub(crate) fn keeps_pinned_prefix(memos: &[Memo], filenames: &[String]) -> bool {
    let mut seen_unpinned = false;
    for filename in filenames {
        let Some(memo) = memos.iter().find(|memo| &memo.filename == filename) else {
            continue;
        };
        if memo.pinned && seen_unpinned {
            return false;
        }
        seen_unpinned |= !memo.pinned;
    }
    true
}
