//! The message merge algorithm.
//!
//! Both the cache layer (`append_messages`) and the synchronizer (full
//! refresh, poll ticks, send reconciliation) funnel through [`merge_by_id`],
//! which keeps the two paths convergent: an identity-keyed union where the
//! incoming copy wins on id collision, flattened and sorted by parsed
//! timestamp with a numeric-id tie-break.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::Message;
use crate::timestamp::parse_created_at;

/// Merge `incoming` into `existing`, deduplicating by message id.
///
/// On id collision the incoming entry wins (server truth overrides a stale
/// cached copy). The result is sorted by [`chronological`]; the sort is
/// stable, so entries that compare equal keep their union order (existing
/// first, then new incoming entries in arrival order).
pub fn merge_by_id(existing: &[Message], incoming: &[Message]) -> Vec<Message> {
    let mut merged: Vec<Message> = Vec::with_capacity(existing.len() + incoming.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in existing.iter().chain(incoming.iter()) {
        match index.get(m.id.as_str()) {
            Some(&i) => merged[i] = m.clone(),
            None => {
                index.insert(m.id.as_str().to_string(), merged.len());
                merged.push(m.clone());
            }
        }
    }

    merged.sort_by(chronological);
    merged
}

/// Temporal ordering with the tie-break contract:
/// parsed `created_at` ascending; a parsable timestamp sorts before an
/// unparsable one; equal or unparsable timestamps fall back to numeric id
/// comparison; non-numeric ids compare equal (stable order preserved).
pub fn chronological(a: &Message, b: &Message) -> Ordering {
    match (
        parse_created_at(&a.created_at),
        parse_created_at(&b.created_at),
    ) {
        (Some(ta), Some(tb)) => ta.cmp(&tb).then_with(|| numeric_id_order(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => numeric_id_order(a, b),
    }
}

fn numeric_id_order(a: &Message, b: &Message) -> Ordering {
    match (a.id.numeric(), b.id.numeric()) {
        (Some(ia), Some(ib)) => ia.cmp(&ib),
        _ => Ordering::Equal,
    }
}

/// Highest numeric id in the list; non-numeric (placeholder) ids contribute
/// nothing. 0 when the list has no numeric ids, meaning "fetch from the
/// beginning".
pub fn max_numeric_id(list: &[Message]) -> u64 {
    list.iter().filter_map(|m| m.id.numeric()).max().unwrap_or(0)
}

/// Entries of `fetched` whose id is not already present in `existing`.
pub fn only_new(existing: &[Message], fetched: &[Message]) -> Vec<Message> {
    let seen: HashSet<&str> = existing.iter().map(|m| m.id.as_str()).collect();
    fetched
        .iter()
        .filter(|m| !seen.contains(m.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatId, MessageId};

    fn msg(id: &str, created_at: &str, content: &str) -> Message {
        Message {
            id: MessageId::from(id),
            chat_id: ChatId::from("c1"),
            sender: "alice".into(),
            content: Some(content.into()),
            image_url: None,
            created_at: created_at.into(),
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let a = vec![
            msg("1", "2024-01-01T10:00:00Z", "hello"),
            msg("3", "2024-01-01T10:10:00Z", "later"),
        ];
        let b = vec![
            msg("2", "2024-01-01T10:05:00Z", "world"),
            msg("3", "2024-01-01T10:10:00Z", "later edited"),
        ];

        let once = merge_by_id(&a, &b);
        let twice = merge_by_id(&once, &b);
        assert_eq!(once, twice);
    }

    #[test]
    fn dedup_by_id_incoming_wins() {
        let a = vec![msg("1", "2024-01-01T10:00:00Z", "stale")];
        let b = vec![msg("1", "2024-01-01T10:00:00Z", "fresh")];

        let merged = merge_by_id(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content.as_deref(), Some("fresh"));
    }

    #[test]
    fn sorted_by_timestamp_ascending() {
        let a = vec![msg("5", "2024-01-01T12:00:00Z", "noon")];
        let b = vec![
            msg("2", "2024-01-01T09:00:00Z", "morning"),
            msg("7", "2024-01-01T15:00:00Z", "afternoon"),
        ];

        let merged = merge_by_id(&a, &b);
        let contents: Vec<_> = merged.iter().map(|m| m.content.as_deref()).collect();
        assert_eq!(
            contents,
            vec![Some("morning"), Some("noon"), Some("afternoon")]
        );
    }

    #[test]
    fn sort_invariant_holds_for_adjacent_pairs() {
        let a = vec![
            msg("4", "not-a-date", "d"),
            msg("2", "2024-01-01T10:00:00Z", "b"),
        ];
        let b = vec![
            msg("1", "2024-01-01T10:00:00Z", "a"),
            msg("3", "also-garbage", "c"),
        ];

        let merged = merge_by_id(&a, &b);
        for pair in merged.windows(2) {
            assert_ne!(chronological(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
        }
        // Parsable timestamps first, then unparsable in id order.
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn equal_timestamps_fall_back_to_numeric_id() {
        let merged = merge_by_id(
            &[msg("12", "2024-01-01T10:00:00Z", "second")],
            &[msg("3", "2024-01-01T10:00:00Z", "first")],
        );
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "12"]);
    }

    #[test]
    fn placeholders_keep_stable_order_against_each_other() {
        let p1 = msg("temp-aaa", "bogus", "one");
        let p2 = msg("temp-bbb", "bogus", "two");

        let merged = merge_by_id(&[p1.clone(), p2.clone()], &[]);
        assert_eq!(merged, vec![p1, p2]);
    }

    #[test]
    fn max_numeric_id_ignores_placeholders() {
        let list = vec![
            msg("2", "2024-01-01T10:00:00Z", "a"),
            msg("temp-xyz", "2024-01-01T10:01:00Z", "pending"),
            msg("41", "2024-01-01T10:02:00Z", "b"),
        ];
        assert_eq!(max_numeric_id(&list), 41);
        assert_eq!(max_numeric_id(&[]), 0);
    }

    #[test]
    fn only_new_filters_known_ids() {
        let existing = vec![msg("1", "2024-01-01T10:00:00Z", "a")];
        let fetched = vec![
            msg("1", "2024-01-01T10:00:00Z", "a"),
            msg("2", "2024-01-01T10:05:00Z", "b"),
        ];
        let fresh = only_new(&existing, &fetched);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id.as_str(), "2");
    }
}
