//! Topic content deduplication.

use daybook_model::RecordMap;
use std::collections::HashMap;

/// Enforces the topic content-identity invariant: across the whole
/// collection, no two live topics share the same normalized content.
///
/// Entries are scanned in stable insertion order with a content→id map.
/// When a content value is seen again, the later-updated entry survives
/// under its own id (an unstamped incumbent always yields); the losing id
/// is removed from the result entirely, not tombstoned. Tombstoned topics
/// do not participate and pass through untouched, so deletions still
/// propagate.
#[must_use]
pub fn dedup_topics(topics: &RecordMap) -> RecordMap {
    let mut out = RecordMap::new();
    let mut by_content: HashMap<String, String> = HashMap::new();

    for (id, topic) in topics {
        if topic.is_deleted() {
            out.insert(id.clone(), topic.clone());
            continue;
        }

        let content = topic.normalized_data().to_string();
        match by_content.get(&content) {
            None => {
                by_content.insert(content, id.clone());
                out.insert(id.clone(), topic.clone());
            }
            Some(holder_id) => {
                let replace = match out.get(holder_id) {
                    Some(holder) => holder.updated.is_none() || topic.updated > holder.updated,
                    None => true,
                };
                if replace {
                    out.shift_remove(holder_id);
                    by_content.insert(content, id.clone());
                    out.insert(id.clone(), topic.clone());
                }
                // Otherwise the incoming duplicate is discarded.
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_model::Record;

    fn topics(entries: &[(&str, Record)]) -> RecordMap {
        entries
            .iter()
            .map(|(id, r)| (id.to_string(), r.clone()))
            .collect()
    }

    #[test]
    fn distinct_contents_all_survive() {
        let map = topics(&[
            ("a", Record::new("#work").with_updated(1)),
            ("b", Record::new("#home").with_updated(2)),
        ]);
        let deduped = dedup_topics(&map);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn later_updated_duplicate_replaces_earlier() {
        let map = topics(&[
            ("a", Record::new("#work").with_updated(1)),
            ("b", Record::new("#work").with_updated(2)),
        ]);
        let deduped = dedup_topics(&map);
        assert_eq!(deduped.len(), 1);
        assert!(deduped.contains_key("b"));
        assert!(!deduped.contains_key("a"));
    }

    #[test]
    fn earlier_updated_duplicate_is_discarded() {
        let map = topics(&[
            ("a", Record::new("#work").with_updated(5)),
            ("b", Record::new("#work").with_updated(3)),
        ]);
        let deduped = dedup_topics(&map);
        assert_eq!(deduped.len(), 1);
        assert!(deduped.contains_key("a"));
    }

    #[test]
    fn unstamped_incumbent_always_yields() {
        // Local topic "#work" never saved; remote copy stamped. Only the
        // stamped id survives.
        let map = topics(&[
            ("x", Record::new("#work")),
            ("y", Record::new("#work").with_updated(1_704_067_200_000)),
        ]);
        let deduped = dedup_topics(&map);
        assert_eq!(deduped.len(), 1);
        assert!(deduped.contains_key("y"));
    }

    #[test]
    fn normalization_catches_whitespace_duplicates() {
        let map = topics(&[
            ("a", Record::new("#work").with_updated(1)),
            ("b", Record::new("  #work  ").with_updated(2)),
        ]);
        let deduped = dedup_topics(&map);
        assert_eq!(deduped.len(), 1);
        assert!(deduped.contains_key("b"));
    }

    #[test]
    fn tombstones_pass_through() {
        let map = topics(&[
            ("a", Record::new("#work").with_updated(1).tombstone(2)),
            ("b", Record::new("#work").with_updated(3)),
        ]);
        let deduped = dedup_topics(&map);
        assert_eq!(deduped.len(), 2);
        assert!(deduped["a"].is_deleted());
        assert!(!deduped["b"].is_deleted());
    }

    #[test]
    fn survivor_takes_the_losers_position_rule() {
        // The loser is removed and the winner inserted at the end of the
        // scan so far; order stays deterministic.
        let map = topics(&[
            ("a", Record::new("#work").with_updated(1)),
            ("b", Record::new("#life").with_updated(2)),
            ("c", Record::new("#work").with_updated(3)),
        ]);
        let deduped = dedup_topics(&map);
        let ids: Vec<&str> = deduped.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
