//! Pure rank resolution over a sibling-set snapshot.
//!
//! Siblings are ordered by the numeric suffix the coordination service
//! assigned at creation time; the first name in that order is the leader.

use crate::Error;

/// A participant's position within the current sibling set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rank {
    /// Zero-based index after sorting; 0 means leader.
    pub index: usize,
    /// Leaf name of the node currently ranked first.
    pub leader: String,
}

impl Rank {
    pub fn is_leader(&self) -> bool {
        self.index == 0
    }
}

/// Parse the sequence suffix of a node leaf name: the substring after the
/// last `_`. Malformed names sort as 0 rather than failing the whole
/// resolution.
pub fn sequence_suffix(name: &str) -> u64 {
    match name.rsplit_once('_') {
        Some((_, suffix)) => suffix.parse().unwrap_or(0),
        None => 0,
    }
}

/// Leaf name of a full node path.
pub fn node_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Compute this participant's rank within `siblings`.
///
/// Ordering is ascending by sequence suffix, with equal suffixes broken by
/// lexical order of the full name so the result is deterministic.
///
/// # Errors
///
/// `Error::SelfNotFound` if `own_name` is absent from the snapshot, the
/// empty snapshot included. Callers must treat that as fatal: the node
/// vanished without this process's knowledge (session expiry).
pub fn resolve(siblings: &[String], own_name: &str) -> Result<Rank, Error> {
    let mut ordered: Vec<&str> = siblings.iter().map(String::as_str).collect();
    ordered.sort_by(|a, b| {
        sequence_suffix(a)
            .cmp(&sequence_suffix(b))
            .then_with(|| a.cmp(b))
    });

    let index = ordered
        .iter()
        .position(|name| *name == own_name)
        .ok_or_else(|| Error::SelfNotFound(own_name.to_string()))?;

    // Non-empty by the lookup above.
    let leader = ordered[0].to_string();

    Ok(Rank { index, leader })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sequence_suffix_parses_trailing_number() {
        assert_eq!(sequence_suffix("guid-n_0000000007"), 7);
        assert_eq!(sequence_suffix("guid-n_42"), 42);
    }

    #[test]
    fn test_sequence_suffix_malformed_sorts_as_zero() {
        assert_eq!(sequence_suffix("no-separator"), 0);
        assert_eq!(sequence_suffix("guid-n_notanumber"), 0);
        assert_eq!(sequence_suffix(""), 0);
    }

    #[test]
    fn test_node_basename() {
        assert_eq!(node_basename("/election/guid-n_0000000001"), "guid-n_0000000001");
        assert_eq!(node_basename("bare-name"), "bare-name");
    }

    #[test]
    fn test_resolve_orders_by_suffix_not_lexically() {
        // Lexical order would put _10 before _9.
        let siblings = names(&["guid-n_10", "guid-n_9", "guid-n_11"]);
        let rank = resolve(&siblings, "guid-n_10").unwrap();
        assert_eq!(rank.leader, "guid-n_9");
        assert_eq!(rank.index, 1);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let siblings = names(&["guid-n_3", "guid-n_1", "guid-n_2"]);
        let first = resolve(&siblings, "guid-n_2").unwrap();
        let second = resolve(&siblings, "guid-n_2").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.leader, "guid-n_1");
    }

    #[test]
    fn test_resolve_exactly_one_leader() {
        let siblings = names(&["guid-n_5", "guid-n_2", "guid-n_8"]);
        let leaders: Vec<String> = siblings
            .iter()
            .map(|own| resolve(&siblings, own).unwrap())
            .filter(|rank| rank.is_leader())
            .map(|rank| rank.leader)
            .collect();
        assert_eq!(leaders, vec!["guid-n_2".to_string()]);
    }

    #[test]
    fn test_resolve_breaks_suffix_ties_lexically() {
        // Equal suffixes should not occur, but the order must still be
        // deterministic when they do.
        let siblings = names(&["b_1", "a_1"]);
        let rank = resolve(&siblings, "b_1").unwrap();
        assert_eq!(rank.leader, "a_1");
        assert_eq!(rank.index, 1);
    }

    #[test]
    fn test_resolve_own_name_missing_is_self_not_found() {
        let siblings = names(&["guid-n_1", "guid-n_2"]);
        let err = resolve(&siblings, "guid-n_3").unwrap_err();
        assert!(matches!(err, Error::SelfNotFound(name) if name == "guid-n_3"));
    }

    #[test]
    fn test_resolve_empty_set_is_self_not_found() {
        let err = resolve(&[], "guid-n_1").unwrap_err();
        assert!(matches!(err, Error::SelfNotFound(name) if name == "guid-n_1"));
    }

    #[test]
    fn test_resolve_three_node_scenario() {
        let siblings = names(&["guid-n_1", "guid-n_2", "guid-n_3"]);

        let a = resolve(&siblings, "guid-n_1").unwrap();
        assert_eq!((a.index, a.leader.as_str()), (0, "guid-n_1"));

        let c = resolve(&siblings, "guid-n_3").unwrap();
        assert_eq!((c.index, c.leader.as_str()), (2, "guid-n_1"));

        // After the leader crashes and its node is removed.
        let survivors = names(&["guid-n_2", "guid-n_3"]);
        let b = resolve(&survivors, "guid-n_2").unwrap();
        assert_eq!((b.index, b.leader.as_str()), (0, "guid-n_2"));
    }
}
