use std::cmp::Ordering;

use deunicode::deunicode;

use crate::schedule::EvaluationResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry<K> {
    pub key: K,
    pub name: String,
    pub result: EvaluationResult,
}

impl<K> RankEntry<K> {
    pub fn new(key: K, name: impl Into<String>, result: EvaluationResult) -> Self {
        Self {
            key,
            name: name.into(),
            result,
        }
    }
}

pub fn collation_key(name: &str) -> String {
    deunicode(name).to_lowercase()
}

/// Status priority, then urgency, then name. The key settles anything left
/// so two distinct entries never compare equal.
pub fn compare<K: Ord>(a: &RankEntry<K>, b: &RankEntry<K>) -> Ordering {
    a.result
        .status
        .priority()
        .cmp(&b.result.status.priority())
        .then_with(|| match (a.result.delta_days, b.result.delta_days) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => Ordering::Equal,
        })
        .then_with(|| collation_key(&a.name).cmp(&collation_key(&b.name)))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.key.cmp(&b.key))
}

#[tracing::instrument(skip(entries), fields(count = entries.len()))]
pub fn rank_entries<K: Ord>(mut entries: Vec<RankEntry<K>>) -> Vec<RankEntry<K>> {
    entries.sort_by(compare);
    entries
}

pub fn rank<K: Ord + Clone>(entries: &[RankEntry<K>]) -> Vec<K> {
    let mut order: Vec<&RankEntry<K>> = entries.iter().collect();
    order.sort_by(|a, b| compare(a, b));
    order.into_iter().map(|entry| entry.key.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::{RankEntry, collation_key, rank, rank_entries};
    use crate::datetime::CalendarDate;
    use crate::schedule::{CareSchedule, Status, evaluate};

    fn date(raw: &str) -> CalendarDate {
        raw.parse().expect("valid date")
    }

    fn entry(key: u32, name: &str, frequency: Option<i64>, last: Option<&str>) -> RankEntry<u32> {
        let schedule = CareSchedule::new(frequency, last.map(date));
        RankEntry::new(key, name, evaluate(&schedule, date("2026-02-17")))
    }

    fn mixed_collection() -> Vec<RankEntry<u32>> {
        vec![
            entry(1, "Zebra plant", None, None),
            entry(2, "aloe", Some(7), Some("2026-02-15")),
            entry(3, "Monstera", Some(3), None),
            entry(4, "Pothos", Some(7), Some("2026-02-07")),
            entry(5, "Calathea", Some(4), Some("2026-02-13")),
            entry(6, "Basil", Some(1), Some("2026-02-18")),
        ]
    }

    #[test]
    fn groups_by_status_then_urgency() {
        let ranked = rank_entries(mixed_collection());
        let summary: Vec<(Status, Option<i64>)> = ranked
            .iter()
            .map(|e| (e.result.status, e.result.delta_days))
            .collect();

        assert_eq!(
            summary,
            vec![
                (Status::Overdue, Some(-3)),
                (Status::DueToday, Some(0)),
                (Status::OnTrack, Some(2)),
                (Status::OnTrack, Some(5)),
                (Status::AwaitingFirstEvent, None),
                (Status::NoSchedule, None),
            ]
        );
        assert_eq!(rank(&mixed_collection()), vec![4, 5, 6, 2, 3, 1]);
    }

    #[test]
    fn ties_break_alphabetically_ignoring_case() {
        let entries = vec![
            entry(10, "snake plant", Some(7), Some("2026-02-10")),
            entry(11, "Aloe", Some(7), Some("2026-02-10")),
            entry(12, "begonia", Some(7), Some("2026-02-10")),
            entry(13, "Fern", None, None),
            entry(14, "cactus", None, None),
        ];
        assert_eq!(rank(&entries), vec![11, 12, 10, 14, 13]);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let entries = vec![
            entry(1, "Zamioculcas", None, None),
            entry(2, "Éucalyptus", None, None),
            entry(3, "Fern", None, None),
            entry(4, "eucalyptus", None, None),
        ];
        assert_eq!(rank(&entries), vec![4, 2, 3, 1]);
        assert_eq!(collation_key("Éucalyptus"), "eucalyptus");
    }

    #[test]
    fn identical_names_fall_back_to_key() {
        let entries = vec![
            entry(9, "Fern", Some(2), None),
            entry(3, "Fern", Some(2), None),
            entry(5, "fern", Some(2), None),
        ];
        assert_eq!(rank(&entries), vec![3, 9, 5]);
    }

    #[test]
    fn ranking_is_reproducible_for_any_input_order() {
        let expected = rank(&mixed_collection());
        let mut shuffled = mixed_collection();
        for _ in 0..shuffled.len() {
            shuffled.rotate_left(1);
            assert_eq!(rank(&shuffled), expected);
        }
        shuffled.reverse();
        assert_eq!(rank(&shuffled), expected);
    }
}
