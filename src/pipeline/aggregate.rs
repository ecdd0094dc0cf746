use crate::core::config::AggregationPolicy;

use super::types::Match;

/// One retrieved entry under a subject, still in relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub title: Option<String>,
    pub content: Option<String>,
    pub source_url: Option<String>,
    pub score: f32,
}

/// All entries contributed by matches sharing a subject (moon name).
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectGroup {
    pub subject: String,
    pub entries: Vec<GroupEntry>,
}

/// Groups matches by subject. Subject order is first-seen order among the
/// matches; within a subject, entries keep their received order. Matches
/// without a subject coalesce under the display default. Pure and
/// deterministic.
pub fn aggregate(matches: &[Match], policy: AggregationPolicy) -> Vec<SubjectGroup> {
    let mut groups: Vec<SubjectGroup> = Vec::new();

    for m in matches {
        let subject = m.metadata.moon_name_or_default().to_string();
        let entry = GroupEntry {
            title: m.metadata.title.clone(),
            content: m.metadata.content.clone(),
            source_url: m.metadata.source_url.clone(),
            score: m.score,
        };

        match groups.iter_mut().find(|group| group.subject == subject) {
            Some(group) => match policy {
                AggregationPolicy::AppendAll => group.entries.push(entry),
                AggregationPolicy::LastWins => {
                    group.entries.clear();
                    group.entries.push(entry);
                }
            },
            None => groups.push(SubjectGroup {
                subject,
                entries: vec![entry],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{ChunkMetadata, UNKNOWN_MOON};

    fn make_match(moon: Option<&str>, title: &str, source: &str, score: f32) -> Match {
        Match {
            id: format!("{}-{}", moon.unwrap_or("none"), title),
            metadata: ChunkMetadata {
                moon_name: moon.map(|s| s.to_string()),
                title: Some(title.to_string()),
                content: Some(format!("{} content", title)),
                source_url: Some(source.to_string()),
            },
            score,
        }
    }

    #[test]
    fn preserves_first_seen_subject_order_and_entry_order() {
        let matches = vec![
            make_match(Some("Europa"), "Ocean", "http://e/1", 0.9),
            make_match(Some("Io"), "Volcanism", "http://i/1", 0.8),
            make_match(Some("Europa"), "Ice shell", "http://e/2", 0.7),
        ];

        let groups = aggregate(&matches, AggregationPolicy::AppendAll);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].subject, "Europa");
        assert_eq!(groups[1].subject, "Io");
        assert_eq!(groups[0].entries.len(), 2);
        assert_eq!(groups[0].entries[0].title.as_deref(), Some("Ocean"));
        assert_eq!(groups[0].entries[1].title.as_deref(), Some("Ice shell"));
    }

    #[test]
    fn last_wins_keeps_only_the_most_recent_entry() {
        let matches = vec![
            make_match(Some("Europa"), "Ocean", "http://e/1", 0.9),
            make_match(Some("Europa"), "Ice shell", "http://e/2", 0.7),
        ];

        let groups = aggregate(&matches, AggregationPolicy::LastWins);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].entries.len(), 1);
        assert_eq!(groups[0].entries[0].title.as_deref(), Some("Ice shell"));
    }

    #[test]
    fn missing_subjects_coalesce_under_the_display_default() {
        let matches = vec![
            make_match(None, "A", "http://x/1", 0.9),
            make_match(None, "B", "http://x/2", 0.8),
        ];

        let groups = aggregate(&matches, AggregationPolicy::AppendAll);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].subject, UNKNOWN_MOON);
        assert_eq!(groups[0].entries.len(), 2);
    }

    #[test]
    fn aggregation_is_idempotent_over_the_same_input() {
        let matches = vec![
            make_match(Some("Io"), "Volcanism", "http://i/1", 0.8),
            make_match(Some("Europa"), "Ocean", "http://e/1", 0.7),
        ];

        let first = aggregate(&matches, AggregationPolicy::AppendAll);
        let second = aggregate(&matches, AggregationPolicy::AppendAll);

        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_produces_no_groups() {
        assert!(aggregate(&[], AggregationPolicy::AppendAll).is_empty());
    }
}
