//! Search query expansion for a research topic.

use tracing::debug;

use researchdesk_shared::{Constraints, ResearchDeskError, Result};

/// Expand a topic into search queries.
///
/// The first query is the topic plus any date constraints (`after:` /
/// `before:`); the others bias towards government sites and PDFs.
pub fn optimize_queries(topic: &str, constraints: &Constraints) -> Result<Vec<String>> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ResearchDeskError::validation("topic must not be empty"));
    }

    let mut base = vec![topic.to_string()];
    if let Some(start) = constraints.date_start.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        base.push(format!("after:{start}"));
    }
    if let Some(end) = constraints.date_end.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        base.push(format!("before:{end}"));
    }

    let queries = vec![
        base.join(" "),
        format!("{topic} site:gov"),
        format!("{topic} filetype:pdf"),
    ];
    debug!(?queries, "optimized queries");
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_topic() {
        let queries = optimize_queries("  flow state ", &Constraints::default()).unwrap();
        assert_eq!(
            queries,
            vec![
                "flow state",
                "flow state site:gov",
                "flow state filetype:pdf"
            ]
        );
    }

    #[test]
    fn date_constraints_only_touch_base_query() {
        let constraints = Constraints {
            date_start: Some("2020-01-01".into()),
            date_end: Some("2024-12-31".into()),
        };
        let queries = optimize_queries("flow", &constraints).unwrap();
        assert_eq!(queries[0], "flow after:2020-01-01 before:2024-12-31");
        assert_eq!(queries[1], "flow site:gov");
    }

    #[test]
    fn blank_constraints_are_ignored() {
        let constraints = Constraints {
            date_start: Some("  ".into()),
            date_end: None,
        };
        assert_eq!(optimize_queries("flow", &constraints).unwrap()[0], "flow");
    }

    #[test]
    fn empty_topic_is_rejected() {
        let err = optimize_queries("   ", &Constraints::default()).unwrap_err();
        assert!(err.to_string().contains("topic"));
    }
}
