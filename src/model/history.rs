use serde::{Deserialize, Serialize};

/// A pull request the workflow created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub url: String,
}

/// Append-only list of created pull requests, oldest first.
///
/// Storage is unbounded; [`PullRequestHistory::recent`] is what the panel
/// shows, capped by `general.history_display_limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestHistory {
    records: Vec<PullRequestRecord>,
}

impl PullRequestHistory {
    pub fn push(&mut self, url: impl Into<String>) {
        self.records.push(PullRequestRecord { url: url.into() });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PullRequestRecord] {
        &self.records
    }

    /// The newest `limit` records, still in insertion order.
    pub fn recent(&self, limit: usize) -> &[PullRequestRecord] {
        let start = self.records.len().saturating_sub(limit);
        &self.records[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_keeps_insertion_order_and_cap() {
        let mut history = PullRequestHistory::default();
        for n in 1..=5 {
            history.push(format!("https://github.com/o/r/pull/{n}"));
        }

        let urls: Vec<&str> = history.recent(3).iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://github.com/o/r/pull/3",
                "https://github.com/o/r/pull/4",
                "https://github.com/o/r/pull/5",
            ]
        );
        assert_eq!(history.len(), 5);
        assert_eq!(history.recent(50).len(), 5);
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut history = PullRequestHistory::default();
        history.push("https://github.com/o/r/pull/7");
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"[{"url":"https://github.com/o/r/pull/7"}]"#);
    }
}
