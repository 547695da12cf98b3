//! Diagnostics for a round in which no message was consumed.

use rlmeta_engine::{truncate, MatchFailure, Value};
use std::fmt;

/// One failed (component, message) attempt.
#[derive(Debug, Clone)]
pub struct FailureEntry {
    /// Component name and state, already truncated.
    pub component: String,
    pub failure: MatchFailure,
}

/// Every failed attempt of the final round, furthest failure first.
#[derive(Debug, Clone, Default)]
pub struct StuckReport {
    entries: Vec<FailureEntry>,
    width: usize,
}

impl StuckReport {
    pub fn new(mut entries: Vec<FailureEntry>, width: usize) -> Self {
        // Stable: attempts at the same position keep round order.
        entries.sort_by(|a, b| b.failure.position.cmp(&a.failure.position));
        Self { entries, width }
    }

    pub fn entries(&self) -> &[FailureEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for StuckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let items = Value::Seq(entry.failure.items.clone()).repr();
            writeln!(f, "{}", entry.component)?;
            writeln!(
                f,
                "  {} at {}",
                entry.failure.description, entry.failure.position
            )?;
            writeln!(f, "  {}", truncate(&items, self.width))?;
            writeln!(f)?;
        }
        write!(f, "No message processed.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlmeta_engine::Sequence;

    fn entry(name: &str, position: usize) -> FailureEntry {
        let items: Sequence = vec![Value::str("Ping"), Value::from(1)].into();
        FailureEntry {
            component: name.to_string(),
            failure: MatchFailure::new("expected \"Pong\"", items, position),
        }
    }

    #[test]
    fn entries_sorted_furthest_first() {
        let report = StuckReport::new(vec![entry("A", 0), entry("B", 1), entry("C", 0)], 60);
        let names: Vec<_> = report.entries().iter().map(|e| e.component.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn display_ends_with_summary() {
        let report = StuckReport::new(vec![entry("A", 1)], 8);
        let text = report.to_string();
        assert!(text.starts_with("A\n  expected \"Pong\" at 1\n  [\"Ping\", ...\n"));
        assert!(text.ends_with("No message processed."));
    }
}
