use std::collections::HashSet;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUseRecord {
    pub name: String,
    pub first_seen: DateTime<Utc>,
}

/// Per-run set of tool names already announced on the progress sink.
///
/// Policy is "first occurrence only": a name is reported once per run no
/// matter how many tool invocations use it.
#[derive(Debug, Default)]
pub struct ToolUseTracker {
    seen: HashSet<String>,
    records: Vec<ToolUseRecord>,
}

impl ToolUseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `name` is observed.
    pub fn observe(&mut self, name: &str) -> bool {
        if !self.seen.insert(name.to_string()) {
            return false;
        }
        self.records.push(ToolUseRecord {
            name: name.to_string(),
            first_seen: Utc::now(),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Records ordered by first sighting.
    pub fn records(&self) -> &[ToolUseRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_names_are_reported_once() {
        let mut t = ToolUseTracker::new();
        assert!(t.observe("Read"));
        assert!(!t.observe("Read"));
        assert!(t.observe("Edit"));
        assert!(!t.observe("Read"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn records_keep_first_seen_order() {
        let mut t = ToolUseTracker::new();
        t.observe("Bash");
        t.observe("Grep");
        t.observe("Bash");
        let names: Vec<&str> = t.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bash", "Grep"]);
    }
}
