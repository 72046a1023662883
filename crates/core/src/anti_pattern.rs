//! Query-plan anti-pattern signatures.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A recognized inefficient plan shape, stored as its snake_case tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiPattern {
    /// Full table read (`Seq Scan`, including parallel variants).
    SequentialScan,
    /// Nested-loop join; quadratic on unindexed inner relations.
    NestedLoop,
    /// Explicit sort node the planner could not avoid with an index.
    ExplicitSort,
    /// Correlated subquery executed per outer row.
    CorrelatedSubplan,
}

/// Plan-text markers, checked as plain substrings of each plan row.
const SIGNATURES: &[(&str, AntiPattern)] = &[
    ("Seq Scan", AntiPattern::SequentialScan),
    ("Nested Loop", AntiPattern::NestedLoop),
    ("Sort Key:", AntiPattern::ExplicitSort),
    ("SubPlan", AntiPattern::CorrelatedSubplan),
];

impl AntiPattern {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SequentialScan => "sequential_scan",
            Self::NestedLoop => "nested_loop",
            Self::ExplicitSort => "explicit_sort",
            Self::CorrelatedSubplan => "correlated_subplan",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::SequentialScan, Self::NestedLoop, Self::ExplicitSort, Self::CorrelatedSubplan]
    }
}

impl fmt::Display for AntiPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AntiPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown anti-pattern tag: {s}"))
    }
}

/// Scan plan rows for known anti-pattern signatures.
///
/// Each row is inspected through its JSON text, so the function works for
/// the `{"QUERY PLAN": "..."}` rows returned by a plain `EXPLAIN` as well as
/// for bare strings.
#[must_use]
pub fn detect_anti_patterns(plan_rows: &[serde_json::Value]) -> BTreeSet<AntiPattern> {
    let mut found = BTreeSet::new();
    for row in plan_rows {
        let text = match row {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        for (marker, pattern) in SIGNATURES {
            if text.contains(marker) {
                found.insert(*pattern);
            }
        }
    }
    found
}
