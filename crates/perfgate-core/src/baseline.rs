//! Compare two report artifacts probe by probe.

use crate::model::Classification;
use crate::report::json::ReportArtifact;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub name: String,
    pub before: Classification,
    pub after: Classification,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BaselineDiff {
    pub baseline_timestamp: String,
    /// Severity went up. Current report order.
    pub regressions: Vec<StatusChange>,
    pub improvements: Vec<StatusChange>,
    /// Present now, absent from the baseline.
    pub new_probes: Vec<String>,
    /// Present in the baseline, absent now.
    pub missing_probes: Vec<String>,
}

impl BaselineDiff {
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.regressions.is_empty()
            && self.improvements.is_empty()
            && self.new_probes.is_empty()
            && self.missing_probes.is_empty()
    }
}

pub fn compare(previous: &ReportArtifact, current: &ReportArtifact) -> BaselineDiff {
    let before: BTreeMap<&str, Classification> = previous
        .tests
        .iter()
        .map(|t| (t.name.as_str(), t.status))
        .collect();

    let mut diff = BaselineDiff {
        baseline_timestamp: previous.timestamp.clone(),
        ..Default::default()
    };

    for t in &current.tests {
        let Some(&was) = before.get(t.name.as_str()) else {
            diff.new_probes.push(t.name.clone());
            continue;
        };
        let change = StatusChange {
            name: t.name.clone(),
            before: was,
            after: t.status,
        };
        if t.status > was {
            diff.regressions.push(change);
        } else if t.status < was {
            diff.improvements.push(change);
        }
    }

    for t in &previous.tests {
        if !current.tests.iter().any(|c| c.name == t.name) {
            diff.missing_probes.push(t.name.clone());
        }
    }

    diff
}
