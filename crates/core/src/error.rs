use std::fmt;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// What is wrong with a single field of an incoming reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    /// The field is absent or `null`.
    Missing,
    /// The field is present but has the wrong JSON type or is blank.
    WrongType,
    /// A measurement that does not parse as a number.
    NotNumeric,
    /// A measurement that parsed to NaN or infinity.
    NotFinite,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FieldProblem::Missing => "missing",
            FieldProblem::WrongType => "wrong type",
            FieldProblem::NotNumeric => "not numeric",
            FieldProblem::NotFinite => "not finite",
        };
        f.write_str(text)
    }
}

/// One rejected field, named by its wire name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: FieldProblem,
}

/// A reading rejected at the boundary. Lists every offending field, not just
/// the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe(.issues))]
pub struct ReadingError {
    pub issues: Vec<FieldIssue>,
}

impl ReadingError {
    /// Wire names of the rejected fields, in declaration order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|i| i.field).collect()
    }
}

fn describe(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{} ({})", i.field, i.problem))
        .collect::<Vec<_>>()
        .join(", ")
}
