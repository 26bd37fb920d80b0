use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a submission.
///
/// A submission is `Pending` from creation until exactly one transition to
/// `Processed` (grading ran to completion) or `Error` (grading infrastructure
/// failed). Both are terminal; rows never move back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Processed,
    Error,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Processed => "processed",
            SubmissionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A graded or in-flight submission row. The store assigns `id` and
/// `last_updated`; `grader_feedback` and `correct` stay `None` until the
/// submission reaches a terminal state (or is created via the dedup
/// shortcut, which copies them from the matching row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub user_id: String,
    pub code: String,
    pub status: SubmissionStatus,
    pub grader_feedback: Option<String>,
    pub correct: Option<bool>,
    pub last_updated: DateTime<Utc>,
}

/// Fields for a submission row about to be inserted. The store fills in
/// the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub assignment_id: Uuid,
    pub user_id: String,
    pub code: String,
    pub status: SubmissionStatus,
    pub grader_feedback: Option<String>,
    pub correct: Option<bool>,
}

impl NewSubmission {
    /// A fresh submission awaiting grading.
    pub fn pending(assignment_id: Uuid, code: &str, user_id: &str) -> Self {
        Self {
            assignment_id,
            user_id: user_id.to_string(),
            code: code.to_string(),
            status: SubmissionStatus::Pending,
            grader_feedback: None,
            correct: None,
        }
    }

    /// A row created directly in `processed` state, copying the graded
    /// result from an identical earlier submission.
    pub fn processed_copy(
        assignment_id: Uuid,
        code: &str,
        user_id: &str,
        graded: &Submission,
    ) -> Self {
        Self {
            assignment_id,
            user_id: user_id.to_string(),
            code: code.to_string(),
            status: SubmissionStatus::Processed,
            grader_feedback: graded.grader_feedback.clone(),
            correct: graded.correct,
        }
    }
}

/// A read-only test case owned by an assignment.
///
/// `input` is opaque text handed to the submission unmodified.
/// `expected_output` is a serialized JSON value compared structurally
/// against the submission's actual output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub expected_output: String,
}
