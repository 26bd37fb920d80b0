/// Submission store boundary - defines only persistence semantics, not
/// grading logic. Ensures the queue coordinator and the HTTP layer never
/// drift on row lifecycle, and keeps the relational schema external to
/// this workspace.

use crate::error::StoreError;
use crate::types::{NewSubmission, Submission, SubmissionStatus, TestCase};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence operations consumed by the grading pipeline.
///
/// Authoritative submission state lives behind this trait; the coordinator
/// only holds transient references to enqueued rows.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Whether the user has any submission still in `pending` state.
    async fn has_pending(&self, user_id: &str) -> Result<bool, StoreError>;

    /// An already-graded submission with identical assignment and code, if
    /// any. Code matching is exact byte equality - no whitespace
    /// normalization - mirroring a SQL `code = $1` filter.
    async fn find_processed_duplicate(
        &self,
        assignment_id: Uuid,
        code: &str,
    ) -> Result<Option<Submission>, StoreError>;

    /// Insert a row, assigning its id and `last_updated`.
    async fn insert(&self, new: NewSubmission) -> Result<Submission, StoreError>;

    /// Write a grading outcome. Returns `None` when the row no longer
    /// exists (deleted while grading was in flight), which callers treat
    /// as a benign no-op.
    async fn update_result(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        grader_feedback: &str,
        correct: bool,
    ) -> Result<Option<Submission>, StoreError>;

    /// Test cases for an assignment, in grading order.
    async fn list_test_cases(&self, assignment_id: Uuid) -> Result<Vec<TestCase>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;

    /// A user's submissions for one assignment, newest first.
    async fn list_for_user(
        &self,
        user_id: &str,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;

    /// 100 points per distinct assignment the user has solved correctly.
    async fn user_points(&self, user_id: &str) -> Result<u64, StoreError>;
}

#[derive(Default)]
struct Tables {
    submissions: Vec<Submission>,
    test_cases: HashMap<Uuid, Vec<TestCase>>,
}

/// In-memory reference store. Backs the API binary and the pipeline tests;
/// a relational implementation swaps in behind the same trait.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an assignment's test cases. Assignment CRUD proper lives
    /// outside this subsystem; the store only needs the cases to grade
    /// against.
    pub async fn put_assignment(&self, assignment_id: Uuid, test_cases: Vec<TestCase>) {
        self.tables
            .write()
            .await
            .test_cases
            .insert(assignment_id, test_cases);
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn has_pending(&self, user_id: &str) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .iter()
            .any(|s| s.user_id == user_id && s.status == SubmissionStatus::Pending))
    }

    async fn find_processed_duplicate(
        &self,
        assignment_id: Uuid,
        code: &str,
    ) -> Result<Option<Submission>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .iter()
            .find(|s| {
                s.assignment_id == assignment_id
                    && s.code == code
                    && s.status == SubmissionStatus::Processed
            })
            .cloned())
    }

    async fn insert(&self, new: NewSubmission) -> Result<Submission, StoreError> {
        let submission = Submission {
            id: Uuid::new_v4(),
            assignment_id: new.assignment_id,
            user_id: new.user_id,
            code: new.code,
            status: new.status,
            grader_feedback: new.grader_feedback,
            correct: new.correct,
            last_updated: Utc::now(),
        };
        self.tables
            .write()
            .await
            .submissions
            .push(submission.clone());
        Ok(submission)
    }

    async fn update_result(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        grader_feedback: &str,
        correct: bool,
    ) -> Result<Option<Submission>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(submission) = tables.submissions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        submission.status = status;
        submission.grader_feedback = Some(grader_feedback.to_string());
        submission.correct = Some(correct);
        submission.last_updated = Utc::now();
        Ok(Some(submission.clone()))
    }

    async fn list_test_cases(&self, assignment_id: Uuid) -> Result<Vec<TestCase>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .test_cases
            .get(&assignment_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Submission> = tables
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && s.assignment_id == assignment_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(idx) = tables.submissions.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        Ok(Some(tables.submissions.remove(idx)))
    }

    async fn user_points(&self, user_id: &str) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        let mut solved: Vec<Uuid> = tables
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && s.correct == Some(true))
            .map(|s| s.assignment_id)
            .collect();
        solved.sort();
        solved.dedup();
        Ok(solved.len() as u64 * 100)
    }
}
