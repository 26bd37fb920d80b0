/// Grader - Per-Submission Scoring Glue
///
/// Runs a submission against every test case of its assignment and folds
/// the outcomes into one graded result. This module is the glue layer - it
/// knows nothing about:
/// - How code executes (the execution strategy's job)
/// - How outputs are compared (the comparator's job)
/// - How feedback text is laid out (the formatter's job)
///
/// **Failure Semantics:**
/// A failing or crashing test case is contained in its own TestResult and
/// never aborts the remaining cases. The grader itself only errors when it
/// cannot fetch the test cases - an infrastructure failure the coordinator
/// turns into a terminal `error` status.

use crate::compare::compare;
use crate::executor::ExecutionStrategy;
use crate::feedback::{format_feedback, TestResult};
use codify_common::error::StoreError;
use codify_common::store::SubmissionStore;
use codify_common::types::{Submission, TestCase};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Final grading outcome persisted onto the submission row.
#[derive(Debug, Clone)]
pub struct GradeOutcome {
    pub feedback: String,
    pub correct: bool,
}

pub struct Grader {
    store: Arc<dyn SubmissionStore>,
    strategy: Arc<dyn ExecutionStrategy>,
}

impl Grader {
    pub fn new(store: Arc<dyn SubmissionStore>, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        Self { store, strategy }
    }

    /// Grade one submission against all of its assignment's test cases,
    /// in store order. `correct` is the AND over all per-test outcomes.
    pub async fn grade(&self, submission: &Submission) -> Result<GradeOutcome, StoreError> {
        let test_cases = self
            .store
            .list_test_cases(submission.assignment_id)
            .await?;

        debug!(
            submission_id = %submission.id,
            assignment_id = %submission.assignment_id,
            test_cases = test_cases.len(),
            "Grading submission"
        );

        let mut all_tests_passing = true;
        let mut results = Vec::with_capacity(test_cases.len());

        for test_case in &test_cases {
            let result = self.run_test(submission, test_case).await;
            all_tests_passing = all_tests_passing && result.passed;
            results.push(result);
        }

        Ok(GradeOutcome {
            feedback: format_feedback(&results),
            correct: all_tests_passing,
        })
    }

    async fn run_test(&self, submission: &Submission, test_case: &TestCase) -> TestResult {
        let actual = match self
            .strategy
            .execute(&submission.code, &test_case.input)
            .await
        {
            Ok(value) => value,
            Err(error) => {
                debug!(
                    submission_id = %submission.id,
                    test_name = %test_case.name,
                    error = %error,
                    "Test execution failed"
                );
                return TestResult::errored(&test_case.name, &error.to_string());
            }
        };

        let expected: Value = match serde_json::from_str(&test_case.expected_output) {
            Ok(value) => value,
            Err(error) => {
                return TestResult::errored(
                    &test_case.name,
                    &format!("invalid expected output: {error}"),
                );
            }
        };

        if compare(&actual, &expected) {
            TestResult::pass(&test_case.name, &test_case.input, expected, actual)
        } else {
            TestResult::fail(&test_case.name, &test_case.input, expected, actual)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionError;
    use async_trait::async_trait;
    use codify_common::store::MemoryStore;
    use codify_common::types::{NewSubmission, SubmissionStatus};
    use serde_json::json;
    use uuid::Uuid;

    /// Strategy driven by a plain closure, standing in for real execution.
    struct FnStrategy<F>(F);

    #[async_trait]
    impl<F> ExecutionStrategy for FnStrategy<F>
    where
        F: Fn(&str, &str) -> Result<Value, ExecutionError> + Send + Sync,
    {
        async fn execute(&self, code: &str, input: &str) -> Result<Value, ExecutionError> {
            (self.0)(code, input)
        }
    }

    fn doubling_strategy() -> Arc<dyn ExecutionStrategy> {
        Arc::new(FnStrategy(|_code: &str, input: &str| {
            let n: i64 = input.trim().parse().map_err(|_| {
                ExecutionError::InvalidOutput(format!("bad input: {input}"))
            })?;
            Ok(json!(n * 2))
        }))
    }

    async fn store_with_cases(cases: Vec<TestCase>) -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let assignment = Uuid::new_v4();
        store.put_assignment(assignment, cases).await;
        (store, assignment)
    }

    fn submission(assignment_id: Uuid, code: &str) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            assignment_id,
            user_id: "alice".to_string(),
            code: code.to_string(),
            status: SubmissionStatus::Pending,
            grader_feedback: None,
            correct: None,
            last_updated: chrono::Utc::now(),
        }
    }

    fn case(name: &str, input: &str, expected: &str) -> TestCase {
        TestCase {
            name: name.to_string(),
            input: input.to_string(),
            expected_output: expected.to_string(),
        }
    }

    #[tokio::test]
    async fn test_all_passing_is_correct() {
        let (store, assignment) =
            store_with_cases(vec![case("double", "5", "10"), case("zero", "0", "0")]).await;
        let grader = Grader::new(store, doubling_strategy());

        let outcome = grader.grade(&submission(assignment, "code")).await.unwrap();

        assert!(outcome.correct);
        assert!(outcome.feedback.contains("✅ Test: double"));
        assert!(outcome.feedback.contains("✅ Test: zero"));
    }

    #[tokio::test]
    async fn test_one_mismatch_fails_whole_submission() {
        let (store, assignment) =
            store_with_cases(vec![case("double", "5", "10"), case("wrong", "3", "7")]).await;
        let grader = Grader::new(store, doubling_strategy());

        let outcome = grader.grade(&submission(assignment, "code")).await.unwrap();

        assert!(!outcome.correct);
        // One block per test case, in test-case order.
        let pass_at = outcome.feedback.find("✅ Test: double").unwrap();
        let fail_at = outcome.feedback.find("❌ Test: wrong").unwrap();
        assert!(pass_at < fail_at);
        assert!(outcome
            .feedback
            .contains("Test failed: Expected 7 but got 6"));
    }

    #[tokio::test]
    async fn test_execution_error_contained_and_grading_continues() {
        let (store, assignment) = store_with_cases(vec![
            case("crashes", "not-a-number", "1"),
            case("double", "5", "10"),
        ])
        .await;
        let grader = Grader::new(store, doubling_strategy());

        let outcome = grader.grade(&submission(assignment, "code")).await.unwrap();

        assert!(!outcome.correct);
        assert!(outcome.feedback.contains("❌ Test: crashes\nError:"));
        // The later test case still ran.
        assert!(outcome.feedback.contains("✅ Test: double"));
    }

    #[tokio::test]
    async fn test_unparseable_expected_output_is_per_test_error() {
        let (store, assignment) =
            store_with_cases(vec![case("broken", "5", "{not json")]).await;
        let grader = Grader::new(store, doubling_strategy());

        let outcome = grader.grade(&submission(assignment, "code")).await.unwrap();

        assert!(!outcome.correct);
        assert!(outcome.feedback.contains("invalid expected output"));
    }

    #[tokio::test]
    async fn test_structural_comparison_of_outputs() {
        let (store, assignment) =
            store_with_cases(vec![case("pairs", "ignored", r#"{"a": 1, "b": [2, 3]}"#)]).await;
        let strategy = Arc::new(FnStrategy(|_: &str, _: &str| {
            Ok(json!({"b": [2, 3], "a": 1}))
        }));
        let grader = Grader::new(store, strategy);

        let outcome = grader.grade(&submission(assignment, "code")).await.unwrap();
        assert!(outcome.correct);
    }

    #[tokio::test]
    async fn test_no_test_cases_grades_correct() {
        let (store, assignment) = store_with_cases(vec![]).await;
        let grader = Grader::new(store, doubling_strategy());

        let outcome = grader.grade(&submission(assignment, "code")).await.unwrap();

        assert!(outcome.correct);
        assert_eq!(outcome.feedback, "");
    }

    #[tokio::test]
    async fn test_insert_then_grade_uses_submission_code() {
        // The strategy sees the exact code text stored on the row.
        let (store, assignment) = store_with_cases(vec![case("echo", "in", "\"code-text\"")]).await;
        let strategy = Arc::new(FnStrategy(|code: &str, _: &str| Ok(json!(code))));
        let grader = Grader::new(Arc::clone(&store) as Arc<dyn SubmissionStore>, strategy);

        let row = store
            .insert(NewSubmission::pending(assignment, "code-text", "alice"))
            .await
            .unwrap();
        let outcome = grader.grade(&row).await.unwrap();
        assert!(outcome.correct);
    }
}
