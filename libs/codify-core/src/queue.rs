/// Queue Coordinator - Single-Flight FIFO Grading
///
/// **Core Responsibility:**
/// Serialize grading of untrusted submissions: at most one grader
/// invocation runs at a time per process, draining the in-memory queue in
/// strict arrival order.
///
/// **Lifecycle:**
/// Constructed once per process and shared via `Arc`; the queue and the
/// draining flag are owned by the coordinator, not module globals, so
/// independent coordinators can be tested in isolation.
///
/// **Guarantees:**
/// - FIFO: submissions are graded in enqueue order, no priorities
/// - At most one drain task; the flag is claimed with compare-exchange
/// - The flag is always released and the queue re-checked, even when a
///   grading cycle fails (drop guard around the drain loop)
/// - Nothing survives a process restart; rows stranded in `pending` after
///   a crash need external reconciliation
///
/// Dedup-shortcut submissions complete synchronously inside `submit` and
/// bypass the queue entirely.

use crate::executor::ExecutionStrategy;
use crate::grader::Grader;
use codify_common::error::SubmitError;
use codify_common::store::SubmissionStore;
use codify_common::types::{NewSubmission, Submission, SubmissionStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct QueueCoordinator {
    store: Arc<dyn SubmissionStore>,
    grader: Grader,
    queue: Mutex<VecDeque<Submission>>,
    draining: AtomicBool,
    // Handle to ourselves for spawning the drain task from &self.
    self_ref: Weak<QueueCoordinator>,
}

impl QueueCoordinator {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        strategy: Arc<dyn ExecutionStrategy>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            grader: Grader::new(Arc::clone(&store), strategy),
            store,
            queue: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            self_ref: self_ref.clone(),
        })
    }

    /// The one externally triggered entry point into the pipeline.
    ///
    /// Validates the request, rejects users with a submission already in
    /// flight, shortcuts exact duplicates of graded submissions, and
    /// otherwise enqueues a `pending` row for asynchronous grading. The
    /// returned row is the caller's handle for polling the outcome.
    ///
    /// The pending gate is best-effort: the check and the insert are
    /// separate store calls, so two truly concurrent submits from one
    /// user can both pass. Closing that window takes a store-level
    /// uniqueness constraint on (user, pending).
    pub async fn submit(
        &self,
        assignment_id: Uuid,
        code: &str,
        user_id: &str,
    ) -> Result<Submission, SubmitError> {
        if user_id.trim().is_empty() {
            return Err(SubmitError::Validation("User ID is required".to_string()));
        }
        if code.trim().is_empty() {
            return Err(SubmitError::Validation(
                "Submission code is required".to_string(),
            ));
        }

        if self.store.has_pending(user_id).await? {
            return Err(SubmitError::Conflict);
        }

        // Dedup shortcut: reuse the stored result of an identical graded
        // submission instead of grading again.
        if let Some(graded) = self
            .store
            .find_processed_duplicate(assignment_id, code)
            .await?
        {
            info!(
                assignment_id = %assignment_id,
                user_id = %user_id,
                duplicate_of = %graded.id,
                "Duplicate submission; copying graded result"
            );
            let copy = self
                .store
                .insert(NewSubmission::processed_copy(
                    assignment_id,
                    code,
                    user_id,
                    &graded,
                ))
                .await?;
            return Ok(copy);
        }

        let submission = self
            .store
            .insert(NewSubmission::pending(assignment_id, code, user_id))
            .await?;

        self.queue.lock().await.push_back(submission.clone());
        info!(
            submission_id = %submission.id,
            assignment_id = %assignment_id,
            user_id = %user_id,
            "Submission queued for grading"
        );
        self.trigger_drain();

        Ok(submission)
    }

    /// Start the drain task unless one is already running. Idempotent:
    /// losing the compare-exchange means another task owns the queue.
    fn trigger_drain(&self) {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        match self.self_ref.upgrade() {
            Some(coordinator) => {
                tokio::spawn(async move {
                    coordinator.drain().await;
                });
            }
            // Coordinator is being torn down; nothing left to grade for.
            None => self.draining.store(false, Ordering::Release),
        }
    }

    /// Pop-grade-persist until the queue is empty. An explicit loop, not
    /// recursion, so a deep backlog cannot grow the call stack.
    async fn drain(self: Arc<Self>) {
        let _guard = DrainGuard {
            coordinator: Arc::clone(&self),
        };
        loop {
            let next = self.queue.lock().await.pop_front();
            let Some(submission) = next else { break };
            self.grade_and_persist(submission).await;
        }
    }

    /// One grading cycle. All failures end here: a grader infrastructure
    /// error becomes a terminal `error` row, and a failed persist is
    /// logged - the queue keeps draining either way.
    async fn grade_and_persist(&self, submission: Submission) {
        match self.grader.grade(&submission).await {
            Ok(outcome) => {
                let update = self
                    .store
                    .update_result(
                        submission.id,
                        SubmissionStatus::Processed,
                        &outcome.feedback,
                        outcome.correct,
                    )
                    .await;
                match update {
                    Ok(Some(_)) => {
                        info!(
                            submission_id = %submission.id,
                            correct = outcome.correct,
                            "Submission graded"
                        );
                    }
                    Ok(None) => {
                        warn!(
                            submission_id = %submission.id,
                            "Submission deleted while grading; result discarded"
                        );
                    }
                    Err(e) => {
                        error!(
                            submission_id = %submission.id,
                            error = %e,
                            "Failed to persist grading result"
                        );
                    }
                }
            }
            Err(e) => {
                error!(
                    submission_id = %submission.id,
                    error = %e,
                    "Grading failed"
                );
                let feedback = format!("Grading failed: {e}");
                if let Err(e) = self
                    .store
                    .update_result(submission.id, SubmissionStatus::Error, &feedback, false)
                    .await
                {
                    error!(
                        submission_id = %submission.id,
                        error = %e,
                        "Failed to persist error status"
                    );
                }
            }
        }
    }
}

/// Releases the draining flag when the drain task ends - normally or not -
/// and re-checks the queue, so a submission enqueued between the final pop
/// and the flag release is never stranded.
struct DrainGuard {
    coordinator: Arc<QueueCoordinator>,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        self.coordinator.draining.store(false, Ordering::Release);
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move {
            if !coordinator.queue.lock().await.is_empty() {
                coordinator.trigger_drain();
            }
        });
    }
}
