// HTTP route handlers for the Codify API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use codify_common::error::SubmitError;
use codify_common::store::SubmissionStore;
use codify_common::types::TestCase;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub assignment_id: Uuid,
    pub code: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub test_cases: Vec<TestCaseInput>,
}

#[derive(Debug, Deserialize)]
pub struct TestCaseInput {
    pub name: String,
    pub input: String,
    pub expected_output: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAssignmentResponse {
    pub assignment_id: Uuid,
}

/// POST /submissions - Submit code for grading
///
/// Returns the created row immediately: `pending` when queued, `processed`
/// when the dedup shortcut reused an earlier graded result.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> impl IntoResponse {
    match state
        .coordinator
        .submit(payload.assignment_id, &payload.code, &payload.user_id)
        .await
    {
        Ok(submission) => {
            info!(
                submission_id = %submission.id,
                assignment_id = %payload.assignment_id,
                user_id = %payload.user_id,
                status = %submission.status,
                "Submission accepted"
            );
            (StatusCode::CREATED, Json(submission)).into_response()
        }
        Err(e) => {
            let status = match &e {
                SubmitError::Validation(_) => StatusCode::BAD_REQUEST,
                SubmitError::Conflict => StatusCode::CONFLICT,
                SubmitError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(error = %e, "Failed to accept submission");
            }
            (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// POST /assignments - Register an assignment's test cases
pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> impl IntoResponse {
    let assignment_id = Uuid::new_v4();
    let test_cases: Vec<TestCase> = payload
        .test_cases
        .into_iter()
        .map(|tc| TestCase {
            name: tc.name,
            input: tc.input,
            expected_output: tc.expected_output,
        })
        .collect();

    info!(
        assignment_id = %assignment_id,
        test_cases = test_cases.len(),
        "Assignment registered"
    );
    state.store.put_assignment(assignment_id, test_cases).await;

    (
        StatusCode::CREATED,
        Json(CreateAssignmentResponse { assignment_id }),
    )
}

/// GET /submissions/{id} - Poll a submission's status and feedback
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.get(id).await {
        Ok(Some(submission)) => (StatusCode::OK, Json(submission)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Submission not found" })),
        )
            .into_response(),
        Err(e) => {
            error!(submission_id = %id, error = %e, "Failed to fetch submission");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// DELETE /submissions/{id}
///
/// Deleting does not dequeue: a row deleted mid-grading makes the final
/// result write a no-op.
pub async fn delete_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.delete(id).await {
        Ok(Some(submission)) => {
            info!(submission_id = %id, "Submission deleted");
            (StatusCode::OK, Json(submission)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Submission not found" })),
        )
            .into_response(),
        Err(e) => {
            error!(submission_id = %id, error = %e, "Failed to delete submission");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /users/{user_id}/assignments/{assignment_id}/submissions
pub async fn list_user_submissions(
    State(state): State<Arc<AppState>>,
    Path((user_id, assignment_id)): Path<(String, Uuid)>,
) -> impl IntoResponse {
    match state.store.list_for_user(&user_id, assignment_id).await {
        Ok(submissions) => (StatusCode::OK, Json(submissions)).into_response(),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to list submissions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /users/{user_id}/points - 100 points per correctly solved assignment
pub async fn get_user_points(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.user_points(&user_id).await {
        Ok(points) => (
            StatusCode::OK,
            Json(serde_json::json!({ "user_id": user_id, "points": points })),
        )
            .into_response(),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to aggregate points");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
