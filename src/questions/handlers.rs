use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    extract::ApiJson,
    jobs::RunOutcome,
    questions::{
        dto::{
            FetchQuestionsRequest, FetchQuestionsResponse, GenerateQuestionsRequest,
            GenerateQuestionsResponse,
        },
        repo_types::GeneratedQuestion,
        services::notebook_params,
    },
    state::AppState,
};

pub fn question_routes() -> Router<AppState> {
    Router::new()
        .route("/generate-questions/", post(generate_questions))
        .route("/fetch-generated-questions/", post(fetch_generated_questions))
}

/// Starts the generation job and returns without waiting for it.
#[instrument(skip(state, payload))]
pub async fn generate_questions(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, ApiError> {
    let job_id = state.config.jobs.job_id;
    let params = notebook_params(&payload);

    match state.jobs.run_now(job_id, params).await? {
        RunOutcome::Started { run_id } => {
            info!(job_id, ?run_id, user_id = %payload.user_id, "job started");
            Ok(Json(GenerateQuestionsResponse::Started {
                message: "Job started",
                run_id,
                user_id: payload.user_id,
            }))
        }
        // Rejections stay 200 so existing clients keep reading the `error` field.
        RunOutcome::Rejected { status, details } => {
            warn!(job_id, status, user_id = %payload.user_id, "job rejected");
            Ok(Json(GenerateQuestionsResponse::Rejected {
                error: "Failed to start job",
                details,
            }))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn fetch_generated_questions(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FetchQuestionsRequest>,
) -> Result<Json<FetchQuestionsResponse>, ApiError> {
    let questions = GeneratedQuestion::list_by_question_id(
        state.warehouse.as_ref(),
        &state.questions_table(),
        &payload.question_id,
    )
    .await?;

    if questions.is_empty() {
        warn!(question_id = %payload.question_id, "no generated questions");
        return Err(ApiError::NotFound("No questions found for this user.".into()));
    }

    info!(question_id = %payload.question_id, count = questions.len(), "generated questions fetched");
    Ok(Json(FetchQuestionsResponse {
        user_id: payload.question_id,
        questions,
    }))
}
