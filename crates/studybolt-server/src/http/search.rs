use super::{AppError, AppResult, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use studybolt_core::{SearchOutcome, StudyBoltError, DEFAULT_RESULT_LIMIT};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchBody {
    query: Option<String>,
    num_results: Option<i64>,
}

/// `POST /api/search`: summarized web search, memoized per `(query, numResults)`.
pub(super) async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchBody>, JsonRejection>,
) -> AppResult<Json<SearchOutcome>> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Rejected search body: {}", rejection.body_text());
            state.metrics.record_failure("search");
            return Err(AppError::bad_request("Query is required"));
        }
    };

    let query = match body.query {
        Some(query) if !query.trim().is_empty() => query,
        _ => {
            state.metrics.record_failure("search");
            return Err(AppError::bad_request("Query is required"));
        }
    };

    let limit = body.num_results.unwrap_or(DEFAULT_RESULT_LIMIT as i64);
    if limit < 1 {
        state.metrics.record_failure("search");
        return Err(AppError::bad_request("numResults must be at least 1"));
    }

    match state
        .pipeline
        .search_with_summary(&query, limit as usize)
        .await
    {
        Ok(outcome) => {
            state.metrics.record_search(outcome.source.as_str());
            info!(
                source = outcome.source.as_str(),
                sources = outcome.summary.sources.len(),
                "Search summary served"
            );
            Ok(Json(outcome))
        }
        Err(StudyBoltError::Validation(msg)) => {
            state.metrics.record_failure("search");
            Err(AppError::bad_request(msg))
        }
        Err(e) => {
            tracing::error!("Search error: {}", e);
            state.metrics.record_failure("search");
            Err(AppError::failed("Search failed", e))
        }
    }
}
