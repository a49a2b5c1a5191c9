use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use ji_core::analytics::percentage;
use ji_core::{ChatLog, CHAT_INDEX};
use ji_search::queries;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Context};
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    pub active_users: u64,
    pub daily_interactions: u64,
    /// Percentage of interactions that got a bot reply.
    pub response_rate: u64,
    /// Mean bot response time in seconds.
    pub avg_response_time: u64,
}

impl EngagementStats {
    pub fn compute(
        active_users: f64,
        daily_interactions: u64,
        answered: u64,
        total: u64,
        avg_response_ms: f64,
    ) -> Self {
        Self {
            active_users: active_users.round() as u64,
            daily_interactions,
            response_rate: percentage(answered as f64, total as f64).round() as u64,
            avg_response_time: (avg_response_ms / 1000.0).round() as u64,
        }
    }
}

pub async fn engagement_stats(State(state): State<Arc<AppState>>) -> Result<Json<EngagementStats>, ApiError> {
    let backend = state.backend.as_ref();
    let (users, daily, avg, answered, total) = futures::try_join!(
        backend.search(CHAT_INDEX, queries::active_chat_users()),
        backend.count(CHAT_INDEX, Some(queries::last_24h())),
        backend.search(CHAT_INDEX, queries::avg_response_time()),
        backend.count(CHAT_INDEX, Some(queries::answered_interactions())),
        backend.count(CHAT_INDEX, None),
    )
    .context("Failed to fetch engagement statistics")?;

    Ok(Json(EngagementStats::compute(
        users.aggs().value("unique_users"),
        daily,
        answered,
        total,
        avg.aggs().value("avg_response_time"),
    )))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatLogParams {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatLogsResponse {
    pub logs: Vec<ChatLog>,
}

pub async fn chat_logs(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ChatLogParams>, QueryRejection>,
) -> Result<Json<ChatLogsResponse>, ApiError> {
    let Query(params) = params?;
    let result = state
        .backend
        .search(CHAT_INDEX, queries::chat_logs(params.search.as_deref()))
        .await
        .context("Failed to fetch chat logs")?;
    Ok(Json(ChatLogsResponse {
        logs: result.sources(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_rounds() {
        let stats = EngagementStats::compute(17.0, 250, 199, 300, 2600.0);
        assert_eq!(stats.active_users, 17);
        assert_eq!(stats.daily_interactions, 250);
        assert_eq!(stats.response_rate, 66);
        assert_eq!(stats.avg_response_time, 3);
    }

    #[test]
    fn test_compute_without_interactions() {
        let stats = EngagementStats::compute(0.0, 0, 0, 0, 0.0);
        assert_eq!(stats.response_rate, 0);
        assert_eq!(stats.avg_response_time, 0);
    }
}
