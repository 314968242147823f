use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MAX_HISTORY_DAYS;
use crate::error::{AppError, AppResult};
use crate::models::progress::{DayRecord, TaskMap};
use crate::services::stats::{ComprehensiveStats, StatsService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub tasks: TaskMap,
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct IncrementWaterRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct WaterResponse {
    pub water: u32,
}

pub async fn list_progress(State(state): State<AppState>) -> AppResult<Json<Vec<DayRecord>>> {
    let records = state.store.fetch_all().await?;
    Ok(Json(records))
}

/// Bounded history window ending today, newest first.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<DayRecord>>> {
    let days = query
        .days
        .unwrap_or(state.config.history_days)
        .clamp(1, MAX_HISTORY_DAYS);

    let end = Utc::now().date_naive();
    let start = end - chrono::Duration::days(days);

    let records = state.store.fetch_range(start, end).await?;
    Ok(Json(records))
}

/// The comprehensive stats report, recomputed from the full history on
/// every request.
pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<ComprehensiveStats>> {
    let records = state.store.fetch_all().await?;
    let stats = StatsService::new(state.config.water_goal_ml);
    let report = stats.comprehensive_stats(&records, Utc::now().date_naive());
    Ok(Json(report))
}

/// Fetch one date's record; first access creates the all-incomplete
/// template so the client always gets a full checklist back.
pub async fn get_by_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<DayRecord>> {
    let record = match state.store.fetch_by_date(date).await? {
        Some(record) => record,
        None => {
            tracing::debug!(%date, "No record for date, creating default");
            state.store.create_default(date).await?
        }
    };
    Ok(Json(record))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<UpdateProgressRequest>,
) -> AppResult<Json<DayRecord>> {
    let record = state
        .store
        .upsert_tasks(date, body.tasks, body.owner_id)
        .await?;
    Ok(Json(record))
}

/// Add a number of milliliters to a day's water count, clamped at the
/// configured goal. 404 when the date has never been opened.
pub async fn increment_water(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<IncrementWaterRequest>,
) -> AppResult<Json<WaterResponse>> {
    if body.amount <= 0 {
        return Err(AppError::Validation("Amount must be positive".into()));
    }
    let amount = u32::try_from(body.amount)
        .map_err(|_| AppError::Validation("Amount out of range".into()))?;

    let water = state
        .store
        .increment_water(date, amount)
        .await?
        .ok_or(AppError::NotFound("No progress for this date".into()))?;

    Ok(Json(WaterResponse { water }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress::TaskValue;

    // ── request deserialization ──────────────────────────────────────────

    #[test]
    fn test_update_request_deserializes() {
        let json = r#"{"tasks":{"follow_diet":true,"drink_gallon_water":1500}}"#;
        let req: UpdateProgressRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.tasks.get("follow_diet"), Some(&TaskValue::Done(true)));
        assert_eq!(
            req.tasks.get("drink_gallon_water"),
            Some(&TaskValue::WaterMl(1500))
        );
        assert!(req.owner_id.is_none());
    }

    #[test]
    fn test_update_request_missing_tasks_fails() {
        let result = serde_json::from_str::<UpdateProgressRequest>(r#"{"owner_id":"me"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_increment_request_accepts_negative_for_handler_validation() {
        // Deserialization is permissive; the handler rejects non-positive
        // amounts with a validation error.
        let req: IncrementWaterRequest = serde_json::from_str(r#"{"amount":-100}"#).unwrap();
        assert_eq!(req.amount, -100);
    }

    #[test]
    fn test_water_response_shape() {
        let json = serde_json::to_value(WaterResponse { water: 2500 }).unwrap();
        assert_eq!(json["water"], 2500);
    }
}
