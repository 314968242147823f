use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::WATER_TASK_KEY;
use crate::error::AppResult;
use crate::models::progress::{default_tasks, DayRecord, TaskMap, TaskValue};

#[derive(Debug, FromRow)]
struct ProgressRow {
    date: NaiveDate,
    tasks: Json<TaskMap>,
    progress_pic: Option<String>,
    owner_id: Option<String>,
}

impl From<ProgressRow> for DayRecord {
    fn from(row: ProgressRow) -> Self {
        DayRecord {
            date: row.date,
            tasks: row.tasks.0,
            progress_pic: row.progress_pic,
            owner_id: row.owner_id,
        }
    }
}

/// Postgres-backed store for day records. All task-map writes go through
/// here, so this is where the water value gets clamped to the goal.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    pool: PgPool,
    water_goal_ml: u32,
}

impl ProgressStore {
    pub fn new(pool: PgPool, water_goal_ml: u32) -> Self {
        Self {
            pool,
            water_goal_ml,
        }
    }

    /// Cheap connectivity check for the readiness probe.
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    pub async fn fetch_all(&self) -> AppResult<Vec<DayRecord>> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            "SELECT date, tasks, progress_pic, owner_id FROM progress ORDER BY date ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Bounded history view, newest first.
    pub async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<DayRecord>> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT date, tasks, progress_pic, owner_id FROM progress
            WHERE date BETWEEN $1 AND $2
            ORDER BY date DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn fetch_by_date(&self, date: NaiveDate) -> AppResult<Option<DayRecord>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            "SELECT date, tasks, progress_pic, owner_id FROM progress WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert the all-incomplete template for a date. Idempotent: a
    /// concurrent insert for the same date returns the existing row.
    pub async fn create_default(&self, date: NaiveDate) -> AppResult<DayRecord> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            INSERT INTO progress (id, date, tasks)
            VALUES ($1, $2, $3)
            ON CONFLICT (date) DO UPDATE
                SET tasks = progress.tasks  -- no-op update to trigger RETURNING
            RETURNING date, tasks, progress_pic, owner_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(Json(default_tasks()))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace the task map for a date, creating the row when absent.
    pub async fn upsert_tasks(
        &self,
        date: NaiveDate,
        mut tasks: TaskMap,
        owner_id: Option<String>,
    ) -> AppResult<DayRecord> {
        clamp_water(&mut tasks, self.water_goal_ml);

        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            INSERT INTO progress (id, date, tasks, owner_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (date) DO UPDATE SET
                tasks = EXCLUDED.tasks,
                owner_id = COALESCE(EXCLUDED.owner_id, progress.owner_id),
                updated_at = NOW()
            RETURNING date, tasks, progress_pic, owner_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(Json(tasks))
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Add `amount` ml to a date's water count, clamped at the goal.
    /// Returns the new value, or `None` when the date has no record.
    pub async fn increment_water(&self, date: NaiveDate, amount: u32) -> AppResult<Option<u32>> {
        let Some(record) = self.fetch_by_date(date).await? else {
            return Ok(None);
        };

        let current = match record.tasks.get(WATER_TASK_KEY) {
            Some(TaskValue::WaterMl(ml)) => *ml,
            _ => 0,
        };
        let new_value =
            (u64::from(current) + u64::from(amount)).min(u64::from(self.water_goal_ml)) as u32;

        sqlx::query(
            r#"
            UPDATE progress
            SET tasks = jsonb_set(tasks, ARRAY[$2], to_jsonb($3::bigint), true),
                updated_at = NOW()
            WHERE date = $1
            "#,
        )
        .bind(date)
        .bind(WATER_TASK_KEY)
        .bind(i64::from(new_value))
        .execute(&self.pool)
        .await?;

        Ok(Some(new_value))
    }

    pub async fn set_progress_pic(&self, date: NaiveDate, file_name: &str) -> AppResult<DayRecord> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            UPDATE progress
            SET progress_pic = $2, updated_at = NOW()
            WHERE date = $1
            RETURNING date, tasks, progress_pic, owner_id
            "#,
        )
        .bind(date)
        .bind(file_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

/// Writer-side clamp: a numeric water value never exceeds the goal. Other
/// shapes pass through untouched and simply never evaluate as satisfied.
fn clamp_water(tasks: &mut TaskMap, goal: u32) {
    if let Some(TaskValue::WaterMl(ml)) = tasks.get_mut(WATER_TASK_KEY) {
        *ml = (*ml).min(goal);
    }
}
