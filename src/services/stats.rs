use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{TASK_NAMES, WATER_TASK_KEY};
use crate::models::progress::{DayRecord, TaskValue};

/// Per-task slice of the stats report.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStat {
    pub name: String,
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

/// The aggregate report returned by `GET /api/progress/stats`. Derived on
/// every request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveStats {
    pub total_days: usize,
    pub completed_days: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completion_rate: f64,
    pub task_stats: BTreeMap<String, TaskStat>,
}

/// Streak and completion statistics over a set of day records.
///
/// Every method is a pure pass over the records it is handed: no I/O, no
/// clock reads ("today" comes in as an argument), no mutation of inputs.
#[derive(Debug, Clone, Copy)]
pub struct StatsService {
    water_goal_ml: u32,
}

impl StatsService {
    pub fn new(water_goal_ml: u32) -> Self {
        Self { water_goal_ml }
    }

    /// Whether a single task value counts as satisfied. The water task is
    /// satisfied only by a milliliter count at or above the goal; every
    /// other task only by an explicit boolean `true`. Anything else —
    /// a boolean stored for water, a number stored for a boolean task, or
    /// a malformed value — is unsatisfied, never an error.
    fn is_task_satisfied(&self, key: &str, value: &TaskValue) -> bool {
        if key == WATER_TASK_KEY {
            matches!(value, TaskValue::WaterMl(ml) if *ml >= self.water_goal_ml)
        } else {
            matches!(value, TaskValue::Done(true))
        }
    }

    /// A day is complete iff every task present on the record is satisfied.
    /// A record with no tasks at all is vacuously complete.
    pub fn is_day_complete(&self, record: &DayRecord) -> bool {
        record
            .tasks
            .iter()
            .all(|(key, value)| self.is_task_satisfied(key, value))
    }

    /// Returns `(current_streak, longest_streak)`.
    ///
    /// Longest is the best run of consecutive complete records in date
    /// order. Current counts complete records backward from the most
    /// recent; an incomplete most-recent record dated `today` is skipped
    /// rather than treated as a breaker, so a day still in progress does
    /// not zero out yesterday's streak.
    pub fn calculate_streaks(&self, records: &[DayRecord], today: NaiveDate) -> (u32, u32) {
        if records.is_empty() {
            return (0, 0);
        }

        let mut sorted: Vec<&DayRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.date);

        let mut longest = 0u32;
        let mut run = 0u32;
        for record in &sorted {
            if self.is_day_complete(record) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }

        let mut current = 0u32;
        for (i, record) in sorted.iter().rev().enumerate() {
            if self.is_day_complete(record) {
                current += 1;
            } else if i == 0 && record.date == today {
                continue;
            } else {
                break;
            }
        }

        (current, longest)
    }

    /// Per-task completion counts over the full history, keyed by task key
    /// and carrying the configured display name. Empty input yields an
    /// empty map.
    pub fn calculate_task_stats(&self, records: &[DayRecord]) -> BTreeMap<String, TaskStat> {
        if records.is_empty() {
            return BTreeMap::new();
        }

        let total = records.len();
        let mut stats = BTreeMap::new();

        for (key, name) in TASK_NAMES {
            let completed = records
                .iter()
                .filter(|record| {
                    record
                        .tasks
                        .get(*key)
                        .is_some_and(|value| self.is_task_satisfied(key, value))
                })
                .count();

            stats.insert(
                key.to_string(),
                TaskStat {
                    name: name.to_string(),
                    completed,
                    total,
                    percentage: round_rate(completed, total),
                },
            );
        }

        stats
    }

    /// The full aggregate report. Empty input yields the all-zero/empty
    /// report rather than an error.
    pub fn comprehensive_stats(&self, records: &[DayRecord], today: NaiveDate) -> ComprehensiveStats {
        let total_days = records.len();
        let completed_days = records
            .iter()
            .filter(|record| self.is_day_complete(record))
            .count();
        let (current_streak, longest_streak) = self.calculate_streaks(records, today);

        ComprehensiveStats {
            total_days,
            completed_days,
            current_streak,
            longest_streak,
            completion_rate: round_rate(completed_days, total_days),
            task_stats: self.calculate_task_stats(records),
        }
    }
}

/// `round(100 * completed / total, 1)`, or 0 when there is no history.
fn round_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 1000.0).round() / 10.0
}
