use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{self, WATER_TASK_KEY};

/// Value stored for one checklist task. Boolean tasks are done/not-done;
/// the water task is a milliliter count. `Other` absorbs anything else a
/// stored document might contain so reads never fail — such values simply
/// never count as satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskValue {
    Done(bool),
    WaterMl(u32),
    Other(serde_json::Value),
}

pub type TaskMap = BTreeMap<String, TaskValue>;

/// One calendar day's checklist state. `date` is the natural unique key.
/// `progress_pic` and `owner_id` are opaque to the stats engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub tasks: TaskMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_pic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// The "all incomplete" template used when a date is first requested:
/// water at 0 ml, every boolean task false.
pub fn default_tasks() -> TaskMap {
    config::TASK_NAMES
        .iter()
        .map(|(key, _)| {
            let value = if *key == WATER_TASK_KEY {
                TaskValue::WaterMl(0)
            } else {
                TaskValue::Done(false)
            };
            (key.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── TaskValue wire shape ─────────────────────────────────────────────

    #[test]
    fn test_task_value_bool_roundtrip() {
        let v: TaskValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, TaskValue::Done(true));
        assert_eq!(serde_json::to_string(&v).unwrap(), "true");
    }

    #[test]
    fn test_task_value_number_roundtrip() {
        let v: TaskValue = serde_json::from_str("3785").unwrap();
        assert_eq!(v, TaskValue::WaterMl(3785));
        assert_eq!(serde_json::to_string(&v).unwrap(), "3785");
    }

    #[test]
    fn test_task_value_malformed_degrades_to_other() {
        let v: TaskValue = serde_json::from_str(r#""yes""#).unwrap();
        assert!(matches!(v, TaskValue::Other(_)));

        let v: TaskValue = serde_json::from_str("-5").unwrap();
        assert!(matches!(v, TaskValue::Other(_)));
    }

    // ── DayRecord ────────────────────────────────────────────────────────

    #[test]
    fn test_day_record_serializes_iso_date() {
        let record = DayRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            tasks: default_tasks(),
            progress_pic: None,
            owner_id: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-01-02");
        assert_eq!(json["tasks"]["drink_gallon_water"], 0);
        assert_eq!(json["tasks"]["follow_diet"], false);
        assert!(json.get("progress_pic").is_none());
    }

    #[test]
    fn test_default_tasks_covers_every_configured_key() {
        let tasks = default_tasks();
        assert_eq!(tasks.len(), config::TASK_NAMES.len());
        assert_eq!(tasks.get(WATER_TASK_KEY), Some(&TaskValue::WaterMl(0)));
        for (key, _) in config::TASK_NAMES {
            if *key != WATER_TASK_KEY {
                assert_eq!(tasks.get(*key), Some(&TaskValue::Done(false)));
            }
        }
    }
}
