use std::env;

/// One gallon in milliliters, the default daily water goal.
pub const DEFAULT_WATER_GOAL_ML: u32 = 3785;

/// Task key for water intake, the only task tracked as a number rather
/// than a boolean.
pub const WATER_TASK_KEY: &str = "drink_gallon_water";

/// The fixed daily checklist, in display order. The key set never changes
/// at runtime; display names feed the per-task stats report.
pub const TASK_NAMES: &[(&str, &str)] = &[
    (WATER_TASK_KEY, "Drink 1 Gallon Water"),
    ("workout_a", "Workout 1 (45 Min)"),
    ("workout_b_outside", "Workout 2 (45 Min, Outdoors)"),
    ("read_ten_pages", "Read 10 Pages"),
    ("five_min_cold_shower", "5-Min Cold Shower"),
    ("follow_diet", "Follow Diet"),
    ("no_alcohol_or_cheat_meals", "No Alcohol/Cheat Meals"),
    ("take_progress_pic", "Take Progress Picture"),
];

/// Hard cap on the history window — the challenge itself is 75 days.
pub const MAX_HISTORY_DAYS: i64 = 75;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub water_goal_ml: u32,
    pub history_days: i64,
    pub upload_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8917".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:6896".into()),

            water_goal_ml: env::var("WATER_GOAL_ML")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_WATER_GOAL_ML),
            history_days: env::var("HISTORY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30)
                .clamp(1, MAX_HISTORY_DAYS),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
