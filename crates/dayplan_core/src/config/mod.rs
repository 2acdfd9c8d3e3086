use crate::error::CoreError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::{Time, UtcOffset};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "DAYPLAN_CONFIG_PATH";

/// Planning preferences. Process-wide defaults, overridable per call; the
/// planner resolves them into typed values before touching the grid and
/// never mutates them mid-computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_work_start")]
    pub work_start: String,
    #[serde(default = "default_work_end")]
    pub work_end: String,
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_alert_window_minutes")]
    pub alert_window_minutes: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_work_start() -> String {
    "09:00".to_string()
}

fn default_work_end() -> String {
    "17:00".to_string()
}

fn default_focus_minutes() -> u32 {
    90
}

fn default_break_minutes() -> u32 {
    15
}

fn default_alert_window_minutes() -> u32 {
    60
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            work_start: default_work_start(),
            work_end: default_work_end(),
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
            alert_window_minutes: default_alert_window_minutes(),
            timezone: default_timezone(),
        }
    }
}

/// Preferences after validation, in the types the planner computes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPreferences {
    pub work_start: Time,
    pub work_end: Time,
    pub offset: UtcOffset,
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

impl Preferences {
    pub fn resolve(&self) -> Result<ResolvedPreferences, CoreError> {
        let work_start = parse_clock(&self.work_start)?;
        let work_end = parse_clock(&self.work_end)?;
        if work_end <= work_start {
            return Err(CoreError::invalid_config(
                "work hours must end after they start",
            ));
        }
        if self.focus_minutes == 0 {
            return Err(CoreError::invalid_config("focus_minutes must be positive"));
        }
        let offset = parse_offset(&self.timezone)?;

        Ok(ResolvedPreferences {
            work_start,
            work_end,
            offset,
            focus_minutes: self.focus_minutes,
            break_minutes: self.break_minutes,
        })
    }
}

fn parse_clock(raw: &str) -> Result<Time, CoreError> {
    let format = format_description!("[hour]:[minute]");
    Time::parse(raw.trim(), &format)
        .map_err(|_| CoreError::invalid_config(format!("invalid time of day: {raw}")))
}

fn parse_offset(raw: &str) -> Result<UtcOffset, CoreError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(UtcOffset::UTC);
    }
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(trimmed, &format)
        .map_err(|_| CoreError::invalid_config(format!("invalid timezone offset: {raw}")))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreferenceOverrides {
    pub work_start: Option<String>,
    pub work_end: Option<String>,
    pub focus_minutes: Option<u32>,
    pub break_minutes: Option<u32>,
    pub alert_window_minutes: Option<u32>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub preferences: Preferences,
    pub error: Option<CoreError>,
}

pub fn config_path() -> Result<PathBuf, CoreError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| CoreError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("dayplan").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| CoreError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("dayplan")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_preferences() -> Result<Preferences, CoreError> {
    let path = config_path()?;
    load_preferences_from_path(&path)
}

pub fn load_preferences_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_preferences_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            preferences: Preferences::default(),
            error: Some(err),
        },
    }
}

fn load_preferences_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            preferences: Preferences::default(),
            error: None,
        };
    }

    match load_preferences_from_path(path) {
        Ok(preferences) => ConfigLoad {
            preferences,
            error: None,
        },
        Err(err) => {
            warn!("falling back to default preferences: {err}");
            ConfigLoad {
                preferences: Preferences::default(),
                error: Some(err),
            }
        }
    }
}

fn load_preferences_from_path(path: &Path) -> Result<Preferences, CoreError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| CoreError::invalid_data(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        CoreError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Preferences, overrides: &PreferenceOverrides) -> Preferences {
    let mut merged = base.clone();
    if let Some(work_start) = overrides.work_start.as_ref() {
        merged.work_start = work_start.clone();
    }
    if let Some(work_end) = overrides.work_end.as_ref() {
        merged.work_end = work_end.clone();
    }
    if let Some(focus_minutes) = overrides.focus_minutes {
        merged.focus_minutes = focus_minutes;
    }
    if let Some(break_minutes) = overrides.break_minutes {
        merged.break_minutes = break_minutes;
    }
    if let Some(alert_window_minutes) = overrides.alert_window_minutes {
        merged.alert_window_minutes = alert_window_minutes;
    }
    if let Some(timezone) = overrides.timezone.as_ref() {
        merged.timezone = timezone.clone();
    }
    merged
}
