//! Timers saved as JSON between runs.

use std::fs;
use std::io;
use std::path::PathBuf;

use botcmd_scheduler::Schedule;
use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid state file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid UTC offset {0} seconds")]
    Offset(i32),
}

/// What a timer does when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerInfo {
    pub id: u64,
    /// The command line to run, as words.
    pub command: Vec<String>,
    /// Periodic timers stop once their next firing would be after this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl TimerInfo {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleRecord {
    OneShot {
        time: DateTime<Utc>,
    },
    Periodic {
        next_time: DateTime<Utc>,
        interval_seconds: i64,
    },
    Daily {
        time_of_day: NaiveTime,
        utc_offset_seconds: i32,
    },
}

impl From<&Schedule> for ScheduleRecord {
    fn from(schedule: &Schedule) -> Self {
        match schedule {
            Schedule::OneShot { time } => ScheduleRecord::OneShot { time: *time },
            Schedule::Periodic {
                next_time,
                interval,
            } => ScheduleRecord::Periodic {
                next_time: *next_time,
                interval_seconds: interval.num_seconds(),
            },
            Schedule::Daily {
                time_of_day,
                offset,
            } => ScheduleRecord::Daily {
                time_of_day: *time_of_day,
                utc_offset_seconds: offset.local_minus_utc(),
            },
        }
    }
}

impl TryFrom<&ScheduleRecord> for Schedule {
    type Error = StateError;

    fn try_from(record: &ScheduleRecord) -> Result<Self, StateError> {
        Ok(match record {
            ScheduleRecord::OneShot { time } => Schedule::OneShot { time: *time },
            ScheduleRecord::Periodic {
                next_time,
                interval_seconds,
            } => Schedule::Periodic {
                next_time: *next_time,
                interval: TimeDelta::seconds(*interval_seconds),
            },
            ScheduleRecord::Daily {
                time_of_day,
                utc_offset_seconds,
            } => Schedule::Daily {
                time_of_day: *time_of_day,
                offset: FixedOffset::east_opt(*utc_offset_seconds)
                    .ok_or(StateError::Offset(*utc_offset_seconds))?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    #[serde(flatten)]
    pub info: TimerInfo,
    pub schedule: ScheduleRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub timers: Vec<TimerRecord>,
}

/// Reads and writes the state file, if there is one.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    path: Option<PathBuf>,
}

impl StateStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// A missing file is an empty state.
    pub fn load(&self) -> Result<StateFile, StateError> {
        let Some(path) = &self.path else {
            return Ok(StateFile::default());
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no state file yet");
                return Ok(StateFile::default());
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        let state: StateFile = serde_json::from_str(&text).map_err(|source| StateError::Json {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), timers = state.timers.len(), "loaded state");
        Ok(state)
    }

    /// Write through a temporary sibling file so a crash never leaves half a
    /// file behind.
    pub fn save(&self, state: &StateFile) -> Result<(), StateError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_error = |source| StateError::Io {
            path: path.clone(),
            source,
        };
        let text = serde_json::to_string_pretty(state).map_err(|source| StateError::Json {
            path: path.clone(),
            source,
        })?;
        let temporary = path.with_extension("tmp");
        fs::write(&temporary, text).map_err(io_error)?;
        fs::rename(&temporary, path).map_err(io_error)?;
        debug!(path = %path.display(), timers = state.timers.len(), "saved state");
        Ok(())
    }
}
