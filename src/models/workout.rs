use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One weekday's assignment for a user: which day they train and,
/// optionally, which exercise group that day uses. Day numbers run
/// 1 (Monday) through 7 (Sunday).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDayAssignment {
    #[serde(rename = "dayNumber")]
    pub day_number: u8,
    #[serde(rename = "groupId", default)]
    pub group_id: Option<i64>,
}

/// A recorded workout for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutCompletion {
    pub date: NaiveDate,
    #[serde(rename = "dayNumber")]
    pub day_number: u8,
    #[serde(default)]
    pub completed: bool,
}
