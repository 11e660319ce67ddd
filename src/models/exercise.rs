use serde::{Deserialize, Serialize};

/// The four phases a session walks through, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    WarmUp,
    Mobilise,
    Strengthen,
    Recover,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 4] = [
        ExerciseCategory::WarmUp,
        ExerciseCategory::Mobilise,
        ExerciseCategory::Strengthen,
        ExerciseCategory::Recover,
    ];

    /// Wire/CLI identifier for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::WarmUp => "warmup",
            ExerciseCategory::Mobilise => "mobilise",
            ExerciseCategory::Strengthen => "strengthen",
            ExerciseCategory::Recover => "recover",
        }
    }

    /// Display title as shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            ExerciseCategory::WarmUp => "Warm-up",
            ExerciseCategory::Mobilise => "Mobilise & Stretch",
            ExerciseCategory::Strengthen => "Strengthen",
            ExerciseCategory::Recover => "Recover",
        }
    }

    /// Parse user input. Tolerates the hyphenated and alternative spellings
    /// that appear in the service's own copy.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "warmup" | "warm-up" | "warm" => Some(ExerciseCategory::WarmUp),
            "mobilise" | "mobilize" | "stretch" => Some(ExerciseCategory::Mobilise),
            "strengthen" | "strength" => Some(ExerciseCategory::Strengthen),
            "recover" | "recovery" => Some(ExerciseCategory::Recover),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A named exercise program a user can be assigned, e.g. for a specific
/// imbalance or training block. Groups collect exercises across categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseGroup {
    pub id: i64,
    pub name: String,
    /// Short description of what the group targets.
    #[serde(default)]
    pub focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub category: ExerciseCategory,
    #[serde(rename = "groupId", default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "videoUrl", default)]
    pub video_url: Option<String>,
    /// Free-text dosage, e.g. "3 x 10" or "hold 30s per side".
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(rename = "sortOrder", default)]
    pub sort_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in ExerciseCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
            let parsed: ExerciseCategory = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(ExerciseCategory::parse("warm-up"), Some(ExerciseCategory::WarmUp));
        assert_eq!(ExerciseCategory::parse("WARMUP"), Some(ExerciseCategory::WarmUp));
        assert_eq!(ExerciseCategory::parse("stretch"), Some(ExerciseCategory::Mobilise));
        assert_eq!(ExerciseCategory::parse("mobilize"), Some(ExerciseCategory::Mobilise));
        assert_eq!(ExerciseCategory::parse("strength"), Some(ExerciseCategory::Strengthen));
        assert_eq!(ExerciseCategory::parse("recovery"), Some(ExerciseCategory::Recover));
        assert_eq!(ExerciseCategory::parse("cardio"), None);
    }

    #[test]
    fn test_parse_exercise_response() {
        let json = r#"[
            {
                "id": 12,
                "name": "Goblet Squat",
                "category": "strengthen",
                "groupId": 3,
                "videoUrl": "https://example.com/v/12",
                "dosage": "3 x 10",
                "sortOrder": 1
            },
            {
                "id": 13,
                "name": "Neck Rolls",
                "category": "warmup"
            }
        ]"#;

        let exercises: Vec<Exercise> = serde_json::from_str(json).unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].name, "Goblet Squat");
        assert_eq!(exercises[0].category, ExerciseCategory::Strengthen);
        assert_eq!(exercises[0].group_id, Some(3));
        assert_eq!(exercises[0].dosage.as_deref(), Some("3 x 10"));
        assert_eq!(exercises[1].category, ExerciseCategory::WarmUp);
        assert!(exercises[1].group_id.is_none());
        assert!(exercises[1].video_url.is_none());
    }

    #[test]
    fn test_parse_group_response() {
        let json = r#"[{"id": 1, "name": "Hip Stability", "focus": "glute medius"}]"#;
        let groups: Vec<ExerciseGroup> = serde_json::from_str(json).unwrap();
        assert_eq!(groups[0].name, "Hip Stability");
        assert_eq!(groups[0].focus.as_deref(), Some("glute medius"));
    }
}
