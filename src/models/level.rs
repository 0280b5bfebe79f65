use serde::{Deserialize, Serialize};

use super::de_lenient_string;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub requirement: Option<String>,
    /// Badge image URL; rendered fronts fetch this, the console just lists it
    pub badge: Option<String>,
}

impl Level {
    pub fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        if let Some(ref req) = self.requirement {
            fields.push(req.as_str());
        }
        fields
    }

    pub fn requirement_display(&self) -> &str {
        self.requirement.as_deref().unwrap_or("-")
    }
}

/// Full record re-submitted by the level form
#[derive(Debug, Clone, Default)]
pub struct LevelDraft {
    pub id: Option<String>,
    pub name: String,
    pub level: String,
    pub requirement: String,
}

impl LevelDraft {
    pub fn from_level(level: &Level) -> Self {
        Self {
            id: Some(level.id.clone()),
            name: level.name.clone(),
            level: level.level.to_string(),
            requirement: level.requirement.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Level name is required".to_string());
        }
        if self.level.trim().parse::<i64>().is_err() {
            return Err("Level number must be an integer".to_string());
        }
        Ok(())
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("level", self.level.trim().to_string()),
            ("requirement", self.requirement.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let json = r#"{
            "id": "lv_4",
            "name": "Warrior",
            "level": 4,
            "requirement": "500000",
            "badge": "https://cdn.example.com/badges/warrior.png"
        }"#;
        let level: Level = serde_json::from_str(json).unwrap();
        assert_eq!(level.name, "Warrior");
        assert_eq!(level.requirement_display(), "500000");
    }

    #[test]
    fn test_numeric_requirement_accepted() {
        let json = r#"{"id": "lv_1", "name": "Novice", "level": 1, "requirement": 0}"#;
        let level: Level = serde_json::from_str(json).unwrap();
        assert_eq!(level.requirement_display(), "0");
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = LevelDraft {
            name: "Master".to_string(),
            level: "5".to_string(),
            ..Default::default()
        };
        assert!(draft.validate().is_ok());

        draft.level = "five".to_string();
        assert!(draft.validate().is_err());
    }
}
