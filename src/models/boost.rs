use serde::{Deserialize, Serialize};

use super::de_lenient_string;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boost {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub level: Option<String>,
    #[serde(default)]
    pub effect: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub upgrade_cost: Option<String>,
    #[serde(default)]
    pub condition: String,
}

impl Boost {
    pub fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.effect.as_str(),
        ]
    }

    pub fn level_display(&self) -> &str {
        self.level.as_deref().unwrap_or("-")
    }

    pub fn upgrade_cost_display(&self) -> &str {
        self.upgrade_cost.as_deref().unwrap_or("0")
    }
}

/// Full record re-submitted by the booster form
#[derive(Debug, Clone, Default)]
pub struct BoostDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub level: String,
    pub effect: String,
    pub upgrade_cost: String,
    pub condition: String,
}

impl BoostDraft {
    pub fn from_boost(boost: &Boost) -> Self {
        Self {
            id: Some(boost.id.clone()),
            name: boost.name.clone(),
            description: boost.description.clone(),
            level: boost.level.clone().unwrap_or_default(),
            effect: boost.effect.clone(),
            upgrade_cost: boost.upgrade_cost.clone().unwrap_or_default(),
            condition: boost.condition.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Booster name is required".to_string());
        }
        if self.effect.trim().is_empty() {
            return Err("Booster effect is required".to_string());
        }
        Ok(())
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("level", self.level.clone()),
            ("effect", self.effect.clone()),
            ("upgrade_cost", self.upgrade_cost.clone()),
            ("condition", self.condition.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boost_with_mixed_numeric_fields() {
        let json = r#"{
            "id": "bs_2",
            "name": "Multitap",
            "description": "Earn more per tap",
            "level": 3,
            "effect": "+2 coins per tap",
            "upgrade_cost": "25000",
            "condition": "Reach level 2"
        }"#;
        let boost: Boost = serde_json::from_str(json).unwrap();
        assert_eq!(boost.level_display(), "3");
        assert_eq!(boost.upgrade_cost_display(), "25000");
    }

    #[test]
    fn test_draft_validation() {
        let boost: Boost = serde_json::from_str(
            r#"{"id": "bs_3", "name": "Auto Tap", "effect": "taps while away"}"#,
        )
        .unwrap();
        let draft = BoostDraft::from_boost(&boost);
        assert!(draft.validate().is_ok());
        assert_eq!(draft.id.as_deref(), Some("bs_3"));

        let empty = BoostDraft::default();
        assert!(empty.validate().is_err());
    }
}
