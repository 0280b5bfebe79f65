use serde::{Deserialize, Serialize};

use super::de_lenient_string;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    #[serde(alias = "reward_title")]
    pub title: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub reward: Option<String>,
    #[serde(default)]
    pub beneficiary: String,
    #[serde(default, alias = "beneficiaryList")]
    pub beneficiary_list: Vec<String>,
    #[serde(alias = "expiryDate")]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "claimRate", deserialize_with = "de_lenient_string")]
    pub claim_rate: Option<String>,
}

impl Reward {
    pub fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.beneficiary.as_str(),
            self.status.as_str(),
        ]
    }

    pub fn amount_display(&self) -> &str {
        self.reward.as_deref().unwrap_or("0")
    }

    pub fn claim_rate_display(&self) -> &str {
        self.claim_rate.as_deref().unwrap_or("-")
    }
}

/// Full record re-submitted by the reward form
#[derive(Debug, Clone, Default)]
pub struct RewardDraft {
    pub id: Option<String>,
    pub title: String,
    pub amount: String,
    pub expiry_date: String,
    /// "all_users", "clan", "level", or "specific_users"
    pub beneficiary_type: String,
    pub beneficiaries: String,
}

impl RewardDraft {
    pub fn from_reward(reward: &Reward) -> Self {
        Self {
            id: Some(reward.id.clone()),
            title: reward.title.clone(),
            amount: reward.reward.clone().unwrap_or_default(),
            expiry_date: reward.expiry_date.clone().unwrap_or_default(),
            beneficiary_type: reward.beneficiary.clone(),
            beneficiaries: reward.beneficiary_list.join(","),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Reward title is required".to_string());
        }
        if self.amount.trim().is_empty() {
            return Err("Reward amount is required".to_string());
        }
        if self.expiry_date.trim().is_empty() {
            return Err("Expiry date is required".to_string());
        }
        Ok(())
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("reward_title", self.title.clone()),
            ("reward", self.amount.clone()),
            ("expiry_date", self.expiry_date.clone()),
            (
                "beneficiary",
                if self.beneficiary_type.is_empty() {
                    "all_users".to_string()
                } else {
                    self.beneficiary_type.clone()
                },
            ),
        ];
        if !self.beneficiaries.trim().is_empty() {
            params.push(("beneficiaries", self.beneficiaries.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reward_with_camel_case_aliases() {
        let json = r#"{
            "id": "rw_11",
            "title": "Early Bird Bonus",
            "reward": 10000,
            "beneficiary": "all_users",
            "beneficiaryList": ["6839273829"],
            "expiryDate": "2025-04-30",
            "status": "on_going",
            "claimRate": "37%"
        }"#;
        let reward: Reward = serde_json::from_str(json).unwrap();
        assert_eq!(reward.title, "Early Bird Bonus");
        assert_eq!(reward.amount_display(), "10000");
        assert_eq!(reward.beneficiary_list.len(), 1);
        assert_eq!(reward.claim_rate_display(), "37%");
    }

    #[test]
    fn test_draft_roundtrip() {
        let reward: Reward = serde_json::from_str(
            r#"{"id": "rw_12", "title": "Streak Saver", "reward": "500",
                "beneficiary": "level", "expiry_date": "2025-05-01", "status": "claimed"}"#,
        )
        .unwrap();
        let draft = RewardDraft::from_reward(&reward);
        assert!(draft.validate().is_ok());
        let params = draft.query_params();
        assert!(params.contains(&("reward_title", "Streak Saver".to_string())));
        assert!(params.contains(&("beneficiary", "level".to_string())));
    }
}
