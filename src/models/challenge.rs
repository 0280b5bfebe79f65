use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Ongoing,
    Completed,
}

impl ChallengeStatus {
    pub fn as_param(&self) -> &'static str {
        match self {
            ChallengeStatus::Ongoing => "ongoing",
            ChallengeStatus::Completed => "completed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChallengeStatus::Ongoing => "Ongoing",
            ChallengeStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub launch_date: Option<String>,
    #[serde(default)]
    pub reward: i64,
    #[serde(default)]
    pub remaining_time: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub status: String,
}

impl Challenge {
    pub fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.status.as_str(),
        ]
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}

/// Full record re-submitted by the challenge form. The duration is sent as
/// separate day/hour/minute/second query parameters, matching the backend.
#[derive(Debug, Clone, Default)]
pub struct ChallengeDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub reward: String,
    pub launch_date: String,
    pub duration_days: u32,
    pub duration_hours: u32,
    pub duration_minutes: u32,
    pub duration_seconds: u32,
    /// "all_users", "clan", "level", or "specific_users"
    pub participant_type: String,
    pub participants: String,
}

impl ChallengeDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Challenge name is required".to_string());
        }
        if self.reward.trim().is_empty() {
            return Err("Challenge reward is required".to_string());
        }
        if self.launch_date.trim().is_empty() {
            return Err("Launch date is required".to_string());
        }
        Ok(())
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("reward", self.reward.clone()),
            ("launch_date", self.launch_date.clone()),
            ("duration_days", self.duration_days.to_string()),
            ("duration_hours", self.duration_hours.to_string()),
            ("duration_minutes", self.duration_minutes.to_string()),
            ("duration_seconds", self.duration_seconds.to_string()),
            (
                "participant_type",
                if self.participant_type.is_empty() {
                    "all_users".to_string()
                } else {
                    self.participant_type.clone()
                },
            ),
        ];
        if !self.participants.trim().is_empty() {
            params.push(("participants", self.participants.clone()));
        }
        if let Some(ref id) = self.id {
            params.push(("challenge_id", id.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_challenge() {
        let json = r#"{
            "id": "ch_77",
            "name": "Weekend Sprint",
            "description": "Most taps over the weekend",
            "launch_date": "2025-03-01",
            "reward": 50000,
            "remaining_time": "1d 4h",
            "participants": ["6839273829", "5512000441"],
            "status": "ongoing"
        }"#;
        let challenge: Challenge = serde_json::from_str(json).unwrap();
        assert_eq!(challenge.participant_count(), 2);
        assert_eq!(challenge.reward, 50000);
    }

    #[test]
    fn test_status_params() {
        assert_eq!(ChallengeStatus::Ongoing.as_param(), "ongoing");
        assert_eq!(ChallengeStatus::Completed.as_param(), "completed");
    }

    #[test]
    fn test_draft_duration_params() {
        let draft = ChallengeDraft {
            name: "Sprint".to_string(),
            reward: "1000".to_string(),
            launch_date: "2025-03-01".to_string(),
            duration_days: 2,
            duration_hours: 12,
            ..Default::default()
        };
        assert!(draft.validate().is_ok());
        let params = draft.query_params();
        assert!(params.contains(&("duration_days", "2".to_string())));
        assert!(params.contains(&("duration_hours", "12".to_string())));
        assert!(params.contains(&("participant_type", "all_users".to_string())));
        // No id on create
        assert!(!params.iter().any(|(k, _)| *k == "challenge_id"));
    }
}
