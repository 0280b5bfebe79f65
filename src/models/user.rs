use serde::{Deserialize, Serialize};

use super::de_lenient_string;

/// Per-user achievement block, present on profile responses in both an
/// overall and a today flavor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Achievement {
    #[serde(default)]
    pub total_coin: i64,
    pub completed_tasks: Option<i64>,
    pub longest_streak: Option<i64>,
    pub current_streak: Option<i64>,
    pub rank: Option<String>,
    pub invitees: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanMembership {
    pub clan_name: Option<String>,
    pub in_clan_rank: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub telegram_user_id: String,
    pub username: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub level_name: String,
    #[serde(default)]
    pub coins_earned: i64,
    #[serde(default)]
    pub invite_count: i64,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub status: Option<String>,
    pub registration_date: Option<String>,
    pub created_at: Option<String>,
    pub image_url: Option<String>,
    pub wallet_address: Option<String>,
    pub overall_achievement: Option<Achievement>,
    pub today_achievement: Option<Achievement>,
    pub clan: Option<ClanMembership>,
}

impl User {
    /// Status normalized for filtering/display. The backend reports a plain
    /// string for most users but a numeric code for legacy rows.
    pub fn status_label(&self) -> &str {
        match self.status.as_deref() {
            Some("1") | Some("active") | Some("Active") => "active",
            Some("suspended") | Some("Suspended") => "suspended",
            Some("banned") | Some("Banned") | Some("disband") => "banned",
            Some(other) => other,
            None => "unknown",
        }
    }

    /// Fields covered by the free-text search on the Users screen
    pub fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.username.as_str(), self.level_name.as_str()];
        if let Some(ref status) = self.status {
            fields.push(status.as_str());
        }
        fields
    }

    pub fn clan_name(&self) -> &str {
        self.clan
            .as_ref()
            .and_then(|c| c.clan_name.as_deref())
            .unwrap_or("-")
    }
}

/// Moderation actions applied through the security endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Suspend,
    Ban,
    Resume,
}

impl UserAction {
    pub fn as_param(&self) -> &'static str {
        match self {
            UserAction::Suspend => "suspend",
            UserAction::Ban => "ban",
            UserAction::Resume => "resume",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_with_nested_detail() {
        let json = r#"{
            "telegram_user_id": "6839273829",
            "username": "tapper_one",
            "level": 4,
            "level_name": "Warrior",
            "coins_earned": 128450,
            "invite_count": 3,
            "status": "active",
            "registration_date": "2024-11-02T09:15:00Z",
            "image_url": "https://cdn.example.com/u/6839273829.png",
            "overall_achievement": {
                "total_coin": 128450,
                "completed_tasks": 17,
                "longest_streak": 9,
                "rank": "41"
            },
            "clan": {"clan_name": "Night Owls", "in_clan_rank": 2}
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "tapper_one");
        assert_eq!(user.status_label(), "active");
        assert_eq!(user.clan_name(), "Night Owls");
        let overall = user.overall_achievement.unwrap();
        assert_eq!(overall.completed_tasks, Some(17));
        assert_eq!(overall.invitees, None);
    }

    #[test]
    fn test_numeric_status_normalized() {
        let json = r#"{"telegram_user_id": "1", "username": "legacy", "status": 1}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.status_label(), "active");
    }

    #[test]
    fn test_missing_status_is_unknown() {
        let json = r#"{"telegram_user_id": "2", "username": "ghost"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.status_label(), "unknown");
        assert_eq!(user.clan_name(), "-");
    }

    #[test]
    fn test_user_action_params() {
        assert_eq!(UserAction::Suspend.as_param(), "suspend");
        assert_eq!(UserAction::Ban.as_param(), "ban");
        assert_eq!(UserAction::Resume.as_param(), "resume");
    }
}
