use serde::{Deserialize, Serialize};

/// Ranking window selected by the leaderboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardPeriod {
    AllTime,
    Daily,
    Weekly,
    Monthly,
}

impl LeaderboardPeriod {
    pub const ALL: [LeaderboardPeriod; 4] = [
        LeaderboardPeriod::AllTime,
        LeaderboardPeriod::Daily,
        LeaderboardPeriod::Weekly,
        LeaderboardPeriod::Monthly,
    ];

    pub fn as_param(&self) -> &'static str {
        match self {
            LeaderboardPeriod::AllTime => "all_time",
            LeaderboardPeriod::Daily => "daily",
            LeaderboardPeriod::Weekly => "weekly",
            LeaderboardPeriod::Monthly => "monthly",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            LeaderboardPeriod::AllTime => "All Time",
            LeaderboardPeriod::Daily => "Daily",
            LeaderboardPeriod::Weekly => "Weekly",
            LeaderboardPeriod::Monthly => "Monthly",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(default)]
    pub level_name: String,
    #[serde(default)]
    pub coins_earned: i64,
    #[serde(default)]
    pub longest_streak: i64,
    #[serde(default)]
    pub rank: i64,
    pub telegram_user_id: Option<String>,
    pub level: Option<String>,
    pub image_url: Option<String>,
    pub clan: Option<String>,
}

impl LeaderboardEntry {
    pub fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.username.as_str(), self.level_name.as_str()];
        if let Some(ref clan) = self.clan {
            fields.push(clan.as_str());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        let json = r#"{
            "username": "tapper_one",
            "level_name": "Warrior",
            "coins_earned": 128450,
            "longest_streak": 9,
            "rank": 41,
            "telegram_user_id": "6839273829",
            "clan": "Night Owls"
        }"#;
        let entry: LeaderboardEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.rank, 41);
        assert!(entry.search_fields().contains(&"Night Owls"));
    }

    #[test]
    fn test_period_params() {
        assert_eq!(LeaderboardPeriod::AllTime.as_param(), "all_time");
        assert_eq!(LeaderboardPeriod::Weekly.as_param(), "weekly");
        assert_eq!(LeaderboardPeriod::ALL.len(), 4);
    }
}
