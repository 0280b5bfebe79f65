use serde::{Deserialize, Serialize};

use super::de_lenient_f64;

/// `/admin/dashboard/overall_total_users`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserTotals {
    #[serde(default)]
    pub total_users: i64,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub percentage_increase: f64,
}

/// `/admin/dashboard/total_new_users`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewUserTotals {
    #[serde(default)]
    pub total_new_users: i64,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub percentage_increase: f64,
}

/// `/admin/dashboard/overall_total_coins_earned`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoinTotals {
    #[serde(default)]
    pub overall_total_coins: i64,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub percentage_increase: f64,
}

/// Entry in the new-users and dashboard-leaderboard lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardUser {
    pub username: String,
    pub image_url: Option<String>,
}

/// One sample in the recent-activity sparkline feeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPoint {
    #[serde(default)]
    pub data: f64,
}

/// One slice of the user-levels chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSlice {
    pub level_name: String,
    #[serde(default)]
    pub total_users: i64,
}

/// Aggregated dashboard view state. Each field is owned by exactly one of
/// the eight stat fetches (or the live feed); results land independently
/// and last-write-per-key wins.
#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    pub user_totals: UserTotals,
    pub new_user_totals: NewUserTotals,
    pub coin_totals: CoinTotals,
    pub new_users: Vec<DashboardUser>,
    pub leaderboard: Vec<DashboardUser>,
    pub recent_coin_activity: Vec<ActivityPoint>,
    pub recent_user_activity: Vec<ActivityPoint>,
    pub user_levels: Vec<LevelSlice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_totals_with_string_percentage() {
        let totals: UserTotals =
            serde_json::from_str(r#"{"total_users": 48210, "percentage_increase": "4.2"}"#)
                .unwrap();
        assert_eq!(totals.total_users, 48210);
        assert!((totals.percentage_increase - 4.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_level_chart() {
        let slices: Vec<LevelSlice> = serde_json::from_str(
            r#"[{"level_name": "Novice", "total_users": 30500},
                {"level_name": "Explorer", "total_users": 9100}]"#,
        )
        .unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[1].total_users, 9100);
    }

    #[test]
    fn test_missing_fields_default() {
        let totals: CoinTotals = serde_json::from_str("{}").unwrap();
        assert_eq!(totals.overall_total_coins, 0);
        assert_eq!(totals.percentage_increase, 0.0);
    }
}
