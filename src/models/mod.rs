//! Data models for the rewards-platform entities.
//!
//! Records arrive verbatim from the backend and live in transient view
//! state - last fetch wins. The structs here mirror the wire shapes:
//!
//! - `User`: player accounts with nested achievement/clan detail
//! - `Clan`, `ClanTopEarner`: player groups and their earners
//! - `Task`, `Challenge`, `Reward`, `Level`, `Boost`: configurable content
//! - `LeaderboardEntry`: ranked player listings per period
//! - Dashboard stat records and one-per-category `SearchHit`s

pub mod boost;
pub mod challenge;
pub mod clan;
pub mod dashboard;
pub mod leaderboard;
pub mod level;
pub mod reward;
pub mod search;
pub mod task;
pub mod user;

pub use boost::{Boost, BoostDraft};
pub use challenge::{Challenge, ChallengeDraft, ChallengeStatus};
pub use clan::{Clan, ClanAction, ClanTopEarner};
pub use dashboard::{
    ActivityPoint, CoinTotals, DashboardStats, DashboardUser, LevelSlice, NewUserTotals,
    UserTotals,
};
pub use leaderboard::{LeaderboardEntry, LeaderboardPeriod};
pub use level::{Level, LevelDraft};
pub use reward::{Reward, RewardDraft};
pub use search::SearchHit;
pub use task::{Task, TaskDraft};
pub use user::{Achievement, ClanMembership, User, UserAction};

use serde::{Deserialize, Deserializer};

/// Accept a JSON string, number, or null where the backend is inconsistent
/// about the type (e.g. user status, boost upgrade cost).
pub(crate) fn de_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Str(String),
        Int(i64),
        Float(f64),
        None,
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Str(s) => Some(s),
        Lenient::Int(n) => Some(n.to_string()),
        Lenient::Float(n) => Some(n.to_string()),
        Lenient::None => None,
    })
}

/// Accept a percentage delivered as either a number or a numeric string.
pub(crate) fn de_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Num(f64),
        Str(String),
        None,
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Num(n) => n,
        Lenient::Str(s) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        Lenient::None => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "de_lenient_string")]
        status: Option<String>,
        #[serde(default, deserialize_with = "de_lenient_f64")]
        pct: f64,
    }

    #[test]
    fn test_lenient_string_accepts_mixed_types() {
        let p: Probe = serde_json::from_str(r#"{"status": "active", "pct": 3.5}"#).unwrap();
        assert_eq!(p.status.as_deref(), Some("active"));
        assert!((p.pct - 3.5).abs() < f64::EPSILON);

        let p: Probe = serde_json::from_str(r#"{"status": 1, "pct": "12.5%"}"#).unwrap();
        assert_eq!(p.status.as_deref(), Some("1"));
        assert!((p.pct - 12.5).abs() < f64::EPSILON);

        let p: Probe = serde_json::from_str(r#"{"status": null, "pct": "garbage"}"#).unwrap();
        assert_eq!(p.status, None);
        assert_eq!(p.pct, 0.0);
    }
}
