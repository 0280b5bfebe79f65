use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub coins_earned: i64,
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl Clan {
    pub fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.creator.as_str(),
            self.status.as_str(),
        ]
    }

}

/// Entry in a clan's top-earner listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanTopEarner {
    pub username: String,
    #[serde(default)]
    pub coins_earned: i64,
    pub rank: Option<i64>,
    pub image_url: Option<String>,
}

/// Status alterations accepted by the clan endpoint. A pending clan is
/// approved, an active clan disbanded, a disbanded clan resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClanAction {
    Approve,
    Disband,
    Resume,
}

impl ClanAction {
    pub fn as_param(&self) -> &'static str {
        match self {
            ClanAction::Approve => "approve",
            ClanAction::Disband => "disband",
            ClanAction::Resume => "resume",
        }
    }

    /// The action that makes sense for a clan in the given status, if any
    pub fn for_status(status: &str) -> Option<Self> {
        match status.to_lowercase().as_str() {
            "pending" => Some(ClanAction::Approve),
            "active" => Some(ClanAction::Disband),
            "disband" | "disbanded" => Some(ClanAction::Resume),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clan() {
        let json = r#"{
            "id": "cl_0193",
            "name": "Night Owls",
            "creator": "tapper_one",
            "rank": "3",
            "coins_earned": 8421500,
            "created_at": "2024-10-12",
            "status": "active"
        }"#;
        let clan: Clan = serde_json::from_str(json).unwrap();
        assert_eq!(clan.name, "Night Owls");
        assert_eq!(clan.coins_earned, 8421500);
        assert_eq!(clan.search_fields().len(), 3);
    }

    #[test]
    fn test_action_for_status() {
        assert_eq!(ClanAction::for_status("pending"), Some(ClanAction::Approve));
        assert_eq!(ClanAction::for_status("Active"), Some(ClanAction::Disband));
        assert_eq!(ClanAction::for_status("disband"), Some(ClanAction::Resume));
        assert_eq!(ClanAction::for_status("weird"), None);
    }
}
