use serde_json::Value;

/// One cross-entity search result. The search endpoint returns an array of
/// single-key objects - `[{"user_1": {...}}, {"clans_1": {...}}]` - one
/// matched record per category, with the record shape varying by category.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub category: String,
    pub record: Value,
}

impl SearchHit {
    /// Flatten the wire format into a hit list, skipping entries that are
    /// not single-key objects.
    pub fn from_response(value: Value) -> Vec<SearchHit> {
        let Value::Array(items) = value else {
            return Vec::new();
        };

        items
            .into_iter()
            .filter_map(|item| {
                let Value::Object(map) = item else {
                    return None;
                };
                let mut entries = map.into_iter();
                let (category, record) = entries.next()?;
                Some(SearchHit { category, record })
            })
            .collect()
    }

    /// Human-readable category, collapsing the backend's numbered keys
    /// ("user_1", "clans_3") onto screen names.
    pub fn category_display(&self) -> &'static str {
        let base = self
            .category
            .rsplit_once('_')
            .map(|(head, tail)| {
                if tail.chars().all(|c| c.is_ascii_digit()) {
                    head
                } else {
                    self.category.as_str()
                }
            })
            .unwrap_or(self.category.as_str());

        match base {
            "user" | "users" => "Leaderboard",
            "user_management" => "User Mgt",
            "clan" | "clans" => "Clans",
            "task" | "tasks" => "Tasks",
            "reward" | "rewards" => "Rewards",
            "challenge" | "challenges" => "Challenges",
            "level" | "levels" => "Levels",
            _ => "User",
        }
    }

    /// Best-effort display name for the matched record
    pub fn label(&self) -> String {
        for key in ["username", "name", "task_name", "title"] {
            if let Some(Value::String(s)) = self.record.get(key) {
                return s.clone();
            }
        }
        "(unnamed)".to_string()
    }

    /// Best-effort detail line (coins earned where present)
    pub fn detail(&self) -> String {
        match self.record.get("coins_earned") {
            Some(Value::Number(n)) => format!("{} coins", n),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_response() {
        let response = json!([
            {"user_1": {"username": "tapper_one", "coins_earned": 128450}},
            {"tasks_1": {"task_name": "Follow on X"}},
            "not-an-object",
            {}
        ]);
        let hits = SearchHit::from_response(response);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].category, "user_1");
        assert_eq!(hits[0].label(), "tapper_one");
        assert_eq!(hits[0].detail(), "128450 coins");
        assert_eq!(hits[1].category_display(), "Tasks");
        assert_eq!(hits[1].detail(), "");
    }

    #[test]
    fn test_category_display_numbered_keys() {
        let hit = SearchHit {
            category: "user_management_2".to_string(),
            record: Value::Null,
        };
        assert_eq!(hit.category_display(), "User Mgt");

        let hit = SearchHit {
            category: "levels_1".to_string(),
            record: Value::Null,
        };
        assert_eq!(hit.category_display(), "Levels");
    }

    #[test]
    fn test_non_array_response_is_empty() {
        assert!(SearchHit::from_response(json!({"users": []})).is_empty());
        assert!(SearchHit::from_response(Value::Null).is_empty());
    }
}
