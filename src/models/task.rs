use serde::{Deserialize, Serialize};

use super::de_lenient_string;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_name: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub task_description: String,
    #[serde(default)]
    pub task_status: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub task_reward: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub task_participants: Option<String>,
    pub task_deadline: Option<String>,
    pub image_url: Option<String>,
}

impl Task {
    /// Fields covered by the free-text search on the Tasks screen
    pub fn search_fields(&self) -> Vec<&str> {
        vec![
            self.task_name.as_str(),
            self.task_type.as_str(),
            self.task_status.as_str(),
        ]
    }

    pub fn reward_display(&self) -> &str {
        self.task_reward.as_deref().unwrap_or("0")
    }

    pub fn participants_display(&self) -> &str {
        self.task_participants.as_deref().unwrap_or("-")
    }
}

/// Full record re-submitted by the task form. The backend takes the scalar
/// fields as query parameters on both create and update.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub id: Option<String>,
    pub name: String,
    pub task_type: String,
    pub description: String,
    pub status: String,
    pub reward: String,
    pub deadline: String,
    pub participants: String,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            name: task.task_name.clone(),
            task_type: task.task_type.clone(),
            description: task.task_description.clone(),
            status: task.task_status.clone(),
            reward: task.task_reward.clone().unwrap_or_default(),
            deadline: task.task_deadline.clone().unwrap_or_default(),
            participants: task.task_participants.clone().unwrap_or_default(),
        }
    }

    /// Presence check mirroring the form's required fields
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Task name is required".to_string());
        }
        if self.task_type.trim().is_empty() {
            return Err("Task type is required".to_string());
        }
        if self.status.trim().is_empty() {
            return Err("Task status is required".to_string());
        }
        Ok(())
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("task_name", self.name.clone()),
            ("task_type", self.task_type.clone()),
            ("task_description", self.description.clone()),
            ("task_status", self.status.clone()),
            ("task_reward", self.reward.clone()),
            ("task_deadline", self.deadline.clone()),
            ("task_participants", self.participants.clone()),
        ];
        if let Some(ref id) = self.id {
            params.push(("task_id", id.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task() {
        let json = r#"{
            "id": "t_301",
            "task_name": "Follow on X",
            "task_type": "social",
            "task_description": "Follow the official account",
            "task_status": "active",
            "task_reward": "2500",
            "task_participants": "1204"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.task_type, "social");
        assert_eq!(task.reward_display(), "2500");
        assert!(task.task_deadline.is_none());
    }

    #[test]
    fn test_numeric_reward_accepted() {
        let json = r#"{"id": "t_1", "task_name": "Tap 100 times", "task_reward": 500}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.reward_display(), "500");
    }

    #[test]
    fn test_draft_roundtrip_and_validation() {
        let task: Task = serde_json::from_str(
            r#"{"id": "t_2", "task_name": "Invite a friend", "task_type": "special",
                "task_status": "paused", "task_reward": "1000"}"#,
        )
        .unwrap();

        let draft = TaskDraft::from_task(&task);
        assert!(draft.validate().is_ok());

        let params = draft.query_params();
        assert!(params.contains(&("task_id", "t_2".to_string())));
        assert!(params.contains(&("task_status", "paused".to_string())));

        let empty = TaskDraft::default();
        assert!(empty.validate().is_err());
    }
}
