//! API client for the rewards-platform admin backend.
//!
//! All `/admin/*` endpoints expect a bearer token; callers obtain one from
//! the `SessionGuard` immediately before each request and pass it in. The
//! two credential endpoints (`/signin`, `/refresh`) take form-encoded
//! OAuth-style grant bodies. Create/update operations submit the full
//! record as query parameters - that is what the backend expects, the
//! console just mirrors it.

use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::models::{
    ActivityPoint, Boost, BoostDraft, Challenge, ChallengeDraft, ChallengeStatus, Clan,
    ClanAction, ClanTopEarner, DashboardUser, LeaderboardEntry, LeaderboardPeriod, Level,
    LevelDraft, LevelSlice, NewUserTotals, Reward, RewardDraft, SearchHit, Task, TaskDraft,
    CoinTotals, User, UserAction, UserTotals,
};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow cold starts on the hosted backend while still
/// failing fast enough for an interactive console.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size used when the clan endpoints require explicit paging
const CLAN_PAGE_SIZE: u32 = 100;

/// Token pair issued by the credential endpoints. `/refresh` responses may
/// omit the refresh token, in which case the stored one stays valid.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// API client for the admin backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    // =========================================================================
    // Credential exchange
    // =========================================================================

    /// Exchange username/password for a token pair
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let response = self
            .client
            .post(self.url("/signin"))
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
                ("scope", ""),
                ("client_id", "string"),
                ("client_secret", "string"),
            ])
            .send()
            .await?;

        // A sign-in 401 means bad credentials, not an expired session
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::AccessDenied(if body.is_empty() {
                "Invalid username or password".to_string()
            } else {
                body
            }));
        }

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Exchange a refresh token for a new access token. One request, no
    /// retry - a failure here is fatal to the session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let response = self
            .client
            .post(self.url("/refresh"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", "string"),
                ("client_secret", "string"),
            ])
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{} from {}", e, path))
        })
    }

    /// Send a request whose response body the console does not consume
    /// (create/update/delete/status endpoints return ack objects).
    async fn send(
        &self,
        token: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!(%url, method = %method, "request");
        let response = self
            .client
            .request(method, &url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn fetch_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.get_json(token, "/admin/user_management/users", &[]).await
    }

    pub async fn fetch_user(&self, token: &str, telegram_user_id: &str) -> Result<User, ApiError> {
        let path = format!("/admin/user_management/user/{}", telegram_user_id);
        self.get_json(token, &path, &[]).await
    }

    /// Apply a moderation action (suspend/ban/resume) through the security
    /// endpoint
    pub async fn alter_user_status(
        &self,
        token: &str,
        telegram_user_id: &str,
        action: UserAction,
    ) -> Result<(), ApiError> {
        let path = format!("/admin/security/suspend_user/{}", telegram_user_id);
        self.send(
            token,
            Method::POST,
            &path,
            &[("status", action.as_param().to_string())],
        )
        .await
    }

    // =========================================================================
    // Clans
    // =========================================================================

    pub async fn fetch_clans(&self, token: &str, category: &str) -> Result<Vec<Clan>, ApiError> {
        self.get_json(
            token,
            "/admin/clan/get_clans",
            &[
                ("category", category.to_string()),
                ("page", "1".to_string()),
                ("page_size", CLAN_PAGE_SIZE.to_string()),
            ],
        )
        .await
    }

    pub async fn fetch_clan(&self, token: &str, clan_id: &str) -> Result<Clan, ApiError> {
        let path = format!("/admin/clan/get_clan/{}", clan_id);
        self.get_json(token, &path, &[]).await
    }

    pub async fn alter_clan_status(
        &self,
        token: &str,
        clan_id: &str,
        action: ClanAction,
    ) -> Result<(), ApiError> {
        let path = format!("/admin/clan/alter_clan_status/{}", clan_id);
        self.send(
            token,
            Method::POST,
            &path,
            &[("alter_action", action.as_param().to_string())],
        )
        .await
    }

    pub async fn fetch_clan_top_earners(
        &self,
        token: &str,
        clan_id: &str,
    ) -> Result<Vec<ClanTopEarner>, ApiError> {
        let path = format!("/admin/clan/clan/{}/top_earner", clan_id);
        self.get_json(
            token,
            &path,
            &[
                ("page_number", "1".to_string()),
                ("page_size", "20".to_string()),
            ],
        )
        .await
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub async fn fetch_tasks(&self, token: &str) -> Result<Vec<Task>, ApiError> {
        self.get_json(token, "/admin/task/all_tasks", &[]).await
    }

    pub async fn fetch_task(&self, token: &str, task_id: &str) -> Result<Task, ApiError> {
        self.get_json(
            token,
            "/admin/task/tasks_by_id",
            &[("task_id", task_id.to_string())],
        )
        .await
    }

    pub async fn create_task(&self, token: &str, draft: &TaskDraft) -> Result<(), ApiError> {
        self.send(token, Method::POST, "/admin/task/create_task", &draft.query_params())
            .await
    }

    pub async fn update_task(&self, token: &str, draft: &TaskDraft) -> Result<(), ApiError> {
        self.send(token, Method::PUT, "/admin/task/update_task", &draft.query_params())
            .await
    }

    pub async fn delete_task(&self, token: &str, task_id: &str) -> Result<(), ApiError> {
        self.send(
            token,
            Method::DELETE,
            "/admin/task/delete_task",
            &[("task_id", task_id.to_string())],
        )
        .await
    }

    // =========================================================================
    // Challenges
    // =========================================================================

    pub async fn fetch_challenges(
        &self,
        token: &str,
        status: ChallengeStatus,
    ) -> Result<Vec<Challenge>, ApiError> {
        self.get_json(
            token,
            "/admin/challenge/get_challenges",
            &[("status", status.as_param().to_string())],
        )
        .await
    }

    pub async fn create_challenge(
        &self,
        token: &str,
        draft: &ChallengeDraft,
    ) -> Result<(), ApiError> {
        self.send(
            token,
            Method::POST,
            "/admin/challenge/create_challenge",
            &draft.query_params(),
        )
        .await
    }

    pub async fn update_challenge(
        &self,
        token: &str,
        draft: &ChallengeDraft,
    ) -> Result<(), ApiError> {
        self.send(
            token,
            Method::PUT,
            "/admin/challenge/update_challenge",
            &draft.query_params(),
        )
        .await
    }

    pub async fn delete_challenge(&self, token: &str, challenge_id: &str) -> Result<(), ApiError> {
        let path = format!("/admin/challenge/delete_challenge/{}", challenge_id);
        self.send(token, Method::DELETE, &path, &[]).await
    }

    // =========================================================================
    // Rewards
    // =========================================================================

    pub async fn fetch_rewards(&self, token: &str) -> Result<Vec<Reward>, ApiError> {
        self.get_json(token, "/admin/reward/get_rewards", &[]).await
    }

    pub async fn create_reward(&self, token: &str, draft: &RewardDraft) -> Result<(), ApiError> {
        self.send(
            token,
            Method::POST,
            "/admin/reward/create_reward",
            &draft.query_params(),
        )
        .await
    }

    pub async fn update_reward(&self, token: &str, draft: &RewardDraft) -> Result<(), ApiError> {
        let mut params = draft.query_params();
        if let Some(ref id) = draft.id {
            params.push(("reward_id", id.clone()));
        }
        self.send(token, Method::PUT, "/admin/reward/update_reward", &params)
            .await
    }

    pub async fn delete_reward(&self, token: &str, reward_id: &str) -> Result<(), ApiError> {
        self.send(
            token,
            Method::DELETE,
            "/admin/reward/delete_reward",
            &[("reward_id", reward_id.to_string())],
        )
        .await
    }

    // =========================================================================
    // Levels
    // =========================================================================

    pub async fn fetch_levels(&self, token: &str) -> Result<Vec<Level>, ApiError> {
        self.get_json(token, "/admin/levels/get_levels", &[]).await
    }

    pub async fn create_level(&self, token: &str, draft: &LevelDraft) -> Result<(), ApiError> {
        self.send(
            token,
            Method::POST,
            "/admin/levels/create_level",
            &draft.query_params(),
        )
        .await
    }

    pub async fn update_level(&self, token: &str, draft: &LevelDraft) -> Result<(), ApiError> {
        let id = draft
            .id
            .as_deref()
            .ok_or_else(|| ApiError::InvalidResponse("Level id missing for update".to_string()))?;
        let path = format!("/admin/levels/update_level/{}", id);
        self.send(token, Method::PUT, &path, &draft.query_params())
            .await
    }

    pub async fn delete_level(&self, token: &str, level_id: &str) -> Result<(), ApiError> {
        let path = format!("/admin/levels/delete_level/{}", level_id);
        self.send(token, Method::DELETE, &path, &[]).await
    }

    // =========================================================================
    // Boosts
    // =========================================================================

    pub async fn fetch_boosts(&self, token: &str) -> Result<Vec<Boost>, ApiError> {
        self.get_json(token, "/admin/boost/extra_boosters", &[]).await
    }

    pub async fn fetch_boost(&self, token: &str, boost_id: &str) -> Result<Boost, ApiError> {
        self.get_json(
            token,
            "/admin/boost/extra_booster",
            &[("extra_boost_id", boost_id.to_string())],
        )
        .await
    }

    pub async fn create_boost(&self, token: &str, draft: &BoostDraft) -> Result<(), ApiError> {
        self.send(
            token,
            Method::POST,
            "/admin/boost/create_boost",
            &draft.query_params(),
        )
        .await
    }

    pub async fn update_boost(&self, token: &str, draft: &BoostDraft) -> Result<(), ApiError> {
        let mut params = draft.query_params();
        if let Some(ref id) = draft.id {
            params.push(("extra_boost_id", id.clone()));
        }
        self.send(token, Method::PUT, "/admin/boost/update_boost", &params)
            .await
    }

    pub async fn delete_boost(&self, token: &str, boost_id: &str) -> Result<(), ApiError> {
        self.send(
            token,
            Method::DELETE,
            "/admin/boost/extra_booster",
            &[("extra_boost_id", boost_id.to_string())],
        )
        .await
    }

    /// Adjust a single booster's upgrade cost in place
    pub async fn edit_upgrade_cost(
        &self,
        token: &str,
        boost_id: &str,
        upgrade_cost: &str,
    ) -> Result<(), ApiError> {
        self.send(
            token,
            Method::PUT,
            "/admin/boost/edit_upgrade_cost",
            &[
                ("extra_boost_id", boost_id.to_string()),
                ("upgrade_cost", upgrade_cost.to_string()),
            ],
        )
        .await
    }

    // =========================================================================
    // Leaderboard
    // =========================================================================

    pub async fn fetch_leaderboard(
        &self,
        token: &str,
        period: LeaderboardPeriod,
    ) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.get_json(
            token,
            "/admin/leaderboard/",
            &[("category", period.as_param().to_string())],
        )
        .await
    }

    pub async fn fetch_leaderboard_profile(
        &self,
        token: &str,
        telegram_user_id: &str,
    ) -> Result<User, ApiError> {
        self.get_json(
            token,
            "/admin/leaderboard/leaderboard_profile",
            &[("telegram_user_id", telegram_user_id.to_string())],
        )
        .await
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn fetch_user_totals(&self, token: &str) -> Result<UserTotals, ApiError> {
        self.get_json(token, "/admin/dashboard/overall_total_users", &[])
            .await
    }

    pub async fn fetch_new_user_totals(&self, token: &str) -> Result<NewUserTotals, ApiError> {
        self.get_json(token, "/admin/dashboard/total_new_users", &[])
            .await
    }

    pub async fn fetch_coin_totals(&self, token: &str) -> Result<CoinTotals, ApiError> {
        self.get_json(token, "/admin/dashboard/overall_total_coins_earned", &[])
            .await
    }

    pub async fn fetch_new_users_list(&self, token: &str) -> Result<Vec<DashboardUser>, ApiError> {
        self.get_json(token, "/admin/dashboard/new_users", &[]).await
    }

    pub async fn fetch_dashboard_leaderboard(
        &self,
        token: &str,
    ) -> Result<Vec<DashboardUser>, ApiError> {
        self.get_json(token, "/admin/dashboard/leaderboard", &[]).await
    }

    pub async fn fetch_recent_coin_activity(
        &self,
        token: &str,
    ) -> Result<Vec<ActivityPoint>, ApiError> {
        self.get_json(token, "/admin/dashboard/coins/recent_activity", &[])
            .await
    }

    pub async fn fetch_recent_user_activity(
        &self,
        token: &str,
    ) -> Result<Vec<ActivityPoint>, ApiError> {
        self.get_json(token, "/admin/dashboard/users/recent_activity", &[])
            .await
    }

    pub async fn fetch_level_chart(&self, token: &str) -> Result<Vec<LevelSlice>, ApiError> {
        self.get_json(token, "/admin/dashboard/levels/chart_data", &[])
            .await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Free-text search returning one matched record per category
    pub async fn search(&self, token: &str, query: &str) -> Result<Vec<SearchHit>, ApiError> {
        let value: serde_json::Value = self
            .get_json(
                token,
                "/admin/dashboard/search",
                &[("query", query.to_string())],
            )
            .await?;
        Ok(SearchHit::from_response(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let api = ApiClient::new("https://api.example.com/").unwrap();
        assert_eq!(api.url("/signin"), "https://api.example.com/signin");

        let api = ApiClient::new("https://api.example.com").unwrap();
        assert_eq!(
            api.url("/admin/task/all_tasks"),
            "https://api.example.com/admin/task/all_tasks"
        );
    }

    #[test]
    fn test_token_pair_refresh_token_optional() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(pair.access_token, "abc");
        assert!(pair.refresh_token.is_none());

        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token": "abc", "refresh_token": "def"}"#).unwrap();
        assert_eq!(pair.refresh_token.as_deref(), Some("def"));
    }
}
