//! Application state management for tapdeck.
//!
//! The `App` struct owns all view state: one `TableView` per entity screen,
//! the dashboard stats, overlay state, and the channel that background
//! fetch tasks report into. The TUI event loop is the only writer; spawned
//! tasks communicate exclusively through `RefreshResult` messages drained
//! once per loop tick.

use std::path::PathBuf;

use anyhow::Result;
use futures::future;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{CredentialStore, Session, SessionGuard};
use crate::config::Config;
use crate::export;
use crate::live::{self, LiveMessage};
use crate::models::{
    Boost, BoostDraft, Challenge, ChallengeDraft, ChallengeStatus, Clan, ClanAction,
    ClanTopEarner, DashboardStats, LeaderboardEntry, LeaderboardPeriod, Level, LevelDraft,
    Reward, RewardDraft, SearchHit, Task, TaskDraft, User, UserAction,
};
use crate::table::{FilterGroup, FilterOption, SortColumn, TableView};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// 64 leaves headroom for the dashboard fan-out plus live-feed bursts.
const CHANNEL_BUFFER_SIZE: usize = 64;

/// Maximum length for username input
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for search input
const MAX_SEARCH_LENGTH: usize = 80;

// ============================================================================
// UI State Types
// ============================================================================

/// Entity screens, one per backend collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Users,
    Clans,
    Tasks,
    Challenges,
    Rewards,
    Levels,
    Boosts,
    Leaderboard,
}

impl Screen {
    pub const ALL: [Screen; 9] = [
        Screen::Dashboard,
        Screen::Users,
        Screen::Clans,
        Screen::Tasks,
        Screen::Challenges,
        Screen::Rewards,
        Screen::Levels,
        Screen::Boosts,
        Screen::Leaderboard,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Users => "Users",
            Screen::Clans => "Clans",
            Screen::Tasks => "Tasks",
            Screen::Challenges => "Challenges",
            Screen::Rewards => "Rewards",
            Screen::Levels => "Levels",
            Screen::Boosts => "Boosts",
            Screen::Leaderboard => "Leaderboard",
        }
    }

    /// File-name slug for exports
    pub fn slug(&self) -> &'static str {
        match self {
            Screen::Dashboard => "dashboard",
            Screen::Users => "users",
            Screen::Clans => "clans",
            Screen::Tasks => "tasks",
            Screen::Challenges => "challenges",
            Screen::Rewards => "rewards",
            Screen::Levels => "levels",
            Screen::Boosts => "boosts",
            Screen::Leaderboard => "leaderboard",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    FilterMenu,
    SigningIn,
    EditingForm,
    ConfirmingDelete,
    ConfirmingAction,
    ShowingDetail,
    GlobalSearch,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Sign-in form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInFocus {
    Username,
    Password,
    Button,
}

/// Cursor within the filter dropdown
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCursor {
    pub group: usize,
    pub option: usize,
}

// ============================================================================
// Overlay payloads
// ============================================================================

/// Which entity a form edits, and how to submit it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Task,
    Challenge,
    Reward,
    Level,
    Boost,
    BoostCost,
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
}

impl FormField {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

/// Generic overlay form: a flat list of text fields plus a submit target.
/// The full record is re-submitted on save, matching the backend contract.
#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub id: Option<String>,
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    fn new(kind: FormKind, id: Option<String>, title: &str, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            id,
            title: title.to_string(),
            fields,
            focus: 0,
            error: None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn value(&self, index: usize) -> String {
        self.fields.get(index).map(|f| f.value.clone()).unwrap_or_default()
    }

    fn numeric(&self, index: usize) -> u32 {
        self.value(index).trim().parse().unwrap_or(0)
    }

    pub fn task_create() -> Self {
        Self::new(
            FormKind::Task,
            None,
            "Create Task",
            vec![
                FormField::new("Name", String::new()),
                FormField::new("Type", "in-game".to_string()),
                FormField::new("Description", String::new()),
                FormField::new("Status", "active".to_string()),
                FormField::new("Reward", String::new()),
                FormField::new("Deadline", String::new()),
                FormField::new("Participants", String::new()),
            ],
        )
    }

    pub fn task_edit(task: &Task) -> Self {
        let draft = TaskDraft::from_task(task);
        let mut form = Self::task_create();
        form.id = Some(task.id.clone());
        form.title = "Edit Task".to_string();
        form.fields[0].value = draft.name;
        form.fields[1].value = draft.task_type;
        form.fields[2].value = draft.description;
        form.fields[3].value = draft.status;
        form.fields[4].value = draft.reward;
        form.fields[5].value = draft.deadline;
        form.fields[6].value = draft.participants;
        form
    }

    fn task_draft(&self) -> TaskDraft {
        TaskDraft {
            id: self.id.clone(),
            name: self.value(0),
            task_type: self.value(1),
            description: self.value(2),
            status: self.value(3),
            reward: self.value(4),
            deadline: self.value(5),
            participants: self.value(6),
        }
    }

    pub fn challenge_create() -> Self {
        Self::new(
            FormKind::Challenge,
            None,
            "Create Challenge",
            vec![
                FormField::new("Name", String::new()),
                FormField::new("Description", String::new()),
                FormField::new("Reward", String::new()),
                FormField::new("Launch Date", String::new()),
                FormField::new("Days", "0".to_string()),
                FormField::new("Hours", "0".to_string()),
                FormField::new("Minutes", "0".to_string()),
                FormField::new("Seconds", "0".to_string()),
                FormField::new("Participant Type", "all_users".to_string()),
                FormField::new("Participants", String::new()),
            ],
        )
    }

    pub fn challenge_edit(challenge: &Challenge) -> Self {
        let mut form = Self::challenge_create();
        form.id = Some(challenge.id.clone());
        form.title = "Edit Challenge".to_string();
        form.fields[0].value = challenge.name.clone();
        form.fields[1].value = challenge.description.clone();
        form.fields[2].value = challenge.reward.to_string();
        form.fields[3].value = challenge.launch_date.clone().unwrap_or_default();
        form.fields[9].value = challenge.participants.join(",");
        form
    }

    fn challenge_draft(&self) -> ChallengeDraft {
        ChallengeDraft {
            id: self.id.clone(),
            name: self.value(0),
            description: self.value(1),
            reward: self.value(2),
            launch_date: self.value(3),
            duration_days: self.numeric(4),
            duration_hours: self.numeric(5),
            duration_minutes: self.numeric(6),
            duration_seconds: self.numeric(7),
            participant_type: self.value(8),
            participants: self.value(9),
        }
    }

    pub fn reward_create() -> Self {
        Self::new(
            FormKind::Reward,
            None,
            "Create Reward",
            vec![
                FormField::new("Title", String::new()),
                FormField::new("Amount", String::new()),
                FormField::new("Expiry Date", String::new()),
                FormField::new("Beneficiary Type", "all_users".to_string()),
                FormField::new("Beneficiaries", String::new()),
            ],
        )
    }

    pub fn reward_edit(reward: &Reward) -> Self {
        let draft = RewardDraft::from_reward(reward);
        let mut form = Self::reward_create();
        form.id = Some(reward.id.clone());
        form.title = "Edit Reward".to_string();
        form.fields[0].value = draft.title;
        form.fields[1].value = draft.amount;
        form.fields[2].value = draft.expiry_date;
        form.fields[3].value = draft.beneficiary_type;
        form.fields[4].value = draft.beneficiaries;
        form
    }

    fn reward_draft(&self) -> RewardDraft {
        RewardDraft {
            id: self.id.clone(),
            title: self.value(0),
            amount: self.value(1),
            expiry_date: self.value(2),
            beneficiary_type: self.value(3),
            beneficiaries: self.value(4),
        }
    }

    pub fn level_create() -> Self {
        Self::new(
            FormKind::Level,
            None,
            "Create Level",
            vec![
                FormField::new("Name", String::new()),
                FormField::new("Level", String::new()),
                FormField::new("Requirement", String::new()),
            ],
        )
    }

    pub fn level_edit(level: &Level) -> Self {
        let draft = LevelDraft::from_level(level);
        let mut form = Self::level_create();
        form.id = Some(level.id.clone());
        form.title = "Edit Level".to_string();
        form.fields[0].value = draft.name;
        form.fields[1].value = draft.level;
        form.fields[2].value = draft.requirement;
        form
    }

    fn level_draft(&self) -> LevelDraft {
        LevelDraft {
            id: self.id.clone(),
            name: self.value(0),
            level: self.value(1),
            requirement: self.value(2),
        }
    }

    pub fn boost_create() -> Self {
        Self::new(
            FormKind::Boost,
            None,
            "Create Booster",
            vec![
                FormField::new("Name", String::new()),
                FormField::new("Description", String::new()),
                FormField::new("Level", String::new()),
                FormField::new("Effect", String::new()),
                FormField::new("Upgrade Cost", String::new()),
                FormField::new("Condition", String::new()),
            ],
        )
    }

    pub fn boost_edit(boost: &Boost) -> Self {
        let draft = BoostDraft::from_boost(boost);
        let mut form = Self::boost_create();
        form.id = Some(boost.id.clone());
        form.title = "Edit Booster".to_string();
        form.fields[0].value = draft.name;
        form.fields[1].value = draft.description;
        form.fields[2].value = draft.level;
        form.fields[3].value = draft.effect;
        form.fields[4].value = draft.upgrade_cost;
        form.fields[5].value = draft.condition;
        form
    }

    fn boost_draft(&self) -> BoostDraft {
        BoostDraft {
            id: self.id.clone(),
            name: self.value(0),
            description: self.value(1),
            level: self.value(2),
            effect: self.value(3),
            upgrade_cost: self.value(4),
            condition: self.value(5),
        }
    }

    pub fn boost_cost(boost: &Boost) -> Self {
        let mut form = Self::new(
            FormKind::BoostCost,
            Some(boost.id.clone()),
            "Edit Upgrade Cost",
            vec![FormField::new(
                "Upgrade Cost",
                boost.upgrade_cost.clone().unwrap_or_default(),
            )],
        );
        form.title = format!("Upgrade Cost - {}", boost.name);
        form
    }
}

/// Delete confirmation payload. The ids are snapshotted when the overlay
/// opens; later selection changes cannot alter what gets deleted.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub screen: Screen,
    pub ids: Vec<String>,
}

/// Status-alteration confirmation payload
#[derive(Debug, Clone)]
pub enum PendingAction {
    User { id: String, action: UserAction },
    Clan { id: String, action: ClanAction },
}

impl PendingAction {
    pub fn describe(&self) -> String {
        match self {
            PendingAction::User { action, .. } => {
                format!("{} this user?", action.as_param())
            }
            PendingAction::Clan { action, .. } => {
                format!("{} this clan?", action.as_param())
            }
        }
    }
}

/// Which full record to fetch before opening an edit form
enum EditFetch {
    Task(String),
    Boost(String),
}

/// Detail overlay payload (Enter on a row)
#[derive(Debug, Clone)]
pub enum DetailView {
    User(Box<User>),
    Clan {
        clan: Box<Clan>,
        top_earners: Vec<ClanTopEarner>,
    },
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned fetch/mutation tasks back to the main loop
enum RefreshResult {
    Users(Vec<User>),
    Clans(Vec<Clan>),
    Tasks(Vec<Task>),
    Challenges(Vec<Challenge>),
    Rewards(Vec<Reward>),
    Levels(Vec<Level>),
    Boosts(Vec<Boost>),
    Leaderboard(Vec<LeaderboardEntry>),
    UserDetail(Box<User>),
    ClanDetail(Box<Clan>, Vec<ClanTopEarner>),
    /// Full task record fetched ahead of opening the edit form
    TaskDetail(Box<Task>),
    /// Full booster record fetched ahead of opening the edit form
    BoostDetail(Box<Boost>),
    UserTotals(crate::models::UserTotals),
    NewUserTotals(crate::models::NewUserTotals),
    CoinTotals(crate::models::CoinTotals),
    NewUsersList(Vec<crate::models::DashboardUser>),
    DashboardLeaderboard(Vec<crate::models::DashboardUser>),
    CoinActivity(Vec<crate::models::ActivityPoint>),
    UserActivity(Vec<crate::models::ActivityPoint>),
    LevelChart(Vec<crate::models::LevelSlice>),
    SearchResults(Vec<SearchHit>),
    /// A create/update/delete/status call finished; refetch the screen
    MutationDone(Screen, String),
    SessionExpired,
    Error(String),
}

// ============================================================================
// Per-screen dispatch
// ============================================================================

/// Run a block against the current screen's table (no-op on the dashboard)
macro_rules! with_table {
    ($self:ident, $table:ident => $body:expr) => {
        match $self.screen {
            Screen::Users => {
                let $table = &mut $self.users;
                $body
            }
            Screen::Clans => {
                let $table = &mut $self.clans;
                $body
            }
            Screen::Tasks => {
                let $table = &mut $self.tasks;
                $body
            }
            Screen::Challenges => {
                let $table = &mut $self.challenges;
                $body
            }
            Screen::Rewards => {
                let $table = &mut $self.rewards;
                $body
            }
            Screen::Levels => {
                let $table = &mut $self.levels;
                $body
            }
            Screen::Boosts => {
                let $table = &mut $self.boosts;
                $body
            }
            Screen::Leaderboard => {
                let $table = &mut $self.leaderboard;
                $body
            }
            Screen::Dashboard => {}
        }
    };
}

/// Read-only variant of `with_table!` with a fallback for the dashboard
macro_rules! with_table_ref {
    ($self:ident, $table:ident => $body:expr, $default:expr) => {
        match $self.screen {
            Screen::Users => {
                let $table = &$self.users;
                $body
            }
            Screen::Clans => {
                let $table = &$self.clans;
                $body
            }
            Screen::Tasks => {
                let $table = &$self.tasks;
                $body
            }
            Screen::Challenges => {
                let $table = &$self.challenges;
                $body
            }
            Screen::Rewards => {
                let $table = &$self.rewards;
                $body
            }
            Screen::Levels => {
                let $table = &$self.levels;
                $body
            }
            Screen::Boosts => {
                let $table = &$self.boosts;
                $body
            }
            Screen::Leaderboard => {
                let $table = &$self.leaderboard;
                $body
            }
            Screen::Dashboard => $default,
        }
    };
}

/// One row of the filter dropdown, flattened for rendering
pub enum FilterMenuRow {
    Group(&'static str),
    Option {
        label: &'static str,
        active: bool,
        selected: bool,
    },
}

// ============================================================================
// Scope tabs (client-side, applied before filters)
// ============================================================================

fn task_scope_in_game(t: &Task) -> bool {
    t.task_type == "in-game"
}
fn task_scope_special(t: &Task) -> bool {
    t.task_type == "special"
}
fn task_scope_social(t: &Task) -> bool {
    t.task_type == "social"
}

pub const TASK_SCOPES: [(&str, Option<fn(&Task) -> bool>); 4] = [
    ("All Tasks", None),
    ("In-Game", Some(task_scope_in_game)),
    ("Special", Some(task_scope_special)),
    ("Social", Some(task_scope_social)),
];

fn clan_scope_active(c: &Clan) -> bool {
    c.status.eq_ignore_ascii_case("active")
}
fn clan_scope_pending(c: &Clan) -> bool {
    c.status.eq_ignore_ascii_case("pending")
}
fn clan_scope_disband(c: &Clan) -> bool {
    c.status.eq_ignore_ascii_case("disband") || c.status.eq_ignore_ascii_case("disbanded")
}

pub const CLAN_SCOPES: [(&str, Option<fn(&Clan) -> bool>); 4] = [
    ("All Clans", None),
    ("Active", Some(clan_scope_active)),
    ("Pending", Some(clan_scope_pending)),
    ("Disband", Some(clan_scope_disband)),
];

fn reward_scope_ongoing(r: &Reward) -> bool {
    r.status.eq_ignore_ascii_case("on_going") || r.status.eq_ignore_ascii_case("ongoing")
}
fn reward_scope_claimed(r: &Reward) -> bool {
    r.status.eq_ignore_ascii_case("claimed")
}

pub const REWARD_SCOPES: [(&str, Option<fn(&Reward) -> bool>); 3] = [
    ("All Rewards", None),
    ("On-going", Some(reward_scope_ongoing)),
    ("Claimed", Some(reward_scope_claimed)),
];

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub guard: SessionGuard,

    // UI state
    pub state: AppState,
    pub screen: Screen,
    pub status_message: Option<String>,
    pub filter_cursor: FilterCursor,

    // Sign-in form
    pub signin_username: String,
    pub signin_password: String,
    pub signin_focus: SignInFocus,
    pub signin_error: Option<String>,

    // Entity tables
    pub users: TableView<User>,
    pub clans: TableView<Clan>,
    pub tasks: TableView<Task>,
    pub challenges: TableView<Challenge>,
    pub rewards: TableView<Reward>,
    pub levels: TableView<Level>,
    pub boosts: TableView<Boost>,
    pub leaderboard: TableView<LeaderboardEntry>,

    // Server-side tab state
    pub challenge_status: ChallengeStatus,
    pub leaderboard_period: LeaderboardPeriod,

    // Client-side scope tab indices
    pub task_scope: usize,
    pub clan_scope: usize,
    pub reward_scope: usize,

    // Dashboard
    pub dashboard: DashboardStats,

    // Overlays
    pub form: Option<Form>,
    pub pending_delete: Option<PendingDelete>,
    pub pending_action: Option<PendingAction>,
    pub detail: Option<DetailView>,

    // Global cross-entity search
    pub search_query: String,
    pub search_hits: Vec<SearchHit>,
    pub search_cursor: usize,

    // Background task channels
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,
    live_rx: Option<mpsc::Receiver<LiveMessage>>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url)?;

        let data_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut session = Session::new(data_dir);
        match session.load() {
            Ok(found) => debug!(found, "Session load"),
            Err(e) => warn!(error = %e, "Failed to load session"),
        }
        let guard = SessionGuard::new(api.clone(), session);

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let signin_username = config.last_username.clone().unwrap_or_default();

        Ok(Self {
            config,
            api,
            guard,

            state: AppState::Normal,
            screen: Screen::Dashboard,
            status_message: None,
            filter_cursor: FilterCursor::default(),

            signin_username,
            signin_password: String::new(),
            signin_focus: SignInFocus::Username,
            signin_error: None,

            users: users_table(),
            clans: clans_table(),
            tasks: tasks_table(),
            challenges: challenges_table(),
            rewards: rewards_table(),
            levels: levels_table(),
            boosts: boosts_table(),
            leaderboard: leaderboard_table(),

            challenge_status: ChallengeStatus::Ongoing,
            leaderboard_period: LeaderboardPeriod::AllTime,

            task_scope: 0,
            clan_scope: 0,
            reward_scope: 0,

            dashboard: DashboardStats::default(),

            form: None,
            pending_delete: None,
            pending_action: None,
            detail: None,

            search_query: String::new(),
            search_hits: Vec::new(),
            search_cursor: 0,

            refresh_rx: rx,
            refresh_tx: tx,
            live_rx: None,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn is_authenticated(&self) -> bool {
        self.guard.is_signed_in().await
    }

    pub fn start_sign_in(&mut self) {
        self.state = AppState::SigningIn;
        self.signin_focus = if self.signin_username.is_empty() {
            SignInFocus::Username
        } else {
            SignInFocus::Password
        };
        self.signin_error = None;
    }

    /// Attempt sign-in with the credentials from the overlay form
    pub async fn attempt_sign_in(&mut self) -> Result<()> {
        let username = self.signin_username.clone();
        let password = self.signin_password.clone();

        if username.is_empty() || password.is_empty() {
            self.signin_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        self.signin_error = None;

        match self.guard.sign_in(&username, &password).await {
            Ok(()) => {
                if let Err(e) = CredentialStore::store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.signin_password.clear();
                self.state = AppState::Normal;
                self.start_live_feed();
                self.refresh_screen(self.screen);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Sign-in failed");
                let user_message = match &e {
                    ApiError::AccessDenied(_) | ApiError::Unauthorized => {
                        "Invalid username or password".to_string()
                    }
                    ApiError::Network(_) => {
                        "Unable to connect to server. Check your internet connection.".to_string()
                    }
                    other => format!("Sign-in failed: {}", other),
                };
                self.signin_error = Some(user_message);
                Err(e.into())
            }
        }
    }

    pub async fn sign_out(&mut self) {
        self.guard.sign_out().await;
        self.start_sign_in();
    }

    // =========================================================================
    // Live feed
    // =========================================================================

    /// Connect the WebSocket feed (idempotent)
    pub fn start_live_feed(&mut self) {
        if self.live_rx.is_some() {
            return;
        }
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let _feed = live::spawn(self.config.ws_url.clone(), tx);
        self.live_rx = Some(rx);
    }

    // =========================================================================
    // Background data refresh
    // =========================================================================

    /// Switch screen, fetching its collection if nothing is loaded yet
    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
        let needs_fetch = match screen {
            Screen::Dashboard => false, // fetched once at startup, then live
            Screen::Users => self.users.total_rows() == 0,
            Screen::Clans => self.clans.total_rows() == 0,
            Screen::Tasks => self.tasks.total_rows() == 0,
            Screen::Challenges => self.challenges.total_rows() == 0,
            Screen::Rewards => self.rewards.total_rows() == 0,
            Screen::Levels => self.levels.total_rows() == 0,
            Screen::Boosts => self.boosts.total_rows() == 0,
            Screen::Leaderboard => self.leaderboard.total_rows() == 0,
        };
        if needs_fetch {
            self.refresh_screen(screen);
        }
    }

    /// Spawn a background fetch for one screen's collection.
    ///
    /// The guard is consulted inside the task, immediately before the fetch,
    /// so an expired token is exchanged exactly once even when several
    /// fetches are in flight.
    pub fn refresh_screen(&mut self, screen: Screen) {
        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let guard = self.guard.clone();
        let challenge_status = self.challenge_status;
        let leaderboard_period = self.leaderboard_period;

        self.status_message = Some(format!("Fetching {}...", screen.title()));

        tokio::spawn(async move {
            let token = match guard.bearer().await {
                Ok(token) => token,
                Err(e) => {
                    Self::send_auth_failure(&tx, e).await;
                    return;
                }
            };

            match screen {
                Screen::Dashboard => {
                    Self::refresh_dashboard(&tx, &api, &token).await;
                    return;
                }
                Screen::Users => {
                    Self::send_fetch(&tx, "Users", api.fetch_users(&token).await, RefreshResult::Users)
                        .await;
                }
                Screen::Clans => {
                    Self::send_fetch(
                        &tx,
                        "Clans",
                        api.fetch_clans(&token, "all_clans").await,
                        RefreshResult::Clans,
                    )
                    .await;
                }
                Screen::Tasks => {
                    Self::send_fetch(&tx, "Tasks", api.fetch_tasks(&token).await, RefreshResult::Tasks)
                        .await;
                }
                Screen::Challenges => {
                    Self::send_fetch(
                        &tx,
                        "Challenges",
                        api.fetch_challenges(&token, challenge_status).await,
                        RefreshResult::Challenges,
                    )
                    .await;
                }
                Screen::Rewards => {
                    Self::send_fetch(
                        &tx,
                        "Rewards",
                        api.fetch_rewards(&token).await,
                        RefreshResult::Rewards,
                    )
                    .await;
                }
                Screen::Levels => {
                    Self::send_fetch(
                        &tx,
                        "Levels",
                        api.fetch_levels(&token).await,
                        RefreshResult::Levels,
                    )
                    .await;
                }
                Screen::Boosts => {
                    Self::send_fetch(
                        &tx,
                        "Boosts",
                        api.fetch_boosts(&token).await,
                        RefreshResult::Boosts,
                    )
                    .await;
                }
                Screen::Leaderboard => {
                    Self::send_fetch(
                        &tx,
                        "Leaderboard",
                        api.fetch_leaderboard(&token, leaderboard_period).await,
                        RefreshResult::Leaderboard,
                    )
                    .await;
                }
            }
        });
    }

    /// Fan out the eight dashboard stat fetches in parallel. Each result
    /// lands independently; last write per key wins.
    async fn refresh_dashboard(tx: &mpsc::Sender<RefreshResult>, api: &ApiClient, token: &str) {
        let (totals, new_totals, coins, new_list, board, coin_act, user_act, chart) = tokio::join!(
            api.fetch_user_totals(token),
            api.fetch_new_user_totals(token),
            api.fetch_coin_totals(token),
            api.fetch_new_users_list(token),
            api.fetch_dashboard_leaderboard(token),
            api.fetch_recent_coin_activity(token),
            api.fetch_recent_user_activity(token),
            api.fetch_level_chart(token),
        );

        Self::send_fetch(tx, "UserTotals", totals, RefreshResult::UserTotals).await;
        Self::send_fetch(tx, "NewUserTotals", new_totals, RefreshResult::NewUserTotals).await;
        Self::send_fetch(tx, "CoinTotals", coins, RefreshResult::CoinTotals).await;
        Self::send_fetch(tx, "NewUsersList", new_list, RefreshResult::NewUsersList).await;
        Self::send_fetch(tx, "DashboardLeaderboard", board, RefreshResult::DashboardLeaderboard)
            .await;
        Self::send_fetch(tx, "CoinActivity", coin_act, RefreshResult::CoinActivity).await;
        Self::send_fetch(tx, "UserActivity", user_act, RefreshResult::UserActivity).await;
        Self::send_fetch(tx, "LevelChart", chart, RefreshResult::LevelChart).await;
    }

    /// Helper to send refresh results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Helper to send a successful fetch result or an error
    async fn send_fetch<T, F>(
        tx: &mpsc::Sender<RefreshResult>,
        name: &str,
        result: Result<T, ApiError>,
        wrapper: F,
    ) where
        F: FnOnce(T) -> RefreshResult,
    {
        match result {
            Ok(data) => {
                debug!("{} fetched successfully", name);
                Self::send_result(tx, wrapper(data)).await;
            }
            Err(e) if e.requires_signin() => {
                Self::send_auth_failure(tx, e).await;
            }
            Err(e) => {
                error!(error = %e, "{} fetch failed", name);
                Self::send_result(tx, RefreshResult::Error(format!("{}: {}", name, e))).await;
            }
        }
    }

    async fn send_auth_failure(tx: &mpsc::Sender<RefreshResult>, error: ApiError) {
        warn!(error = %error, "Authentication failure in background task");
        Self::send_result(tx, RefreshResult::SessionExpired).await;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Open the delete confirmation, snapshotting the selected ids now
    pub fn request_delete(&mut self) {
        let (screen, ids) = match self.screen {
            Screen::Tasks => (Screen::Tasks, self.tasks.selected_ids()),
            Screen::Challenges => (Screen::Challenges, self.challenges.selected_ids()),
            Screen::Rewards => (Screen::Rewards, self.rewards.selected_ids()),
            Screen::Levels => (Screen::Levels, self.levels.selected_ids()),
            Screen::Boosts => (Screen::Boosts, self.boosts.selected_ids()),
            _ => return,
        };
        if ids.is_empty() {
            self.status_message = Some("No rows selected".to_string());
            return;
        }
        self.pending_delete = Some(PendingDelete { screen, ids });
        self.state = AppState::ConfirmingDelete;
    }

    /// Fan out one DELETE per snapshotted id, await all, then refetch once.
    /// The selection is cleared immediately - the refetch also prunes it.
    pub fn confirm_delete(&mut self) {
        let Some(pending) = self.pending_delete.take() else {
            self.state = AppState::Normal;
            return;
        };
        self.state = AppState::Normal;

        match pending.screen {
            Screen::Tasks => self.tasks.clear_selection(),
            Screen::Challenges => self.challenges.clear_selection(),
            Screen::Rewards => self.rewards.clear_selection(),
            Screen::Levels => self.levels.clear_selection(),
            Screen::Boosts => self.boosts.clear_selection(),
            _ => {}
        }

        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let guard = self.guard.clone();
        let count = pending.ids.len();
        self.status_message = Some(format!("Deleting {} row(s)...", count));

        tokio::spawn(async move {
            let token = match guard.bearer().await {
                Ok(token) => token,
                Err(e) => {
                    Self::send_auth_failure(&tx, e).await;
                    return;
                }
            };

            let deletes = pending.ids.iter().map(|id| {
                let api = api.clone();
                let token = token.clone();
                let screen = pending.screen;
                let id = id.clone();
                async move {
                    match screen {
                        Screen::Tasks => api.delete_task(&token, &id).await,
                        Screen::Challenges => api.delete_challenge(&token, &id).await,
                        Screen::Rewards => api.delete_reward(&token, &id).await,
                        Screen::Levels => api.delete_level(&token, &id).await,
                        Screen::Boosts => api.delete_boost(&token, &id).await,
                        _ => Ok(()),
                    }
                }
            });

            let results = future::join_all(deletes).await;
            let failed = results.iter().filter(|r| r.is_err()).count();
            for err in results.into_iter().filter_map(|r| r.err()) {
                warn!(error = %err, "Delete failed");
            }

            let message = if failed == 0 {
                format!("Deleted {} row(s)", count)
            } else {
                format!("Deleted {} of {} row(s)", count - failed, count)
            };
            Self::send_result(&tx, RefreshResult::MutationDone(pending.screen, message)).await;
        });
    }

    /// Open the status-alteration confirmation for the row under the cursor
    pub fn request_action(&mut self) {
        let action = match self.screen {
            Screen::Users => self.users.cursor_row().map(|u| PendingAction::User {
                id: u.telegram_user_id.clone(),
                action: if u.status_label() == "active" {
                    UserAction::Suspend
                } else {
                    UserAction::Resume
                },
            }),
            Screen::Clans => self.clans.cursor_row().and_then(|c| {
                ClanAction::for_status(&c.status).map(|action| PendingAction::Clan {
                    id: c.id.clone(),
                    action,
                })
            }),
            _ => None,
        };

        match action {
            Some(pending) => {
                self.pending_action = Some(pending);
                self.state = AppState::ConfirmingAction;
            }
            None => {
                self.status_message = Some("No action available for this row".to_string());
            }
        }
    }

    /// Open the ban confirmation for the user under the cursor
    pub fn request_ban(&mut self) {
        if self.screen != Screen::Users {
            return;
        }
        if let Some(user) = self.users.cursor_row() {
            self.pending_action = Some(PendingAction::User {
                id: user.telegram_user_id.clone(),
                action: UserAction::Ban,
            });
            self.state = AppState::ConfirmingAction;
        }
    }

    pub fn confirm_action(&mut self) {
        let Some(pending) = self.pending_action.take() else {
            self.state = AppState::Normal;
            return;
        };
        self.state = AppState::Normal;

        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let guard = self.guard.clone();
        let screen = self.screen;

        tokio::spawn(async move {
            let token = match guard.bearer().await {
                Ok(token) => token,
                Err(e) => {
                    Self::send_auth_failure(&tx, e).await;
                    return;
                }
            };

            let result = match &pending {
                PendingAction::User { id, action } => {
                    api.alter_user_status(&token, id, *action).await
                }
                PendingAction::Clan { id, action } => {
                    api.alter_clan_status(&token, id, *action).await
                }
            };

            match result {
                Ok(()) => {
                    Self::send_result(
                        &tx,
                        RefreshResult::MutationDone(screen, "Status updated".to_string()),
                    )
                    .await;
                }
                Err(e) if e.requires_signin() => Self::send_auth_failure(&tx, e).await,
                Err(e) => {
                    Self::send_result(&tx, RefreshResult::Error(format!("Status update: {}", e)))
                        .await;
                }
            }
        });
    }

    /// Open the create form for the current screen, if it has one
    pub fn open_create_form(&mut self) {
        let form = match self.screen {
            Screen::Tasks => Some(Form::task_create()),
            Screen::Challenges => Some(Form::challenge_create()),
            Screen::Rewards => Some(Form::reward_create()),
            Screen::Levels => Some(Form::level_create()),
            Screen::Boosts => Some(Form::boost_create()),
            _ => None,
        };
        if let Some(form) = form {
            self.form = Some(form);
            self.state = AppState::EditingForm;
        }
    }

    /// Open the edit form for the row under the cursor. Tasks and boosts
    /// re-fetch the full record first - the list payload may be trimmed -
    /// and the form opens when the detail arrives.
    pub fn open_edit_form(&mut self) {
        match self.screen {
            Screen::Tasks => {
                if let Some(id) = self.tasks.cursor_row().map(|t| t.id.clone()) {
                    self.fetch_for_edit(EditFetch::Task(id));
                }
            }
            Screen::Boosts => {
                if let Some(id) = self.boosts.cursor_row().map(|b| b.id.clone()) {
                    self.fetch_for_edit(EditFetch::Boost(id));
                }
            }
            Screen::Challenges => {
                if let Some(form) = self.challenges.cursor_row().map(Form::challenge_edit) {
                    self.form = Some(form);
                    self.state = AppState::EditingForm;
                }
            }
            Screen::Rewards => {
                if let Some(form) = self.rewards.cursor_row().map(Form::reward_edit) {
                    self.form = Some(form);
                    self.state = AppState::EditingForm;
                }
            }
            Screen::Levels => {
                if let Some(form) = self.levels.cursor_row().map(Form::level_edit) {
                    self.form = Some(form);
                    self.state = AppState::EditingForm;
                }
            }
            _ => {}
        }
    }

    fn fetch_for_edit(&mut self, fetch: EditFetch) {
        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let guard = self.guard.clone();
        self.status_message = Some("Loading record...".to_string());

        tokio::spawn(async move {
            let token = match guard.bearer().await {
                Ok(token) => token,
                Err(e) => {
                    Self::send_auth_failure(&tx, e).await;
                    return;
                }
            };

            match fetch {
                EditFetch::Task(id) => {
                    Self::send_fetch(&tx, "Task", api.fetch_task(&token, &id).await, |t| {
                        RefreshResult::TaskDetail(Box::new(t))
                    })
                    .await;
                }
                EditFetch::Boost(id) => {
                    Self::send_fetch(&tx, "Boost", api.fetch_boost(&token, &id).await, |b| {
                        RefreshResult::BoostDetail(Box::new(b))
                    })
                    .await;
                }
            }
        });
    }

    /// Open the single-field upgrade-cost form (Boosts screen)
    pub fn open_cost_form(&mut self) {
        if self.screen != Screen::Boosts {
            return;
        }
        if let Some(form) = self.boosts.cursor_row().map(Form::boost_cost) {
            self.form = Some(form);
            self.state = AppState::EditingForm;
        }
    }

    /// Validate and submit the open form. On success the screen refetches;
    /// on validation failure the form stays open with an error line.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };

        enum Submit {
            Task(TaskDraft, bool),
            Challenge(ChallengeDraft, bool),
            Reward(RewardDraft, bool),
            Level(LevelDraft, bool),
            Boost(BoostDraft, bool),
            BoostCost(String, String),
        }

        let is_edit = form.id.is_some();
        let built: Result<(Submit, Screen), String> = match form.kind {
            FormKind::Task => {
                let draft = form.task_draft();
                draft
                    .validate()
                    .map(|()| (Submit::Task(draft, is_edit), Screen::Tasks))
            }
            FormKind::Challenge => {
                let draft = form.challenge_draft();
                draft
                    .validate()
                    .map(|()| (Submit::Challenge(draft, is_edit), Screen::Challenges))
            }
            FormKind::Reward => {
                let draft = form.reward_draft();
                draft
                    .validate()
                    .map(|()| (Submit::Reward(draft, is_edit), Screen::Rewards))
            }
            FormKind::Level => {
                let draft = form.level_draft();
                draft
                    .validate()
                    .map(|()| (Submit::Level(draft, is_edit), Screen::Levels))
            }
            FormKind::Boost => {
                let draft = form.boost_draft();
                draft
                    .validate()
                    .map(|()| (Submit::Boost(draft, is_edit), Screen::Boosts))
            }
            FormKind::BoostCost => {
                let cost = form.value(0);
                if cost.trim().parse::<i64>().is_err() {
                    Err("Upgrade cost must be a number".to_string())
                } else {
                    let id = form.id.clone().unwrap_or_default();
                    Ok((Submit::BoostCost(id, cost), Screen::Boosts))
                }
            }
        };

        let (submit, screen) = match built {
            Ok(pair) => pair,
            Err(msg) => {
                if let Some(open) = self.form.as_mut() {
                    open.error = Some(msg);
                }
                return;
            }
        };

        self.form = None;
        self.state = AppState::Normal;
        self.status_message = Some("Saving...".to_string());

        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let guard = self.guard.clone();

        tokio::spawn(async move {
            let token = match guard.bearer().await {
                Ok(token) => token,
                Err(e) => {
                    Self::send_auth_failure(&tx, e).await;
                    return;
                }
            };

            let result = match &submit {
                Submit::Task(draft, true) => api.update_task(&token, draft).await,
                Submit::Task(draft, false) => api.create_task(&token, draft).await,
                Submit::Challenge(draft, true) => api.update_challenge(&token, draft).await,
                Submit::Challenge(draft, false) => api.create_challenge(&token, draft).await,
                Submit::Reward(draft, true) => api.update_reward(&token, draft).await,
                Submit::Reward(draft, false) => api.create_reward(&token, draft).await,
                Submit::Level(draft, true) => api.update_level(&token, draft).await,
                Submit::Level(draft, false) => api.create_level(&token, draft).await,
                Submit::Boost(draft, true) => api.update_boost(&token, draft).await,
                Submit::Boost(draft, false) => api.create_boost(&token, draft).await,
                Submit::BoostCost(id, cost) => api.edit_upgrade_cost(&token, id, cost).await,
            };

            match result {
                Ok(()) => {
                    Self::send_result(
                        &tx,
                        RefreshResult::MutationDone(screen, "Saved".to_string()),
                    )
                    .await;
                }
                Err(e) if e.requires_signin() => Self::send_auth_failure(&tx, e).await,
                Err(e) => {
                    Self::send_result(&tx, RefreshResult::Error(format!("Save failed: {}", e)))
                        .await;
                }
            }
        });
    }

    // =========================================================================
    // Detail overlays
    // =========================================================================

    /// Fetch and show the detail record for the row under the cursor
    pub fn open_detail(&mut self) {
        enum Target {
            User(String),
            Clan(String),
        }

        let target = match self.screen {
            Screen::Users => self
                .users
                .cursor_row()
                .map(|u| Target::User(u.telegram_user_id.clone())),
            Screen::Leaderboard => self
                .leaderboard
                .cursor_row()
                .and_then(|e| e.telegram_user_id.clone())
                .map(Target::User),
            Screen::Clans => self.clans.cursor_row().map(|c| Target::Clan(c.id.clone())),
            _ => None,
        };
        let Some(target) = target else {
            return;
        };

        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let guard = self.guard.clone();
        let from_leaderboard = self.screen == Screen::Leaderboard;
        self.status_message = Some("Loading profile...".to_string());

        tokio::spawn(async move {
            let token = match guard.bearer().await {
                Ok(token) => token,
                Err(e) => {
                    Self::send_auth_failure(&tx, e).await;
                    return;
                }
            };

            match target {
                Target::User(id) => {
                    let result = if from_leaderboard {
                        api.fetch_leaderboard_profile(&token, &id).await
                    } else {
                        api.fetch_user(&token, &id).await
                    };
                    Self::send_fetch(&tx, "Profile", result, |u| {
                        RefreshResult::UserDetail(Box::new(u))
                    })
                    .await;
                }
                Target::Clan(id) => {
                    let (clan, earners) = tokio::join!(
                        api.fetch_clan(&token, &id),
                        api.fetch_clan_top_earners(&token, &id),
                    );
                    match clan {
                        Ok(clan) => {
                            let top_earners = earners.unwrap_or_else(|e| {
                                warn!(error = %e, "Top earners fetch failed");
                                Vec::new()
                            });
                            Self::send_result(
                                &tx,
                                RefreshResult::ClanDetail(Box::new(clan), top_earners),
                            )
                            .await;
                        }
                        Err(e) if e.requires_signin() => Self::send_auth_failure(&tx, e).await,
                        Err(e) => {
                            Self::send_result(
                                &tx,
                                RefreshResult::Error(format!("Clan detail: {}", e)),
                            )
                            .await;
                        }
                    }
                }
            }
        });
    }

    // =========================================================================
    // Global search
    // =========================================================================

    /// Run the cross-entity search for the current query
    pub fn run_search(&mut self) {
        let query = self.search_query.trim().to_string();
        if query.is_empty() {
            self.search_hits.clear();
            return;
        }

        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let guard = self.guard.clone();

        tokio::spawn(async move {
            let token = match guard.bearer().await {
                Ok(token) => token,
                Err(e) => {
                    Self::send_auth_failure(&tx, e).await;
                    return;
                }
            };
            Self::send_fetch(
                &tx,
                "Search",
                api.search(&token, &query).await,
                RefreshResult::SearchResults,
            )
            .await;
        });
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Export the current screen's filtered rows (all pages) to an xlsx
    /// file next to the user's downloads, returning the path written.
    pub fn export_current(&self) -> Result<PathBuf> {
        let dir = dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let path = dir.join(format!("{}.xlsx", self.screen.slug()));

        match self.screen {
            Screen::Users => export::write_workbook(
                &path,
                "Users",
                &export::user_columns(),
                &self.users.filtered(),
            )?,
            Screen::Clans => export::write_workbook(
                &path,
                "Clans",
                &export::clan_columns(),
                &self.clans.filtered(),
            )?,
            Screen::Tasks => export::write_workbook(
                &path,
                "Tasks",
                &export::task_columns(),
                &self.tasks.filtered(),
            )?,
            Screen::Challenges => export::write_workbook(
                &path,
                "Challenges",
                &export::challenge_columns(),
                &self.challenges.filtered(),
            )?,
            Screen::Rewards => export::write_workbook(
                &path,
                "Rewards",
                &export::reward_columns(),
                &self.rewards.filtered(),
            )?,
            Screen::Levels => export::write_workbook(
                &path,
                "Levels",
                &export::level_columns(),
                &self.levels.filtered(),
            )?,
            Screen::Boosts => export::write_workbook(
                &path,
                "Boosts",
                &export::boost_columns(),
                &self.boosts.filtered(),
            )?,
            Screen::Leaderboard => export::write_workbook(
                &path,
                "Leaderboard",
                &export::leaderboard_columns(),
                &self.leaderboard.filtered(),
            )?,
            Screen::Dashboard => {
                anyhow::bail!("Nothing to export on the dashboard")
            }
        }

        info!(path = %path.display(), "Exported");
        Ok(path)
    }

    // =========================================================================
    // Background task processing
    // =========================================================================

    /// Drain pending background results and live-feed messages
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_refresh_result(result);
        }

        let mut live_messages = Vec::new();
        if let Some(ref mut rx) = self.live_rx {
            while let Ok(message) = rx.try_recv() {
                live_messages.push(message);
            }
        }
        for message in live_messages {
            self.process_live_message(message);
        }
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Users(data) => {
                self.users.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::Clans(data) => {
                self.clans.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::Tasks(data) => {
                self.tasks.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::Challenges(data) => {
                self.challenges.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::Rewards(data) => {
                self.rewards.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::Levels(data) => {
                self.levels.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::Boosts(data) => {
                self.boosts.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::Leaderboard(data) => {
                self.leaderboard.set_rows(data);
                self.clear_progress_message();
            }
            RefreshResult::UserDetail(user) => {
                self.detail = Some(DetailView::User(user));
                self.state = AppState::ShowingDetail;
                self.clear_progress_message();
            }
            RefreshResult::ClanDetail(clan, top_earners) => {
                self.detail = Some(DetailView::Clan { clan, top_earners });
                self.state = AppState::ShowingDetail;
                self.clear_progress_message();
            }
            RefreshResult::TaskDetail(task) => {
                self.form = Some(Form::task_edit(&task));
                self.state = AppState::EditingForm;
                self.clear_progress_message();
            }
            RefreshResult::BoostDetail(boost) => {
                self.form = Some(Form::boost_edit(&boost));
                self.state = AppState::EditingForm;
                self.clear_progress_message();
            }
            RefreshResult::UserTotals(data) => self.dashboard.user_totals = data,
            RefreshResult::NewUserTotals(data) => self.dashboard.new_user_totals = data,
            RefreshResult::CoinTotals(data) => self.dashboard.coin_totals = data,
            RefreshResult::NewUsersList(data) => self.dashboard.new_users = data,
            RefreshResult::DashboardLeaderboard(data) => self.dashboard.leaderboard = data,
            RefreshResult::CoinActivity(data) => self.dashboard.recent_coin_activity = data,
            RefreshResult::UserActivity(data) => self.dashboard.recent_user_activity = data,
            RefreshResult::LevelChart(data) => {
                self.dashboard.user_levels = data;
                self.clear_progress_message();
            }
            RefreshResult::SearchResults(hits) => {
                self.search_cursor = 0;
                self.search_hits = hits;
            }
            RefreshResult::MutationDone(screen, message) => {
                self.refresh_screen(screen);
                self.status_message = Some(message);
            }
            RefreshResult::SessionExpired => {
                self.status_message = Some("Session expired. Please sign in again.".to_string());
                self.start_sign_in();
            }
            RefreshResult::Error(message) => {
                error!(error = %message, "Background task error");
                self.status_message = Some(format!("Error: {}", message));
            }
        }
    }

    fn process_live_message(&mut self, message: LiveMessage) {
        match &message {
            LiveMessage::Dashboard { .. } => {
                message.apply(&mut self.dashboard);
            }
            LiveMessage::Refresh { entity } => {
                // Refetch only when the hint names the screen being viewed
                let matches = entity.eq_ignore_ascii_case(self.screen.slug());
                debug!(entity = %entity, matches, "Live refresh hint");
                if matches {
                    self.refresh_screen(self.screen);
                }
            }
        }
    }

    /// Clear transient progress messages, preserving errors
    fn clear_progress_message(&mut self) {
        if let Some(ref msg) = self.status_message {
            if !msg.starts_with("Error:") {
                self.status_message = None;
            }
        }
    }

    // =========================================================================
    // Table operations (dispatched to the current screen)
    // =========================================================================

    pub fn table_cursor_up(&mut self) {
        with_table!(self, t => t.cursor_up());
    }

    pub fn table_cursor_down(&mut self) {
        with_table!(self, t => t.cursor_down());
    }

    pub fn table_next_page(&mut self) {
        with_table!(self, t => t.next_page());
    }

    pub fn table_prev_page(&mut self) {
        with_table!(self, t => t.prev_page());
    }

    pub fn table_set_page_size(&mut self, size: usize) {
        with_table!(self, t => t.set_page_size(size));
    }

    pub fn table_toggle_select(&mut self) {
        with_table!(self, t => t.toggle_select());
    }

    pub fn table_toggle_sort(&mut self, index: usize) {
        with_table!(self, t => t.toggle_sort(index));
    }

    pub fn table_clear_filters(&mut self) {
        with_table!(self, t => t.clear_filters());
    }

    pub fn search_push(&mut self, c: char) {
        with_table!(self, t => {
            if can_add_search_char(t.query.len(), c) {
                let mut query = t.query.clone();
                query.push(c);
                t.set_query(query);
            }
        });
    }

    pub fn search_pop(&mut self) {
        with_table!(self, t => {
            let mut query = t.query.clone();
            query.pop();
            t.set_query(query);
        });
    }

    pub fn current_query(&self) -> String {
        with_table_ref!(self, t => t.query.clone(), String::new())
    }

    pub fn current_counts(&self) -> (usize, usize) {
        with_table_ref!(self, t => (t.filtered_len(), t.total_rows()), (0, 0))
    }

    pub fn current_page_info(&self) -> (usize, usize, usize) {
        with_table_ref!(self, t => (t.page() + 1, t.page_count(), t.page_size()), (1, 1, 0))
    }

    pub fn current_selected_count(&self) -> usize {
        with_table_ref!(self, t => t.selected_count(), 0)
    }

    // =========================================================================
    // Filter dropdown
    // =========================================================================

    /// Number of options per filter group on the current screen
    fn filter_shape(&self) -> Vec<usize> {
        with_table_ref!(
            self,
            t => t.groups.iter().map(|g| g.options.len()).collect(),
            Vec::new()
        )
    }

    pub fn open_filter_menu(&mut self) {
        if self.filter_shape().is_empty() {
            self.status_message = Some("No filters on this screen".to_string());
            return;
        }
        self.filter_cursor = FilterCursor::default();
        self.state = AppState::FilterMenu;
    }

    pub fn filter_cursor_down(&mut self) {
        let shape = self.filter_shape();
        let FilterCursor { group, option } = self.filter_cursor;
        if option + 1 < shape.get(group).copied().unwrap_or(0) {
            self.filter_cursor.option += 1;
        } else if group + 1 < shape.len() {
            self.filter_cursor = FilterCursor {
                group: group + 1,
                option: 0,
            };
        }
    }

    pub fn filter_cursor_up(&mut self) {
        let shape = self.filter_shape();
        let FilterCursor { group, option } = self.filter_cursor;
        if option > 0 {
            self.filter_cursor.option -= 1;
        } else if group > 0 {
            let prev = group - 1;
            self.filter_cursor = FilterCursor {
                group: prev,
                option: shape.get(prev).copied().unwrap_or(1).saturating_sub(1),
            };
        }
    }

    pub fn toggle_filter_at_cursor(&mut self) {
        let FilterCursor { group, option } = self.filter_cursor;
        with_table!(self, t => t.toggle_filter(group, option));
    }

    /// Flattened dropdown rows for rendering
    pub fn filter_menu_rows(&self) -> Vec<FilterMenuRow> {
        let cursor = self.filter_cursor;
        with_table_ref!(
            self,
            t => {
                let mut rows = Vec::new();
                for (gi, group) in t.groups.iter().enumerate() {
                    rows.push(FilterMenuRow::Group(group.title));
                    for (oi, option) in group.options.iter().enumerate() {
                        rows.push(FilterMenuRow::Option {
                            label: option.label,
                            active: option.active,
                            selected: cursor.group == gi && cursor.option == oi,
                        });
                    }
                }
                rows
            },
            Vec::new()
        )
    }

    // =========================================================================
    // Scope tabs
    // =========================================================================

    /// Cycle the current screen's scope tab (client-side screens) or its
    /// server-side category (challenges, leaderboard)
    pub fn cycle_scope(&mut self) {
        match self.screen {
            Screen::Tasks => {
                self.task_scope = (self.task_scope + 1) % TASK_SCOPES.len();
                self.tasks.set_scope(TASK_SCOPES[self.task_scope].1);
            }
            Screen::Clans => {
                self.clan_scope = (self.clan_scope + 1) % CLAN_SCOPES.len();
                self.clans.set_scope(CLAN_SCOPES[self.clan_scope].1);
            }
            Screen::Rewards => {
                self.reward_scope = (self.reward_scope + 1) % REWARD_SCOPES.len();
                self.rewards.set_scope(REWARD_SCOPES[self.reward_scope].1);
            }
            Screen::Challenges => {
                let next = match self.challenge_status {
                    ChallengeStatus::Ongoing => ChallengeStatus::Completed,
                    ChallengeStatus::Completed => ChallengeStatus::Ongoing,
                };
                self.set_challenge_status(next);
            }
            Screen::Leaderboard => {
                let idx = LeaderboardPeriod::ALL
                    .iter()
                    .position(|p| *p == self.leaderboard_period)
                    .unwrap_or(0);
                let next = LeaderboardPeriod::ALL[(idx + 1) % LeaderboardPeriod::ALL.len()];
                self.set_leaderboard_period(next);
            }
            _ => {}
        }
    }

    /// Scope tab labels and the active index for the current screen
    pub fn scope_tabs(&self) -> Option<(Vec<&'static str>, usize)> {
        match self.screen {
            Screen::Tasks => Some((
                TASK_SCOPES.iter().map(|(label, _)| *label).collect(),
                self.task_scope,
            )),
            Screen::Clans => Some((
                CLAN_SCOPES.iter().map(|(label, _)| *label).collect(),
                self.clan_scope,
            )),
            Screen::Rewards => Some((
                REWARD_SCOPES.iter().map(|(label, _)| *label).collect(),
                self.reward_scope,
            )),
            Screen::Challenges => Some((
                vec![
                    ChallengeStatus::Ongoing.title(),
                    ChallengeStatus::Completed.title(),
                ],
                match self.challenge_status {
                    ChallengeStatus::Ongoing => 0,
                    ChallengeStatus::Completed => 1,
                },
            )),
            Screen::Leaderboard => Some((
                LeaderboardPeriod::ALL.iter().map(|p| p.title()).collect(),
                LeaderboardPeriod::ALL
                    .iter()
                    .position(|p| *p == self.leaderboard_period)
                    .unwrap_or(0),
            )),
            _ => None,
        }
    }

    // =========================================================================
    // Server-side tabs
    // =========================================================================

    pub fn set_challenge_status(&mut self, status: ChallengeStatus) {
        if self.challenge_status != status {
            self.challenge_status = status;
            self.refresh_screen(Screen::Challenges);
        }
    }

    pub fn set_leaderboard_period(&mut self, period: LeaderboardPeriod) {
        if self.leaderboard_period != period {
            self.leaderboard_period = period;
            self.refresh_screen(Screen::Leaderboard);
        }
    }
}

// ============================================================================
// Table constructors
// ============================================================================

fn users_table() -> TableView<User> {
    TableView::new(
        |u: &User| u.telegram_user_id.clone(),
        |u: &User| u.search_fields(),
    )
    .with_groups(vec![FilterGroup::new(
        "Status",
        vec![
            FilterOption::new("Active", |u: &User| u.status_label() == "active"),
            FilterOption::new("Suspended", |u: &User| u.status_label() == "suspended"),
            FilterOption::new("Banned", |u: &User| u.status_label() == "banned"),
        ],
    )])
    .with_sort_columns(vec![
        SortColumn::new("Username", |a: &User, b: &User| {
            a.username.to_lowercase().cmp(&b.username.to_lowercase())
        }),
        SortColumn::new("Coins", |a: &User, b: &User| {
            a.coins_earned.cmp(&b.coins_earned)
        }),
        SortColumn::new("Level", |a: &User, b: &User| a.level.cmp(&b.level)),
    ])
}

fn clans_table() -> TableView<Clan> {
    TableView::new(|c: &Clan| c.id.clone(), |c: &Clan| c.search_fields())
        .with_groups(vec![FilterGroup::new(
            "Status",
            vec![
                FilterOption::new("Active", |c: &Clan| c.status.eq_ignore_ascii_case("active")),
                FilterOption::new("Pending", |c: &Clan| c.status.eq_ignore_ascii_case("pending")),
                FilterOption::new("Disband", |c: &Clan| {
                    c.status.eq_ignore_ascii_case("disband")
                }),
            ],
        )])
        .with_sort_columns(vec![
            SortColumn::new("Name", |a: &Clan, b: &Clan| {
                a.name.to_lowercase().cmp(&b.name.to_lowercase())
            }),
            SortColumn::new("Coins", |a: &Clan, b: &Clan| {
                a.coins_earned.cmp(&b.coins_earned)
            }),
        ])
}

fn tasks_table() -> TableView<Task> {
    TableView::new(|t: &Task| t.id.clone(), |t: &Task| t.search_fields())
        .with_groups(vec![
            FilterGroup::new(
                "Task Status",
                vec![
                    FilterOption::new("Active", |t: &Task| t.task_status == "active"),
                    FilterOption::new("Inactive", |t: &Task| t.task_status == "inactive"),
                    FilterOption::new("Paused", |t: &Task| t.task_status == "paused"),
                ],
            ),
            FilterGroup::new(
                "Task Type",
                vec![
                    FilterOption::new("In-Game", |t: &Task| t.task_type == "in-game"),
                    FilterOption::new("Special", |t: &Task| t.task_type == "special"),
                    FilterOption::new("Social", |t: &Task| t.task_type == "social"),
                ],
            ),
        ])
        .with_sort_columns(vec![SortColumn::new("Name", |a: &Task, b: &Task| {
            a.task_name.to_lowercase().cmp(&b.task_name.to_lowercase())
        })])
}

fn challenges_table() -> TableView<Challenge> {
    TableView::new(
        |c: &Challenge| c.id.clone(),
        |c: &Challenge| c.search_fields(),
    )
    .with_sort_columns(vec![
        SortColumn::new("Name", |a: &Challenge, b: &Challenge| {
            a.name.to_lowercase().cmp(&b.name.to_lowercase())
        }),
        SortColumn::new("Reward", |a: &Challenge, b: &Challenge| {
            a.reward.cmp(&b.reward)
        }),
    ])
}

fn rewards_table() -> TableView<Reward> {
    TableView::new(|r: &Reward| r.id.clone(), |r: &Reward| r.search_fields())
        .with_groups(vec![FilterGroup::new(
            "Status",
            vec![
                FilterOption::new("On-going", |r: &Reward| {
                    r.status.eq_ignore_ascii_case("on_going")
                        || r.status.eq_ignore_ascii_case("ongoing")
                }),
                FilterOption::new("Claimed", |r: &Reward| {
                    r.status.eq_ignore_ascii_case("claimed")
                }),
            ],
        )])
        .with_sort_columns(vec![SortColumn::new("Title", |a: &Reward, b: &Reward| {
            a.title.to_lowercase().cmp(&b.title.to_lowercase())
        })])
}

fn levels_table() -> TableView<Level> {
    TableView::new(|l: &Level| l.id.clone(), |l: &Level| l.search_fields()).with_sort_columns(
        vec![SortColumn::new("Level", |a: &Level, b: &Level| {
            a.level.cmp(&b.level)
        })],
    )
}

fn boosts_table() -> TableView<Boost> {
    TableView::new(|b: &Boost| b.id.clone(), |b: &Boost| b.search_fields()).with_sort_columns(
        vec![SortColumn::new("Name", |a: &Boost, b: &Boost| {
            a.name.to_lowercase().cmp(&b.name.to_lowercase())
        })],
    )
}

fn leaderboard_table() -> TableView<LeaderboardEntry> {
    TableView::new(
        |e: &LeaderboardEntry| {
            e.telegram_user_id
                .clone()
                .unwrap_or_else(|| e.username.clone())
        },
        |e: &LeaderboardEntry| e.search_fields(),
    )
    .with_sort_columns(vec![
        SortColumn::new("Rank", |a: &LeaderboardEntry, b: &LeaderboardEntry| {
            a.rank.cmp(&b.rank)
        }),
        SortColumn::new("Coins", |a: &LeaderboardEntry, b: &LeaderboardEntry| {
            a.coins_earned.cmp(&b.coins_earned)
        }),
    ])
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_search_char(current_len: usize, c: char) -> bool {
    current_len < MAX_SEARCH_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_next_prev_wrap() {
        assert_eq!(Screen::Dashboard.next(), Screen::Users);
        assert_eq!(Screen::Leaderboard.next(), Screen::Dashboard);
        assert_eq!(Screen::Dashboard.prev(), Screen::Leaderboard);
        assert_eq!(Screen::Users.prev(), Screen::Dashboard);

        // next/prev are inverses across the whole ring
        for screen in Screen::ALL {
            assert_eq!(screen.next().prev(), screen);
        }
    }

    #[test]
    fn test_screen_slugs_unique() {
        let mut slugs: Vec<&str> = Screen::ALL.iter().map(|s| s.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), Screen::ALL.len());
    }

    #[test]
    fn test_form_focus_wraps() {
        let mut form = Form::level_create();
        assert_eq!(form.focus, 0);
        form.focus_prev();
        assert_eq!(form.focus, form.fields.len() - 1);
        form.focus_next();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn test_task_form_roundtrip() {
        let task: Task = serde_json::from_str(
            r#"{"id": "t_9", "task_name": "Join the channel", "task_type": "social",
                "task_status": "paused", "task_reward": "750", "task_participants": "88"}"#,
        )
        .unwrap();

        let form = Form::task_edit(&task);
        assert_eq!(form.id.as_deref(), Some("t_9"));
        let draft = form.task_draft();
        assert_eq!(draft.name, "Join the channel");
        assert_eq!(draft.status, "paused");
        assert_eq!(draft.participants, "88");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_challenge_form_numeric_fields() {
        let mut form = Form::challenge_create();
        form.fields[4].value = "3".to_string();
        form.fields[5].value = "junk".to_string();
        let draft = form.challenge_draft();
        assert_eq!(draft.duration_days, 3);
        assert_eq!(draft.duration_hours, 0); // unparseable falls back to 0
    }

    #[test]
    fn test_pending_action_description() {
        let action = PendingAction::User {
            id: "1".to_string(),
            action: UserAction::Suspend,
        };
        assert_eq!(action.describe(), "suspend this user?");

        let action = PendingAction::Clan {
            id: "c1".to_string(),
            action: ClanAction::Approve,
        };
        assert_eq!(action.describe(), "approve this clan?");
    }

    #[test]
    fn test_cycle_scope_on_tasks_screen() {
        let mut app = App::new(Config::default()).unwrap();
        app.screen = Screen::Tasks;

        let (labels, active) = app.scope_tabs().unwrap();
        assert_eq!(labels[0], "All Tasks");
        assert_eq!(active, 0);

        app.cycle_scope();
        assert_eq!(app.task_scope, 1);
        // Wraps back to "All Tasks"
        app.cycle_scope();
        app.cycle_scope();
        app.cycle_scope();
        assert_eq!(app.task_scope, 0);
    }

    #[test]
    fn test_filter_cursor_walks_groups() {
        let mut app = App::new(Config::default()).unwrap();
        app.screen = Screen::Tasks; // two groups of three options

        app.open_filter_menu();
        assert_eq!(app.state, AppState::FilterMenu);

        for _ in 0..3 {
            app.filter_cursor_down();
        }
        assert_eq!(app.filter_cursor.group, 1);
        assert_eq!(app.filter_cursor.option, 0);

        app.filter_cursor_up();
        assert_eq!(app.filter_cursor.group, 0);
        assert_eq!(app.filter_cursor.option, 2);

        app.toggle_filter_at_cursor();
        let rows = app.filter_menu_rows();
        let active: Vec<&str> = rows
            .iter()
            .filter_map(|r| match r {
                FilterMenuRow::Option { label, active: true, .. } => Some(*label),
                _ => None,
            })
            .collect();
        assert_eq!(active, vec!["Paused"]);
    }

    #[test]
    fn test_request_delete_without_selection_is_noop() {
        let mut app = App::new(Config::default()).unwrap();
        app.screen = Screen::Tasks;
        app.request_delete();
        assert!(app.pending_delete.is_none());
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_input_validators() {
        assert!(can_add_username_char(0, 'a'));
        assert!(!can_add_username_char(MAX_USERNAME_LENGTH, 'a'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(can_add_password_char(MAX_PASSWORD_LENGTH - 1, '!'));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, '!'));
        assert!(can_add_search_char(0, ' '));
        assert!(!can_add_search_char(MAX_SEARCH_LENGTH, 'x'));
    }
}
