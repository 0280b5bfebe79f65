//! tapdeck - a terminal admin console for a tap-to-earn rewards platform.
//!
//! Every screen is a data table bound to the platform's REST backend:
//! fetch a collection, filter/sort/paginate it locally, mutate rows through
//! overlay forms, re-fetch. A WebSocket feed keeps the dashboard live.

mod api;
mod app;
mod auth;
mod config;
mod export;
mod live;
mod models;
mod table;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::ApiClient;
use app::{App, AppState};
use auth::{CredentialStore, Session, SessionGuard};
use config::Config;
use ui::input::handle_input;
use ui::render::render;

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize tracing to a log file - the terminal belongs to the TUI.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config.data_dir().ok()?;
    let appender = tracing_appender::rolling::never(log_dir, "tapdeck.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().unwrap_or_default();
    let _log_guard = init_tracing(&config);

    // Headless export mode: `tapdeck --export tasks [tasks.xlsx]`
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 && args[1] == "--export" {
        return run_export(config, &args[2], args.get(3).map(PathBuf::from)).await;
    }

    info!("tapdeck starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config)?;

    if app.is_authenticated().await {
        app.start_live_feed();
        app.refresh_screen(app.screen);
    } else {
        app.start_sign_in();
    }

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("tapdeck shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background results keep draining
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Fetch one collection and write it to an xlsx file without entering the
/// TUI. Signs in from the saved session, the keychain, or a prompt.
async fn run_export(config: Config, screen: &str, out: Option<PathBuf>) -> Result<()> {
    let api = ApiClient::new(&config.api_base_url)?;

    let data_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut session = Session::new(data_dir);
    let _ = session.load();
    let guard = SessionGuard::new(api.clone(), session);

    let token = match guard.bearer().await {
        Ok(token) => token,
        Err(_) => {
            let (username, password) = prompt_credentials(&config)?;
            let pair = api.sign_in(&username, &password).await?;
            guard.adopt(pair, &username).await;
            guard
                .bearer()
                .await
                .map_err(|e| anyhow::anyhow!("Sign-in did not yield a token: {}", e))?
        }
    };

    let path = out.unwrap_or_else(|| PathBuf::from(format!("{}.xlsx", screen)));

    match screen {
        "users" => {
            let rows = api.fetch_users(&token).await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Users", &export::user_columns(), &refs)?;
        }
        "clans" => {
            let rows = api.fetch_clans(&token, "all_clans").await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Clans", &export::clan_columns(), &refs)?;
        }
        "tasks" => {
            let rows = api.fetch_tasks(&token).await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Tasks", &export::task_columns(), &refs)?;
        }
        "challenges" => {
            let rows = api
                .fetch_challenges(&token, models::ChallengeStatus::Ongoing)
                .await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Challenges", &export::challenge_columns(), &refs)?;
        }
        "rewards" => {
            let rows = api.fetch_rewards(&token).await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Rewards", &export::reward_columns(), &refs)?;
        }
        "levels" => {
            let rows = api.fetch_levels(&token).await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Levels", &export::level_columns(), &refs)?;
        }
        "boosts" => {
            let rows = api.fetch_boosts(&token).await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Boosts", &export::boost_columns(), &refs)?;
        }
        "leaderboard" => {
            let rows = api
                .fetch_leaderboard(&token, models::LeaderboardPeriod::AllTime)
                .await?;
            let refs: Vec<_> = rows.iter().collect();
            export::write_workbook(&path, "Leaderboard", &export::leaderboard_columns(), &refs)?;
        }
        other => {
            anyhow::bail!(
                "Unknown screen '{}'. One of: users, clans, tasks, challenges, rewards, levels, boosts, leaderboard",
                other
            );
        }
    }

    eprintln!("Exported {} to {}", screen, path.display());
    Ok(())
}

fn prompt_credentials(config: &Config) -> Result<(String, String)> {
    let username = if let Some(ref last_user) = config.last_username {
        print!("Username [{}]: ", last_user);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();
        if input.is_empty() {
            last_user.clone()
        } else {
            input.to_string()
        }
    } else {
        print!("Username: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        input.trim().to_string()
    };

    let password = if CredentialStore::has_credentials(&username) {
        CredentialStore::get_password(&username)?
    } else {
        rpassword::prompt_password("Password: ")?
    };

    Ok((username, password))
}
