//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Overlay states are
//! handled first; global keys apply in the normal state.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{
    can_add_password_char, can_add_search_char, can_add_username_char, App, AppState, Screen,
    SignInFocus,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::SigningIn => return handle_signin_input(app, key).await,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_delete();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_delete = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingAction => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_action();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_action = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ShowingDetail => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.detail = None;
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::Searching => return handle_search_input(app, key),
        AppState::FilterMenu => return handle_filter_input(app, key),
        AppState::EditingForm => return handle_form_input(app, key),
        AppState::GlobalSearch => return handle_global_search_input(app, key),
        AppState::Normal | AppState::Quitting => {}
    }

    // Cross-entity search opens from anywhere in the normal state
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.state = AppState::GlobalSearch;
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }

        // Screen switching
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            app.switch_screen(Screen::ALL[index]);
        }
        KeyCode::Tab => {
            let next = app.screen.next();
            app.switch_screen(next);
        }
        KeyCode::BackTab => {
            let prev = app.screen.prev();
            app.switch_screen(prev);
        }

        // Cursor and pages
        KeyCode::Up | KeyCode::Char('k') => app.table_cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.table_cursor_down(),
        KeyCode::Left | KeyCode::PageUp => app.table_prev_page(),
        KeyCode::Right | KeyCode::PageDown => app.table_next_page(),
        KeyCode::Char('+') => {
            let (_, _, size) = app.current_page_info();
            app.table_set_page_size(size + 1);
        }
        KeyCode::Char('-') => {
            let (_, _, size) = app.current_page_info();
            if size > 1 {
                app.table_set_page_size(size - 1);
            }
        }

        // Filtering and search
        KeyCode::Char('/') => {
            if app.screen != Screen::Dashboard {
                app.state = AppState::Searching;
            }
        }
        KeyCode::Char('f') => app.open_filter_menu(),
        KeyCode::Char('F') => app.table_clear_filters(),
        KeyCode::Char('g') => app.cycle_scope(),
        KeyCode::Char('s') => app.table_toggle_sort(0),
        KeyCode::Char('S') => app.table_toggle_sort(1),

        // Row operations
        KeyCode::Char(' ') => app.table_toggle_select(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('n') => app.open_create_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('c') => app.open_cost_form(),
        KeyCode::Char('a') => app.request_action(),
        KeyCode::Char('b') => app.request_ban(),
        KeyCode::Enter => app.open_detail(),

        // Data
        KeyCode::Char('u') => app.refresh_screen(app.screen),
        KeyCode::Char('x') => match app.export_current() {
            Ok(path) => {
                app.status_message = Some(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                app.status_message = Some(format!("Error: {}", e));
            }
        },
        KeyCode::Char('o') => app.sign_out().await,

        _ => {}
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(c) => app.search_push(c),
        _ => {}
    }
    Ok(false)
}

fn handle_filter_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('f') => {
            app.state = AppState::Normal;
        }
        KeyCode::Up | KeyCode::Char('k') => app.filter_cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.filter_cursor_down(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_filter_at_cursor(),
        KeyCode::Char('F') => app.table_clear_filters(),
        _ => {}
    }
    Ok(false)
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.form = None;
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = app.form.as_mut() {
                form.focus_next();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = app.form.as_mut() {
                form.focus_prev();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.form.as_mut() {
                let focus = form.focus;
                if let Some(field) = form.fields.get_mut(focus) {
                    field.value.pop();
                }
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.form.as_mut() {
                let focus = form.focus;
                if let Some(field) = form.fields.get_mut(focus) {
                    if can_add_search_char(field.value.len(), c) {
                        field.value.push(c);
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_global_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.run_search(),
        KeyCode::Up => {
            app.search_cursor = app.search_cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            if app.search_cursor + 1 < app.search_hits.len() {
                app.search_cursor += 1;
            }
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            if can_add_search_char(app.search_query.len(), c) {
                app.search_query.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_signin_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.signin_focus = match app.signin_focus {
                SignInFocus::Username => SignInFocus::Password,
                SignInFocus::Password => SignInFocus::Button,
                SignInFocus::Button => SignInFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.signin_focus = match app.signin_focus {
                SignInFocus::Username => SignInFocus::Button,
                SignInFocus::Password => SignInFocus::Username,
                SignInFocus::Button => SignInFocus::Password,
            };
        }
        KeyCode::Enter => match app.signin_focus {
            SignInFocus::Username => app.signin_focus = SignInFocus::Password,
            SignInFocus::Password | SignInFocus::Button => {
                // Error is surfaced on the overlay; stay signed out on failure
                let _ = app.attempt_sign_in().await;
            }
        },
        KeyCode::Backspace => match app.signin_focus {
            SignInFocus::Username => {
                app.signin_username.pop();
            }
            SignInFocus::Password => {
                app.signin_password.pop();
            }
            SignInFocus::Button => {}
        },
        KeyCode::Char(c) => match app.signin_focus {
            SignInFocus::Username => {
                if can_add_username_char(app.signin_username.len(), c) {
                    app.signin_username.push(c);
                }
            }
            SignInFocus::Password => {
                if can_add_password_char(app.signin_password.len(), c) {
                    app.signin_password.push(c);
                }
            }
            SignInFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
