use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode, Screen};
use crate::input::TextInput;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Any key dismisses the document alert popup
    if app.screen == Screen::Document && app.document_pane.alert.is_some() {
        app.document_pane.alert = None;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

/// Dropped files arrive as a paste; everywhere else a paste is typed text.
fn handle_paste(app: &mut App, text: &str) {
    if app.screen == Screen::Ingest {
        app.add_paths(text);
        return;
    }
    if app.input_mode == InputMode::Editing {
        if let Some(input) = active_input(app) {
            input.insert_str(text);
        }
    }
}

fn active_input(app: &mut App) -> Option<&mut TextInput> {
    match app.screen {
        Screen::Ingest => Some(&mut app.path_input),
        Screen::Chat => Some(&mut app.chat_input),
        Screen::Auth => Some(app.focused_auth_field()),
        Screen::Document => Some(&mut app.comment_input),
        Screen::Dashboard => None,
    }
}

fn switch_screen(app: &mut App, screen: Screen) {
    app.screen = screen;
    app.input_mode = InputMode::Normal;
    if screen == Screen::Dashboard && app.dashboard_pane.documents.is_empty() {
        app.refresh_documents();
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // A pending delete takes the next key: `y` confirms, anything else cancels
    if app.confirm_delete.is_some() {
        if key.code == KeyCode::Char('y') {
            app.confirm_delete();
        } else {
            app.cancel_delete();
        }
        return;
    }

    // Screen switching and quit
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            switch_screen(app, Screen::all()[index]);
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Ingest => handle_ingest_normal(app, key),
        Screen::Chat => handle_chat_normal(app, key),
        Screen::Auth => handle_auth_normal(app, key),
        Screen::Dashboard => handle_dashboard_normal(app, key),
        Screen::Document => handle_document_normal(app, key),
    }
}

fn handle_ingest_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Char('a') => app.input_mode = InputMode::Editing,
        KeyCode::Char('s') | KeyCode::Enter => app.submit_upload(),
        KeyCode::Char('c') => app.clear_upload(),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('C') => app.clear_chat(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(),
        KeyCode::Char('G') => app.chat_pane.follow = true,
        _ => {}
    }
}

fn handle_auth_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') => app.show_login(),
        KeyCode::Char('s') => app.show_signup(),
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => app.next_auth_field(),
        KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => app.prev_auth_field(),
        _ => {}
    }
}

fn handle_dashboard_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.refresh_documents(),
        KeyCode::Char('j') | KeyCode::Down => app.dashboard_pane.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.dashboard_pane.nav_up(),
        KeyCode::Enter => app.open_selected_document(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => {}
    }
}

fn handle_document_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('p') => app.toggle_pin(),
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => {
            app.document_pane.follow = false;
            app.document_pane.comment_scroll = app.document_pane.comment_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.document_pane.follow = false;
            app.document_pane.comment_scroll = app.document_pane.comment_scroll.saturating_sub(1);
        }
        KeyCode::Esc | KeyCode::Char('b') => switch_screen(app, Screen::Dashboard),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.input_mode = InputMode::Normal;
        return;
    }

    match app.screen {
        Screen::Ingest => {
            if key.code == KeyCode::Enter {
                let text = app.path_input.take();
                app.add_paths(&text);
                app.input_mode = InputMode::Normal;
                return;
            }
        }
        Screen::Chat => {
            if key.code == KeyCode::Enter {
                app.send_chat();
                return;
            }
        }
        Screen::Auth => match key.code {
            KeyCode::Enter => {
                app.submit_auth();
                return;
            }
            KeyCode::Tab | KeyCode::Down => {
                app.next_auth_field();
                return;
            }
            KeyCode::BackTab | KeyCode::Up => {
                app.prev_auth_field();
                return;
            }
            _ => {}
        },
        Screen::Document => {
            if key.code == KeyCode::Enter {
                app.add_comment();
                return;
            }
        }
        Screen::Dashboard => {
            app.input_mode = InputMode::Normal;
            return;
        }
    }

    if let Some(input) = active_input(app) {
        input.handle_key(key);
    }
}
