use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    let message_count = app.session.conversation().len();
    let was_loading = app.session.is_loading();

    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Status(status) => app.status = status,
        AppEvent::ChatReply(outcome) => app.session.finish_send(outcome),
        AppEvent::IngestDone(outcome) => app.session.finish_ingest(outcome),
    }

    // Follow the conversation whenever it grows or the indicator toggles
    if app.session.conversation().len() != message_count || app.session.is_loading() != was_loading {
        app.scroll_chat_to_bottom();
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // A pending notice blocks all other input until dismissed
    if app.session.notice().is_some() {
        app.session.dismiss_notice();
        return;
    }

    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        submit_ingest(app);
        return;
    }

    if key.code == KeyCode::Tab {
        app.toggle_focus();
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => match app.focus {
            FocusPane::Chat => handle_chat_editing(app, key),
            FocusPane::Memory => handle_memory_editing(app, key),
        },
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Start typing in the focused pane
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,

        // Manual connectivity recheck
        KeyCode::Char('r') if app.can_recheck() => recheck(app),

        // Empty-state shortcuts
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            app.apply_shortcut(index);
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height.max(1)),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,

        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => submit_chat(app),
        // Drafts stay editable while a reply is pending; only sending is gated
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.session.draft, app.chat_cursor);
                app.session.draft.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.session.draft.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.session.draft, app.chat_cursor);
                app.session.draft.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.draft.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.session.draft.chars().count();
        }
        KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char(c) if !is_chord(&key) => {
            let byte_pos = char_to_byte_index(&app.session.draft, app.chat_cursor);
            app.session.draft.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_memory_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.session.ingest_draft.push('\n');
        }
        KeyCode::Backspace => {
            app.session.ingest_draft.pop();
        }
        KeyCode::Char(c) if !is_chord(&key) => {
            app.session.ingest_draft.push(c);
        }
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if app.input_mode != InputMode::Editing || app.session.notice().is_some() {
        return;
    }

    match app.focus {
        FocusPane::Chat => {
            // Single-line input: fold newlines into spaces
            let flattened: String = text
                .chars()
                .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                .collect();
            let byte_pos = char_to_byte_index(&app.session.draft, app.chat_cursor);
            app.session.draft.insert_str(byte_pos, &flattened);
            app.chat_cursor += flattened.chars().count();
        }
        FocusPane::Memory => {
            app.session.ingest_draft.push_str(&text.replace("\r\n", "\n"));
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let position = Position::new(mouse.column, mouse.row);
    let hit = |area: Option<Rect>| area.is_some_and(|a| a.contains(position));

    match mouse.kind {
        MouseEventKind::ScrollUp if hit(app.chat_area) => app.scroll_chat_up(3),
        MouseEventKind::ScrollDown if hit(app.chat_area) => app.scroll_chat_down(3),
        MouseEventKind::Down(_) => {
            if hit(app.chat_area) {
                app.focus = FocusPane::Chat;
            } else if hit(app.memory_area) {
                app.focus = FocusPane::Memory;
            }
        }
        _ => {}
    }
}

/// Send the chat draft; the reply comes back as [`AppEvent::ChatReply`]
fn submit_chat(app: &mut App) {
    let Some(message) = app.session.begin_send_draft() else {
        return;
    };
    app.chat_cursor = 0;

    tracing::info!(chars = message.chars().count(), "sending chat message");
    let client = app.client.clone();
    let events = app.events.clone();
    tokio::spawn(async move {
        let outcome = client.chat(&message).await;
        let _ = events.send(AppEvent::ChatReply(outcome));
    });
}

/// Push the ingest draft to the knowledge store; completion arrives as
/// [`AppEvent::IngestDone`]
fn submit_ingest(app: &mut App) {
    let Some(text) = app.session.begin_ingest_draft() else {
        return;
    };

    tracing::info!(chars = text.chars().count(), "ingesting knowledge text");
    let client = app.client.clone();
    let events = app.events.clone();
    tokio::spawn(async move {
        let outcome = client.ingest(&text).await;
        let _ = events.send(AppEvent::IngestDone(outcome));
    });
}

/// Ctrl/Alt combinations are commands, never text
fn is_chord(key: &KeyEvent) -> bool {
    key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn recheck(app: &mut App) {
    tracing::info!("manual connectivity recheck");
    let monitor = app.monitor.clone();
    tokio::spawn(async move {
        monitor.check().await;
    });
}
