use std::sync::Arc;

use jarvis_core::{
    BackendClient, Config, ConnectionStatus, ConnectivityMonitor, Conversation, Session,
    ViewVariant,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Memory,
}

/// Canned prompt offered on the empty-state panel
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
    pub label: &'static str,
    pub command: &'static str,
}

pub const SHORTCUTS: [Shortcut; 4] = [
    Shortcut { label: "Who are you?", command: "Who are you and what can you do?" },
    Shortcut { label: "Check Knowledge", command: "What is currently in your memory bank?" },
    Shortcut { label: "Writing Assist", command: "Draft a professional email about AI." },
    Shortcut { label: "Explain RAG", command: "How does your retrieval system work?" },
];

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub variant: ViewVariant,

    // Conversation, drafts and in-flight flags
    pub session: Session,
    pub status: ConnectionStatus,

    // Chat view state
    pub chat_cursor: usize, // cursor position in session.draft (chars)
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Layout areas for mouse hit-testing
    pub chat_area: Option<Rect>,
    pub memory_area: Option<Rect>,

    // Backend plumbing
    pub client: BackendClient,
    pub monitor: Arc<ConnectivityMonitor>,
    pub events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        config: &Config,
        client: BackendClient,
        monitor: Arc<ConnectivityMonitor>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let conversation = Conversation::with_greeting(&config.greeting);
        let session = Session::with_conversation(client.base_url(), conversation);
        let status = monitor.status();

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Chat,
            variant: config.variant,

            session,
            status,

            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            chat_area: None,
            memory_area: None,

            client,
            monitor,
            events,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_loading() || self.session.is_ingesting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Empty-state panel replaces the message list until the first exchange
    pub fn shows_welcome_panel(&self) -> bool {
        self.variant == ViewVariant::Welcome && self.session.conversation().is_pristine()
    }

    /// Manual recheck is only offered once the backend is known to be down
    pub fn can_recheck(&self) -> bool {
        self.status == ConnectionStatus::Offline
    }

    /// Copy a shortcut prompt into the chat draft without sending it
    pub fn apply_shortcut(&mut self, index: usize) -> bool {
        if !self.shows_welcome_panel() {
            return false;
        }
        let Some(shortcut) = SHORTCUTS.get(index) else {
            return false;
        };

        self.session.draft = shortcut.command.to_string();
        self.chat_cursor = self.session.draft.chars().count();
        self.focus = FocusPane::Chat;
        self.input_mode = InputMode::Editing;
        true
    }

    /// Rendered height of the message list, using the same wrap estimate as
    /// the chat pane.
    pub fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.session.messages() {
            total_lines = total_lines.saturating_add(1); // Role line
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { (char_count / wrap_width) + 1 };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.session.is_loading() {
            total_lines = total_lines.saturating_add(2); // Role line + "Processing..."
        }

        total_lines
    }

    fn max_chat_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_line_count().saturating_sub(visible_height)
    }

    /// Scroll chat so the newest message (or the loading indicator) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll());
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Chat => FocusPane::Memory,
            FocusPane::Memory => FocusPane::Chat,
        };
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jarvis_core::ChatMessage;

    pub(crate) fn test_app(variant: ViewVariant) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        // Bind then release a port so requests fail fast with "connection refused".
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let config = Config {
            api_url: url.clone(),
            variant,
            ..Config::default()
        };
        let client = BackendClient::new(&config.api_url);
        let monitor = Arc::new(ConnectivityMonitor::new(client.clone()));
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(&config, client, monitor, tx), rx)
    }

    #[test]
    fn test_new_app_starts_in_chat_editing() {
        let (app, _rx) = test_app(ViewVariant::Welcome);
        assert_eq!(app.focus, FocusPane::Chat);
        assert_eq!(app.input_mode, InputMode::Editing);
        assert_eq!(app.status, ConnectionStatus::Unknown);
        assert!(app.shows_welcome_panel());
    }

    #[test]
    fn test_classic_variant_has_no_welcome_panel() {
        let (app, _rx) = test_app(ViewVariant::Classic);
        assert!(!app.shows_welcome_panel());
    }

    #[test]
    fn test_apply_shortcut_fills_draft_without_sending() {
        let (mut app, _rx) = test_app(ViewVariant::Welcome);
        app.focus = FocusPane::Memory;
        app.input_mode = InputMode::Normal;

        assert!(app.apply_shortcut(1));
        assert_eq!(app.session.draft, "What is currently in your memory bank?");
        assert_eq!(app.chat_cursor, app.session.draft.chars().count());
        assert_eq!(app.focus, FocusPane::Chat);
        assert_eq!(app.session.messages().len(), 1);
        assert!(!app.session.is_loading());

        assert!(!app.apply_shortcut(9));
    }

    #[test]
    fn test_shortcuts_disabled_after_first_exchange() {
        let (mut app, _rx) = test_app(ViewVariant::Welcome);
        app.session.begin_send("hello");
        assert!(!app.apply_shortcut(0));
    }

    #[test]
    fn test_chat_line_count_wraps_long_lines() {
        let (mut app, _rx) = test_app(ViewVariant::Classic);
        app.chat_width = 10;
        let greeting_lines = app.chat_line_count();

        app.session.begin_send(&"x".repeat(25));
        // role + 3 wrapped lines + blank, plus the loading indicator
        assert_eq!(app.chat_line_count(), greeting_lines + 5 + 2);

        app.session.finish_send(Ok("a\n\nb".to_string()));
        assert_eq!(app.chat_line_count(), greeting_lines + 5 + 5);
    }

    #[test]
    fn test_scroll_to_bottom_and_clamp() {
        let (mut app, _rx) = test_app(ViewVariant::Classic);
        app.chat_width = 40;
        app.chat_height = 4;
        for i in 0..5 {
            app.session.begin_send(&format!("question {i}"));
            app.session.finish_send(Ok(format!("answer {i}")));
        }

        app.scroll_chat_to_bottom();
        let bottom = app.chat_scroll;
        assert_eq!(bottom, app.chat_line_count() - 4);

        app.scroll_chat_down(10);
        assert_eq!(app.chat_scroll, bottom);
        app.scroll_chat_up(3);
        assert_eq!(app.chat_scroll, bottom - 3);
    }

    #[test]
    fn test_recheck_only_when_offline() {
        let (mut app, _rx) = test_app(ViewVariant::Welcome);
        assert!(!app.can_recheck());
        app.status = ConnectionStatus::Offline;
        assert!(app.can_recheck());
        app.status = ConnectionStatus::Online;
        assert!(!app.can_recheck());
    }

    #[test]
    fn test_greeting_comes_from_config() {
        let config = Config {
            greeting: "At your service.".to_string(),
            ..Config::default()
        };
        let client = BackendClient::new(&config.api_url);
        let monitor = Arc::new(ConnectivityMonitor::new(client.clone()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let app = App::new(&config, client, monitor, tx);
        assert_eq!(app.session.messages(), &[ChatMessage::assistant("At your service.")]);
    }
}
