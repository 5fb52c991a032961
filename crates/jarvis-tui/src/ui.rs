use jarvis_core::{ChatRole, ConnectionStatus, NoticeKind, ViewVariant};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, FocusPane, InputMode, SHORTCUTS};

const SIDEBAR_WIDTH: u16 = 34;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Memory Core sidebar (left) and chat (right)
    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(SIDEBAR_WIDTH.min(body_area.width / 3)),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_sidebar(app, frame, sidebar_area);
    render_chat_pane(app, frame, main_area);

    render_footer(app, frame, footer_area);

    if app.session.notice().is_some() {
        render_notice(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let url_color = if app.status.is_online() { Color::Green } else { Color::Gray };
    let title = Line::from(vec![
        Span::styled(" J.A.R.V.I.S. ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("ADVANCED ASSISTANT v1.0 ", Style::default().fg(Color::LightBlue)),
        Span::styled(app.client.base_url().to_string(), Style::default().fg(url_color)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.focus {
        FocusPane::Chat => " CHAT ",
        FocusPane::Memory => " MEMORY ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.session.notice().is_some() {
        vec![
            Span::styled(" any key ", key_style),
            Span::styled(" dismiss ", label_style),
        ]
    } else {
        match (app.focus, app.input_mode) {
            (FocusPane::Chat, InputMode::Editing) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" memory ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
            (FocusPane::Memory, InputMode::Editing) => vec![
                Span::styled(" Ctrl+S ", key_style),
                Span::styled(" update database ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" chat ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
            (_, InputMode::Normal) => {
                let mut hints = vec![
                    Span::styled(" i ", key_style),
                    Span::styled(" type ", label_style),
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" Tab ", key_style),
                    Span::styled(" focus ", label_style),
                ];
                if app.shows_welcome_panel() {
                    hints.extend(vec![
                        Span::styled(" 1-4 ", key_style),
                        Span::styled(" shortcut ", label_style),
                    ]);
                }
                if app.can_recheck() {
                    hints.extend(vec![
                        Span::styled(" r ", key_style),
                        Span::styled(" recheck ", label_style),
                    ]);
                }
                hints.extend(vec![
                    Span::styled(" q ", key_style),
                    Span::styled(" quit ", label_style),
                ]);
                hints
            }
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let [memory_area, status_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.memory_area = Some(memory_area);

    render_memory(app, frame, memory_area);
    render_status(app, frame, status_area);
}

fn render_memory(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Memory;
    let editing = focused && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Memory Core ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [hint_area, editor_area, action_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new("Ingest new knowledge here.").style(Style::default().fg(Color::Gray)),
        hint_area,
    );

    let draft = &app.session.ingest_draft;
    let editor = if draft.is_empty() {
        Paragraph::new(Span::styled(
            "Paste text to add to vector database...",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: false })
    } else {
        // Keep the tail of the draft (where typing happens) in view
        let scroll = wrapped_rows(draft, editor_area.width).saturating_sub(editor_area.height);
        Paragraph::new(draft.as_str())
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
    };
    frame.render_widget(editor, editor_area);

    let action = if app.session.is_ingesting() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Line::from(Span::styled(
            format!(" Updating Database{}", dots),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(vec![
            Span::styled(" Ctrl+S ", Style::default().bg(Color::Blue).fg(Color::White)),
            Span::styled(" Update Database", Style::default().fg(Color::LightBlue)),
        ])
    };
    frame.render_widget(Paragraph::new(action), action_area);

    if editing && app.session.notice().is_none() {
        let last_line = draft.rsplit('\n').next().unwrap_or_default();
        let width = editor_area.width.max(1) as usize;
        // col < width, so it fits back into u16
        let col = (last_line.chars().count() % width) as u16;
        let row = wrapped_rows(draft, editor_area.width)
            .saturating_sub(1)
            .min(editor_area.height.saturating_sub(1));
        frame.set_cursor_position((editor_area.x + col, editor_area.y + row));
    }
}

/// Rows `text` occupies when wrapped at `width`, saturating at `u16::MAX`
fn wrapped_rows(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = text
        .split('\n')
        .map(|line| line.chars().count() / width + 1)
        .fold(0, usize::saturating_add);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let color = match app.status {
        ConnectionStatus::Online => Color::Green,
        ConnectionStatus::Offline => Color::Red,
        ConnectionStatus::Unknown => Color::Yellow,
    };

    let mut spans = vec![
        Span::styled(" ● ", Style::default().fg(color)),
        Span::styled(
            app.status_label().to_uppercase(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ];
    if app.can_recheck() {
        spans.push(Span::styled("  r: retry", Style::default().fg(Color::Gray)));
    }

    let status = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    );
    frame.render_widget(status, area);
}

fn render_chat_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store areas for mouse hit-testing
    app.chat_area = Some(chat_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let focused = app.focus == FocusPane::Chat;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Conversation ");

    if app.shows_welcome_panel() {
        render_welcome_panel(frame, chat_area, chat_block);
    } else {
        let chat = Paragraph::new(chat_text(app))
            .block(chat_block)
            .wrap(Wrap { trim: false })
            .scroll((app.chat_scroll, 0));
        frame.render_widget(chat, chat_area);
    }

    render_input(app, frame, input_area);
}

fn chat_text(app: &App) -> Text<'static> {
    let user_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let assistant_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let bubbles = app.variant == ViewVariant::Welcome;

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.session.messages() {
        match msg.role {
            ChatRole::User if bubbles => {
                lines.push(Line::from(Span::styled("You", user_style)).alignment(Alignment::Right));
                for line in msg.content.lines() {
                    lines.push(
                        Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Cyan)))
                            .alignment(Alignment::Right),
                    );
                }
            }
            ChatRole::User => {
                lines.push(Line::from(Span::styled("You:", user_style)));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                let label = if bubbles { "Jarvis" } else { "Jarvis:" };
                lines.push(Line::from(Span::styled(label, assistant_style)));
                // Split response into lines and parse markdown
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_loading() {
        let label = if bubbles { "Jarvis" } else { "Jarvis:" };
        lines.push(Line::from(Span::styled(label, assistant_style)));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Processing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}

fn render_welcome_panel(frame: &mut Frame, area: Rect, block: Block) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);

    let mut lines = vec![
        Line::from(Span::styled("◉", Style::default().fg(Color::LightBlue).bold())),
        Line::default(),
        Line::from(Span::styled("Online & Ready", Style::default().fg(Color::White).bold())),
        Line::default(),
        Line::from(Span::styled(
            "I am connected to your local LLM and Pinecone Vector Database.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "Select an action below or type a command.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
    ];

    for (i, shortcut) in SHORTCUTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", i + 1), key_style),
            Span::styled(format!(" {}", shortcut.label), Style::default().fg(Color::LightBlue)),
        ]));
        lines.push(Line::from(Span::styled(
            shortcut.command,
            Style::default().fg(Color::DarkGray),
        )));
    }

    // Vertically center the panel inside the block
    let inner_height = block.inner(area).height;
    let padding = inner_height.saturating_sub(lines.len() as u16) / 2;
    let text: Vec<Line> = std::iter::repeat(Line::default())
        .take(padding as usize)
        .chain(lines)
        .collect();

    let panel = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Chat;
    let editing = focused && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let title = if app.session.is_loading() {
        " Waiting for reply... "
    } else if app.session.can_send() {
        " Message (Enter to send) "
    } else {
        " Message "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.session.draft.is_empty() {
        Paragraph::new(Span::styled(
            "Enter command...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        // Get the visible slice of the input
        let visible_text: String = app.session.draft
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    if editing && app.session.notice().is_none() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = app.session.notice() else {
        return;
    };

    let (title, color) = match notice.kind {
        NoticeKind::Success => (" Memory Core ", Color::Green),
        NoticeKind::Failure => (" Error ", Color::Red),
    };

    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let text_width = popup_width.saturating_sub(4).max(1) as usize;
    let text_lines = (notice.text.chars().count() / text_width + 1) as u16;
    let popup_height = (text_lines + 4).min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title);

    let body = Text::from(vec![
        Line::from(Span::styled(notice.text.clone(), Style::default().fg(Color::White))),
        Line::default(),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let popup = Paragraph::new(body)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(popup, popup_area);
}
