use docspace_core::upload::ALLOWED_EXTENSIONS;
use docspace_core::{AuthPanel, ChatRole, ConnectionStatus, StatusLine, StatusTone};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode, LoginForm, Screen, SignupForm};
use crate::input::TextInput;

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

    match app.screen {
        Screen::Auth => render_auth_screen(app, frame, body_area),
        Screen::Dashboard => render_dashboard_screen(app, frame, body_area),
        Screen::Ingest => render_ingest_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Document => render_document_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.screen == Screen::Document {
        if let Some(alert) = &app.document_pane.alert {
            render_alert(alert, frame, area);
        }
    }
}

fn status_style(tone: StatusTone) -> Style {
    match tone {
        StatusTone::Info => Style::default().fg(Color::DarkGray),
        StatusTone::Success => Style::default().fg(Color::Green),
        StatusTone::Error => Style::default().fg(Color::Red),
    }
}

fn status_line(status: Option<&StatusLine>) -> Line<'static> {
    match status {
        Some(status) => Line::from(Span::styled(status.text.clone(), status_style(status.tone))),
        None => Line::default(),
    }
}

/// Rows a set of lines occupies once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    lines
        .iter()
        .map(|line| {
            let w = line.width() as u16;
            if w == 0 { 1 } else { w.div_ceil(width) }
        })
        .sum()
}

fn render_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    input: &TextInput,
    focused: bool,
    editing: bool,
    masked: bool,
) {
    let border_color = if focused && editing {
        Color::Yellow
    } else if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input.visible(inner_width);
    let visible_text = if masked {
        "*".repeat(visible_text.chars().count())
    } else {
        visible_text
    };

    let paragraph = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(paragraph, area);

    if focused && editing {
        frame.set_cursor_position((area.x + cursor_x as u16 + 1, area.y + 1));
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(" Docspace ", Style::default().fg(Color::Cyan).bold())];

    for (i, screen) in Screen::all().iter().enumerate() {
        let style = if *screen == app.screen {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, screen.title()), style));
    }

    let connection_color = match app.chat_pane.connection {
        ConnectionStatus::Online => Color::Green,
        ConnectionStatus::Thinking => Color::Yellow,
        ConnectionStatus::Offline => Color::Red,
    };
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("● {}", app.chat_pane.connection.label()),
        Style::default().fg(connection_color),
    ));
    if app.session_active {
        spans.push(Span::styled("  signed in", Style::default().fg(Color::Gray)));
    }
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: Vec<(&str, &str)> = match (app.screen, app.input_mode) {
        (Screen::Auth, InputMode::Normal) => vec![
            ("l", "login"),
            ("s", "sign up"),
            ("Tab", "field"),
            ("i", "edit"),
            ("1-5", "screen"),
            ("q", "quit"),
        ],
        (Screen::Auth, InputMode::Editing) => vec![
            ("Tab", "next field"),
            ("Enter", "submit"),
            ("Esc", "stop typing"),
        ],
        (Screen::Dashboard, _) => vec![
            ("j/k", "nav"),
            ("Enter", "open"),
            ("d", "delete"),
            ("r", "refresh"),
            ("1-5", "screen"),
            ("q", "quit"),
        ],
        (Screen::Ingest, InputMode::Normal) => vec![
            ("i", "add path"),
            ("s", "upload"),
            ("c", "clear"),
            ("1-5", "screen"),
            ("q", "quit"),
        ],
        (Screen::Ingest, InputMode::Editing) => {
            vec![("Enter", "add"), ("Esc", "stop typing")]
        }
        (Screen::Chat, InputMode::Normal) => vec![
            ("i", "type"),
            ("j/k", "scroll"),
            ("C", "clear"),
            ("1-5", "screen"),
            ("q", "quit"),
        ],
        (Screen::Chat, InputMode::Editing) => vec![("Enter", "send"), ("Esc", "stop typing")],
        (Screen::Document, InputMode::Normal) => vec![
            ("p", "pin"),
            ("i", "comment"),
            ("j/k", "scroll"),
            ("Esc", "dashboard"),
            ("q", "quit"),
        ],
        (Screen::Document, InputMode::Editing) => {
            vec![("Enter", "post"), ("Esc", "stop typing")]
        }
    };

    let hints = pairs.into_iter().flat_map(|(key, label)| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    });

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

fn render_auth_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let panel = app.auth_pane.panel;
    let field_count = match panel {
        AuthPanel::Login => LoginForm::LABELS.len(),
        AuthPanel::Signup => SignupForm::LABELS.len(),
    } as u16;

    let form_width = 60.min(area.width.saturating_sub(4));
    let form_height = (field_count * 3 + 6).min(area.height);
    let form_area = Rect::new(
        area.x + (area.width.saturating_sub(form_width)) / 2,
        area.y + (area.height.saturating_sub(form_height)) / 2,
        form_width,
        form_height,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(match panel {
            AuthPanel::Login => " Log in ",
            AuthPanel::Signup => " Create an account ",
        });
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend((0..field_count).map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    let rows = Layout::vertical(constraints).split(inner);

    // Panel toggle
    let (login_style, signup_style) = match panel {
        AuthPanel::Login => (Style::default().fg(Color::Cyan).bold(), Style::default().fg(Color::DarkGray)),
        AuthPanel::Signup => (Style::default().fg(Color::DarkGray), Style::default().fg(Color::Cyan).bold()),
    };
    let toggle = Line::from(vec![
        Span::styled(" [l] Login ", login_style),
        Span::raw(" "),
        Span::styled(" [s] Sign up ", signup_style),
    ]);
    frame.render_widget(Paragraph::new(toggle), rows[0]);

    let editing = app.input_mode == InputMode::Editing;
    let (labels, fields, focus, status): (&[&str], Vec<&TextInput>, usize, Option<&StatusLine>) =
        match panel {
            AuthPanel::Login => (
                &LoginForm::LABELS[..],
                app.login_form.fields().to_vec(),
                app.login_form.focus,
                app.auth_pane.login_status.as_ref(),
            ),
            AuthPanel::Signup => (
                &SignupForm::LABELS[..],
                app.signup_form.fields().to_vec(),
                app.signup_form.focus,
                app.auth_pane.signup_status.as_ref(),
            ),
        };

    for (i, (label, input)) in labels.iter().zip(fields).enumerate() {
        let masked = *label == "Password";
        render_input(frame, rows[i + 1], label, input, i == focus, editing, masked);
    }

    let status_area = rows[field_count as usize + 1];
    frame.render_widget(Paragraph::new(status_line(status)), status_area);
}

fn render_dashboard_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Documents ({}) ", app.dashboard_pane.documents.len()));

    if app.dashboard_pane.documents.is_empty() {
        let text = if app.dashboard.loading() {
            "Loading documents..."
        } else {
            "No documents yet. Upload some from the Ingest screen."
        };
        let empty = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(empty, list_area);
    } else {
        let items: Vec<ListItem> = app
            .dashboard_pane
            .documents
            .iter()
            .map(|doc| {
                let mut spans = vec![Span::styled(
                    doc.filename.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                if !doc.department.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", doc.department),
                        Style::default().fg(Color::Magenta),
                    ));
                }
                if let Some(uploaded) = &doc.uploaded_at {
                    spans.push(Span::styled(
                        format!("  {}", uploaded),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Cyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, list_area, &mut app.dashboard_pane.list_state);
    }

    frame.render_widget(
        Paragraph::new(status_line(app.dashboard_pane.status.as_ref())),
        status_area,
    );
}

fn render_ingest_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, queue_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing;
    render_input(
        frame,
        input_area,
        "Add a file or folder path (or drop files here)",
        &app.path_input,
        true,
        editing,
        false,
    );

    let submit_hint = if app.upload_pane.submit_enabled {
        Span::styled(" [s] Upload ", Style::default().fg(Color::Green).bold())
    } else {
        Span::styled(" [s] Upload ", Style::default().fg(Color::DarkGray))
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Selected files ({}) ", app.upload_pane.files.len()))
        .title_bottom(Line::from(submit_hint).right_aligned());

    if app.upload_pane.files.is_empty() {
        let empty = Paragraph::new(Span::styled(
            format!("No files selected. Supported: {}", ALLOWED_EXTENSIONS.join(" ")),
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(empty, queue_area);
    } else {
        let items: Vec<ListItem> = app
            .upload_pane
            .files
            .iter()
            .map(|file| {
                ListItem::new(Line::from(vec![
                    Span::raw(format!(" {} ", file.name)),
                    Span::styled(
                        format!("({:.1} KB)", file.size as f64 / 1024.0),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();
        frame.render_widget(List::new(items).block(block), queue_area);
    }

    frame.render_widget(
        Paragraph::new(status_line(app.upload_pane.status.as_ref())),
        status_area,
    );
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    let pane = &mut app.chat_pane;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Chat: {} ", pane.connection.label()));

    let mut lines: Vec<Line> = Vec::new();
    for msg in &pane.messages {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Assistant:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
            }
            ChatRole::System => {
                lines.push(Line::from(Span::styled(
                    msg.content.clone(),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
        lines.push(Line::default());
    }

    if pane.connection == ConnectionStatus::Thinking {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the newest message in view unless the user scrolled up
    app.chat_height = chat_area.height.saturating_sub(2);
    let total = wrapped_height(&lines, chat_area.width.saturating_sub(2));
    let max_scroll = total.saturating_sub(app.chat_height);
    if pane.follow || pane.scroll >= max_scroll {
        pane.scroll = max_scroll;
        pane.follow = true;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((pane.scroll, 0));
    frame.render_widget(chat, chat_area);

    let title = if pane.send_enabled { "Message" } else { "Message (waiting for reply)" };
    let editing = app.input_mode == InputMode::Editing;
    render_input(frame, input_area, title, &app.chat_input, pane.send_enabled, editing, false);
}

fn render_document_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [title_area, comments_area, input_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let pane = &mut app.document_pane;
    let pin_color = if app.document.is_pinned() { Color::Yellow } else { Color::DarkGray };
    let heading = Line::from(vec![
        Span::styled(pane.title.clone(), Style::default().fg(Color::Cyan).bold()),
        Span::raw("  "),
        Span::styled(format!("[p] {}", pane.pin_label), Style::default().fg(pin_color)),
    ]);
    let details = match (&pane.notice, &pane.details) {
        (Some(notice), _) => status_line(Some(notice)),
        (None, Some(record)) => Line::from(vec![
            Span::styled(record.department.clone(), Style::default().fg(Color::Magenta)),
            Span::styled(format!("  {}", record.role), Style::default().fg(Color::Green)),
            Span::styled(
                format!("  uploaded {}", record.uploaded_at.as_deref().unwrap_or("-")),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        (None, None) => Line::default(),
    };
    let title = Paragraph::new(Text::from(vec![heading, details]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Document "),
    );
    frame.render_widget(title, title_area);

    let lines: Vec<Line> = if pane.comments.is_empty() {
        vec![Line::from(Span::styled(
            "No comments yet.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        pane.comments
            .iter()
            .map(|c| Line::from(vec![Span::styled("• ", Style::default().fg(Color::Cyan)), Span::raw(c.clone())]))
            .collect()
    };

    let height = comments_area.height.saturating_sub(2);
    let total = wrapped_height(&lines, comments_area.width.saturating_sub(2));
    let max_scroll = total.saturating_sub(height);
    if pane.follow || pane.comment_scroll > max_scroll {
        pane.comment_scroll = max_scroll;
    }

    let comments = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" Comments ({}) ", pane.comments.len())),
        )
        .wrap(Wrap { trim: false })
        .scroll((pane.comment_scroll, 0));
    frame.render_widget(comments, comments_area);

    let editing = app.input_mode == InputMode::Editing;
    render_input(frame, input_area, "Add a comment", &app.comment_input, true, editing, false);
}

fn render_alert(text: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = (text.chars().count() as u16 + 8).max(30).min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice ");

    let body = Paragraph::new(vec![
        Line::from(text.to_string()).centered(),
        Line::default(),
        Line::from(Span::styled("Press any key", Style::default().fg(Color::DarkGray))).centered(),
    ])
    .block(block);

    frame.render_widget(body, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_height_counts_wrapped_rows() {
        let lines = vec![Line::from("abcdefghij"), Line::default(), Line::from("abc")];
        assert_eq!(wrapped_height(&lines, 4), 3 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 0), 0);
    }
}
