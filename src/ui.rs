use llmchat_core::{ChatMessage, ChatRole};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode, LineInput};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Turn `**bold**` runs into bold spans; an unclosed `**` stays literal.
fn styled_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    let balanced = parts.len() % 2 == 1;
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        let inside = i % 2 == 1;
        let dangling = inside && !balanced && i == parts.len() - 1;

        if dangling {
            spans.push(Span::raw(format!("**{}", part)));
        } else if inside && !part.is_empty() {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else if inside {
            spans.push(Span::raw("****"));
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

/// Build every visible line of the transcript from scratch.
pub fn transcript_lines(messages: &[ChatMessage]) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in messages {
        let label_style = match msg.role {
            ChatRole::User => Style::default().fg(Color::Cyan),
            ChatRole::Assistant => Style::default().fg(Color::Yellow),
        };
        lines.push(Line::from(Span::styled(
            msg.role.label(),
            label_style.add_modifier(Modifier::BOLD),
        )));

        for line in msg.content.lines() {
            match msg.role {
                ChatRole::User => lines.push(Line::from(line.to_string())),
                ChatRole::Assistant => lines.push(styled_line(line)),
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn chat_paragraph(messages: &[ChatMessage]) -> Paragraph<'static> {
    Paragraph::new(Text::from(transcript_lines(messages))).wrap(Wrap { trim: true })
}

/// Rows the transcript takes once word-wrapped to `width` columns.
pub fn transcript_height(messages: &[ChatMessage], width: u16) -> u16 {
    if width == 0 || messages.is_empty() {
        return 0;
    }
    let rows = chat_paragraph(messages).line_count(width);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let chips_height = if app.session.files().is_empty() { 0 } else { 3 };

    let [header_area, chat_area, chips_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(chips_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if chips_height > 0 {
        render_chips(app, frame, chips_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    // Popups (alert wins over the attach prompt)
    if let Some(message) = app.alert.clone() {
        render_alert(frame, area, &message);
    } else if app.input_mode == InputMode::Attaching {
        render_attach_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.is_loading() {
        Span::styled(
            format!(" {} waiting ", SPINNER[app.animation_frame as usize % SPINNER.len()]),
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::raw("")
    };

    let title = Line::from(vec![
        Span::styled(" llmchat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint_url.clone(), Style::default().fg(Color::Gray)),
        status,
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    // Inner size minus borders, used by the scroll math
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat ({}) ", app.session.messages().len()));

    // Same wrapper as transcript_height so the scroll limit matches the screen
    let chat = if app.session.messages().is_empty() {
        Paragraph::new(Span::styled(
            "Ask anything. Paste a URL with a question to ask about a site, or Ctrl+O to attach a file.",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: true })
    } else {
        chat_paragraph(app.session.messages())
    };
    let chat = chat.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_chips(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Chips;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Files ({}) ", app.session.files().len()));

    let mut spans: Vec<Span> = Vec::new();
    for (i, file) in app.session.files().iter().enumerate() {
        let mut style = if file.is_supported() {
            Style::default().fg(Color::White).bg(Color::Blue)
        } else {
            Style::default().fg(Color::Gray).bg(Color::DarkGray)
        };
        if focused && i == app.selected_chip {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {} x ", file.name), style));
        spans.push(Span::raw(" "));
    }

    let chips = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(chips, area);
}

/// Slice of `input` that fits in `width`, and the cursor column inside it.
fn visible_input(input: &LineInput, width: usize) -> (String, u16) {
    let scroll_offset = if width == 0 || input.cursor < width {
        0
    } else {
        input.cursor - width + 1
    };

    let visible: String = input.text.chars().skip(scroll_offset).take(width).collect();
    (visible, (input.cursor - scroll_offset) as u16)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && app.focus == FocusPane::Input;
    let border_color = if !editing {
        Color::DarkGray
    } else if app.can_send() || !app.session.files().is_empty() {
        Color::Yellow
    } else {
        Color::Gray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (Enter to send) ");

    let (visible, cursor_x) = visible_input(&app.input, area.width.saturating_sub(2) as usize);
    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing && app.alert.is_none() {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = if app.alert.is_some() {
        &[(" Esc ", " dismiss ")]
    } else if app.input_mode == InputMode::Attaching {
        &[(" Enter ", " attach "), (" Esc ", " cancel ")]
    } else if app.focus == FocusPane::Chips {
        &[
            (" h/l ", " select "),
            (" d ", " remove "),
            (" Tab ", " back "),
            (" Enter ", " send "),
        ]
    } else {
        &[
            (" Enter ", " send "),
            (" ^O ", " attach "),
            (" Tab ", " files "),
            (" ^L ", " clear "),
            (" PgUp/PgDn ", " scroll "),
            (" ^C ", " quit "),
        ]
    };

    let spans: Vec<Span> = pairs
        .iter()
        .flat_map(|(k, label)| {
            [
                Span::styled(*k, key_style),
                Span::styled(*label, label_style),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Request failed (Esc to dismiss) ");

    let alert = Paragraph::new(message.to_string())
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(alert, popup_area);
}

fn render_attach_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 70, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Attach file ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let hint = Paragraph::new("Path to a jpg, png, pdf or docx file:")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, Rect::new(inner.x, inner.y, inner.width, 1));

    let field = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let (visible, cursor_x) = visible_input(&app.attach_input, field.width as usize);
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        field,
    );
    frame.set_cursor_position((field.x + cursor_x, field.y));
}
