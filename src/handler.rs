use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode, LineInput};
use crate::tui::AppEvent;

const PAGE_LINES: u16 = 10;
const WHEEL_LINES: u16 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => app.scroll_to_bottom(),
        AppEvent::Tick => app.tick_animation(),
    }
    app.poll_request().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The alert blocks everything else until dismissed
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            app.alert = None;
        }
        return;
    }

    match app.input_mode {
        InputMode::Attaching => handle_attach_key(app, key),
        InputMode::Editing => match app.focus {
            FocusPane::Input => handle_input_key(app, key),
            FocusPane::Chips => handle_chips_key(app, key),
        },
    }
}

fn handle_attach_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_attach(),
        KeyCode::Enter => app.confirm_attach(),
        _ => edit_line(&mut app.attach_input, key),
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Enter => app.submit(),
        KeyCode::Char('l') if ctrl => app.clear_chat(),
        KeyCode::Char('o') if ctrl => app.begin_attach(),
        KeyCode::Tab => app.focus_chips(),
        KeyCode::PageUp => app.scroll_up(PAGE_LINES),
        KeyCode::PageDown => app.scroll_down(PAGE_LINES),
        KeyCode::Up if ctrl => app.scroll_up(1),
        KeyCode::Down if ctrl => app.scroll_down(1),
        _ => edit_line(&mut app.input, key),
    }
}

fn handle_chips_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Esc => app.focus_input(),
        KeyCode::Char('l') | KeyCode::Right => app.chip_next(),
        KeyCode::Char('h') | KeyCode::Left => app.chip_prev(),
        KeyCode::Char('d') | KeyCode::Delete | KeyCode::Backspace => app.remove_selected_chip(),
        KeyCode::Enter => {
            app.focus_input();
            app.submit();
        }
        _ => {}
    }
}

fn edit_line(input: &mut LineInput, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if app.alert.is_some() {
        return;
    }
    match app.input_mode {
        InputMode::Attaching => app.attach_input.insert_str(text.trim()),
        InputMode::Editing => {
            app.focus_input();
            app.input.insert_str(text);
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        _ => {}
    }
}
