use std::path::PathBuf;

use llmchat_core::{ChatSession, Completion, Config, LlmClient};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use crate::ui::transcript_height;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Editing,
    Attaching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Chips,
}

/// Single-line text field with a cursor counted in characters.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    pub text: String,
    pub cursor: usize,
}

impl LineInput {
    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        // Pasted newlines would submit nothing useful on a single line
        for c in s.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Inputs
    pub input: LineInput,
    pub attach_input: LineInput,

    // Conversation
    pub session: ChatSession,
    pub client: LlmClient,
    pub endpoint_url: String,
    pub request_task: Option<JoinHandle<Completion>>,

    // Chips
    pub selected_chip: usize,

    // Blocking popup for failures
    pub alert: Option<String>,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_area: Option<Rect>,

    // Spinner frame while a request is in flight
    pub animation_frame: u8,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let client = LlmClient::new(&config.base_url).with_endpoint(&config.endpoint);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            input: LineInput::default(),
            attach_input: LineInput::default(),

            session: ChatSession::new(config.max_pages),
            endpoint_url: client.url(),
            client,
            request_task: None,

            selected_chip: 0,

            alert: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            animation_frame: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.request_task.is_some()
    }

    pub fn can_send(&self) -> bool {
        ChatSession::can_send(&self.input.text)
    }

    /// Send the current input (or the attached files) in the background.
    pub fn submit(&mut self) {
        if self.is_loading() {
            tracing::debug!("send ignored, request already in flight");
            return;
        }

        let Some(dispatch) = self.session.prepare(&self.input.text) else {
            return;
        };
        self.input.clear();
        self.scroll_to_bottom();

        let client = self.client.clone();
        self.request_task = Some(tokio::spawn(async move { dispatch.run(&client).await }));
    }

    /// Fold a finished request back into the session.
    pub async fn poll_request(&mut self) {
        let finished = self
            .request_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.request_task.take() {
            match task.await {
                Ok(completion) => {
                    if let Some(message) = self.session.complete(completion) {
                        self.alert = Some(message);
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "request task failed");
                    self.session.abort(&err.to_string());
                }
            }
            self.clamp_chip_selection();
            self.scroll_to_bottom();
        }
    }

    pub fn clear_chat(&mut self) {
        self.session.clear();
        self.chat_scroll = 0;
    }

    pub fn begin_attach(&mut self) {
        self.attach_input.clear();
        self.input_mode = InputMode::Attaching;
    }

    pub fn cancel_attach(&mut self) {
        self.attach_input.clear();
        self.input_mode = InputMode::Editing;
    }

    /// Attach the typed path; a missing file raises an alert instead.
    pub fn confirm_attach(&mut self) {
        let raw = self.attach_input.text.trim().to_string();
        self.cancel_attach();
        if raw.is_empty() {
            return;
        }

        let path = expand_home(&raw);
        if path.is_file() {
            self.session.add_file(path);
        } else {
            self.alert = Some(format!("File not found: {}", raw));
        }
    }

    pub fn focus_chips(&mut self) {
        if !self.session.files().is_empty() {
            self.focus = FocusPane::Chips;
            self.clamp_chip_selection();
        }
    }

    pub fn focus_input(&mut self) {
        self.focus = FocusPane::Input;
    }

    pub fn chip_next(&mut self) {
        let len = self.session.files().len();
        if len > 0 {
            self.selected_chip = (self.selected_chip + 1).min(len - 1);
        }
    }

    pub fn chip_prev(&mut self) {
        self.selected_chip = self.selected_chip.saturating_sub(1);
    }

    pub fn remove_selected_chip(&mut self) {
        if self.session.remove_file(self.selected_chip).is_some() {
            self.clamp_chip_selection();
        }
    }

    fn clamp_chip_selection(&mut self) {
        let len = self.session.files().len();
        if len == 0 {
            self.selected_chip = 0;
            if self.focus == FocusPane::Chips {
                self.focus = FocusPane::Input;
            }
        } else if self.selected_chip >= len {
            self.selected_chip = len - 1;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = (self.chat_scroll.saturating_add(lines)).min(max);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        // Fall back to a typical terminal size before the first render
        let width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let height = if self.chat_height > 0 { self.chat_height } else { 20 };
        transcript_height(self.session.messages(), width).saturating_sub(height)
    }

    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App::new(&Config {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        })
    }

    #[test]
    fn test_line_input_edits_by_char() {
        let mut input = LineInput::default();
        input.insert_str("héllo");
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.text, "hélo");
        assert_eq!(input.cursor, 2);
        input.home();
        input.delete();
        assert_eq!(input.text, "élo");
        input.end();
        input.insert('!');
        assert_eq!(input.text, "élo!");
    }

    #[test]
    fn test_paste_drops_newlines() {
        let mut input = LineInput::default();
        input.insert_str("one\r\ntwo");
        assert_eq!(input.text, "onetwo");
    }

    #[tokio::test]
    async fn test_blank_submit_does_nothing() {
        let mut app = test_app();
        app.input.insert_str("   ");
        app.submit();
        assert!(!app.is_loading());
        assert!(app.session.messages().is_empty());
        assert!(!app.can_send());
    }

    #[tokio::test]
    async fn test_submit_clears_input_and_guards_second_send() {
        let mut app = test_app();
        app.input.insert_str("hello there");
        app.submit();
        assert!(app.is_loading());
        assert!(app.input.text.is_empty());
        assert_eq!(app.session.messages().len(), 2);

        app.input.insert_str("again");
        app.submit();
        assert_eq!(app.session.messages().len(), 2);
        assert_eq!(app.input.text, "again");
    }

    #[tokio::test]
    async fn test_failed_request_raises_alert() {
        let mut app = test_app();
        app.input.insert_str("hello there");
        app.submit();

        while app.is_loading() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            app.poll_request().await;
        }

        assert!(app.alert.is_some());
        assert_eq!(app.session.messages()[1].content, "Error: No response");
    }

    #[test]
    fn test_attach_missing_file_alerts() {
        let mut app = test_app();
        app.begin_attach();
        app.attach_input.insert_str("/no/such/file.pdf");
        app.confirm_attach();
        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.session.files().is_empty());
        assert_eq!(app.alert.as_deref(), Some("File not found: /no/such/file.pdf"));
    }

    #[test]
    fn test_chip_removal_clamps_and_returns_focus() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app();
        for name in ["a.png", "b.png"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"x").unwrap();
            app.begin_attach();
            app.attach_input.insert_str(&path.display().to_string());
            app.confirm_attach();
        }
        assert_eq!(app.session.files().len(), 2);

        app.focus_chips();
        app.chip_next();
        assert_eq!(app.selected_chip, 1);
        app.remove_selected_chip();
        assert_eq!(app.selected_chip, 0);
        assert_eq!(app.session.files()[0].name, "a.png");

        app.remove_selected_chip();
        assert!(app.session.files().is_empty());
        assert_eq!(app.focus, FocusPane::Input);
    }

    #[test]
    fn test_focus_chips_requires_files() {
        let mut app = test_app();
        app.focus_chips();
        assert_eq!(app.focus, FocusPane::Input);
    }
}
