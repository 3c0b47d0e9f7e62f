//! ``src/controller/prompt.rs``
//!
//! # Terminal text entry
//!
//! [`TuiPrompt`] is the [`TextEntry`] used by the running application. It
//! takes over the terminal and the input channel for the duration of one
//! request, drawing the overlay on top of a frozen snapshot of the screen.

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::Backend};
use tokio::sync::mpsc::Receiver;
use tracing::{debug, warn};

use crate::controller::collaborators::TextEntry;
use crate::view::snapshots::{PromptSnapshot, UiSnapshot};
use crate::view::ui::UIRenderer;
use compact_str::CompactString;

/// What a key did to the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStep {
    Continue,
    Submit,
    Cancel,
}

/// Editable single line with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptInput {
    buffer: String,
    cursor: usize,
}

impl PromptInput {
    #[must_use]
    pub fn new(initial: Option<&str>) -> Self {
        let buffer: String = initial.unwrap_or_default().to_string();
        let cursor: usize = buffer.chars().count();
        Self { buffer, cursor }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn snapshot(&self, title: &str) -> PromptSnapshot {
        PromptSnapshot {
            title: CompactString::new(title),
            input: self.buffer.clone(),
            cursor: self.cursor,
        }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_index)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PromptStep {
        let ctrl: bool = key.modifiers.contains(KeyModifiers::CONTROL);
        let len: usize = self.buffer.chars().count();

        match key.code {
            KeyCode::Enter => return PromptStep::Submit,
            KeyCode::Esc => return PromptStep::Cancel,
            KeyCode::Char('c' | 'g') if ctrl => return PromptStep::Cancel,

            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = len,
            KeyCode::Char('u') if ctrl => {
                let end: usize = self.byte_index(self.cursor);
                self.buffer.replace_range(..end, "");
                self.cursor = 0;
            }

            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),

            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at: usize = self.byte_index(self.cursor);
                self.buffer.remove(at);
            }
            KeyCode::Delete if self.cursor < len => {
                let at: usize = self.byte_index(self.cursor);
                self.buffer.remove(at);
            }

            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let at: usize = self.byte_index(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
            }

            _ => {}
        }

        PromptStep::Continue
    }
}

/// Modal prompt drawn over `backdrop`.
pub struct TuiPrompt<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    renderer: &'a mut UIRenderer,
    events: &'a mut Receiver<Event>,
    backdrop: UiSnapshot,
}

impl<'a, B: Backend> TuiPrompt<'a, B> {
    pub fn new(
        terminal: &'a mut Terminal<B>,
        renderer: &'a mut UIRenderer,
        events: &'a mut Receiver<Event>,
        backdrop: UiSnapshot,
    ) -> Self {
        Self {
            terminal,
            renderer,
            events,
            backdrop,
        }
    }
}

#[async_trait]
impl<'a, B: Backend + Send> TextEntry for TuiPrompt<'a, B> {
    async fn request_text(&mut self, title: &str, initial: Option<&str>) -> Option<String> {
        let mut input: PromptInput = PromptInput::new(initial);

        loop {
            let frame_snap: UiSnapshot = self.backdrop.with_prompt(input.snapshot(title));
            if let Err(e) = self
                .terminal
                .draw(|frame| self.renderer.render(frame, &frame_snap))
            {
                warn!("Failed to draw prompt: {e}");
                return None;
            }

            match self.events.recv().await {
                None => return None,

                Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    match input.handle_key(&key) {
                        PromptStep::Continue => {}
                        PromptStep::Submit => {
                            debug!(title, "Prompt submitted");
                            return Some(input.value().to_string());
                        }
                        PromptStep::Cancel => {
                            debug!(title, "Prompt cancelled");
                            return None;
                        }
                    }
                }

                // Resize and the rest only need a redraw.
                Some(_) => {}
            }
        }
    }
}
