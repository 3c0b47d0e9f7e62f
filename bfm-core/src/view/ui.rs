//! src/view/ui.rs
//! ============================================================
//! Frame renderer that draws the entire TUI from an immutable
//! [`UiSnapshot`]: session strip, listing table, status line and,
//! when present, the text entry overlay.

use std::time::{Duration, Instant};

use ratatui::prelude::*;
use tracing::{instrument, warn};

use crate::view::components::{
    input_prompt_overlay::InputPromptOverlay,
    object_table::FileTable,
    status_bar::{SessionStrip, StatusBar},
};
use crate::view::snapshots::UiSnapshot;

#[derive(Debug, Default)]
pub struct RenderStats {
    pub frames: u64,
    pub slow: u64,
    pub total: Duration,
}

#[derive(Debug, Default)]
pub struct UIRenderer {
    stats: RenderStats,
    /// Rows of the table body in the last frame.
    page_rows: usize,
}

impl UIRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip_all)]
    pub fn render(&mut self, frame: &mut Frame<'_>, snap: &UiSnapshot) {
        let start: Instant = Instant::now();
        let area: Rect = frame.area();

        let [strip, table, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        SessionStrip::render(frame, snap, strip);
        FileTable::render(frame, snap, table);
        StatusBar::render(frame, snap, status);

        if let Some(prompt) = &snap.prompt {
            InputPromptOverlay::render(frame, prompt, area);
        }

        // Borders plus header and its margin.
        self.page_rows = usize::from(table.height.saturating_sub(4)).max(1);

        let duration: Duration = start.elapsed();
        self.stats.total += duration;
        self.stats.frames += 1;
        if duration.as_millis() > 16 {
            self.stats.slow += 1;
            warn!("Slow render: {}ms (target: <16ms)", duration.as_millis());
        }
    }

    /// Listing rows visible at once, for page motions.
    #[must_use]
    pub const fn page_rows(&self) -> usize {
        self.page_rows
    }

    #[must_use]
    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::EntryKind;
    use crate::view::snapshots::{PromptSnapshot, RowSnapshot, TabSnapshot};
    use crate::model::session::SessionId;
    use compact_str::CompactString;
    use ratatui::backend::TestBackend;

    fn snapshot() -> UiSnapshot {
        UiSnapshot {
            title: CompactString::new("/srv/data"),
            rows: vec![RowSnapshot {
                name: CompactString::new("notes.txt"),
                kind: EntryKind::Regular,
                permissions: "-rw-r--r--".to_string(),
                size: "10 B".to_string(),
                modified: "2024/01/02 03:04:05".to_string(),
                marked: false,
            }],
            cursor: Some(0),
            tabs: vec![TabSnapshot {
                id: SessionId(1),
                label: CompactString::new("data"),
                active: true,
            }],
            ..UiSnapshot::default()
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn draws_listing_and_prompt() -> anyhow::Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(100, 20))?;
        let mut renderer = UIRenderer::new();

        let snap = snapshot();
        terminal.draw(|f| renderer.render(f, &snap))?;
        let text = screen_text(&terminal);
        assert!(text.contains("/srv/data"));
        assert!(text.contains("notes.txt"));
        assert!(text.contains("-rw-r--r--"));
        assert!(text.contains("1:data"));
        assert_eq!(renderer.page_rows(), 14);

        let prompting = snap.with_prompt(PromptSnapshot {
            title: CompactString::new("make directory"),
            input: "fresh".to_string(),
            cursor: 5,
        });
        terminal.draw(|f| renderer.render(f, &prompting))?;
        let text = screen_text(&terminal);
        assert!(text.contains("make directory"));
        assert!(text.contains("fresh"));
        assert_eq!(renderer.stats().frames, 2);
        Ok(())
    }
}
