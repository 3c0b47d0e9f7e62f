//! src/view/components/status_bar.rs
//!
//! Two one-line widgets: the session strip above the table and the status
//! line below it. The status line shows the pending notification, or the
//! marked count and a short key reminder.

use ratatui::{
    prelude::*,
    widgets::{Paragraph, Widget},
};

use crate::view::snapshots::UiSnapshot;
use crate::view::theme;

const KEY_HINT: &str = "^N new  ^W close  Tab next  ^L path  F7 mkdir  Del remove  ^Q quit";

pub struct SessionStrip;

impl SessionStrip {
    pub fn render(frame: &mut Frame<'_>, snap: &UiSnapshot, area: Rect) {
        let spans: Vec<Span<'_>> = snap
            .tabs
            .iter()
            .enumerate()
            .map(|(i, tab)| {
                Span::styled(
                    format!(" {}:{} ", i + 1, tab.label),
                    theme::tab_style(tab.active),
                )
            })
            .collect();

        Paragraph::new(Line::from(spans))
            .style(theme::base_style())
            .render(area, frame.buffer_mut());
    }
}

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame<'_>, snap: &UiSnapshot, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let left: Paragraph<'_> = match &snap.notification {
            Some(n) => Paragraph::new(n.message.as_str()).style(theme::notification_style(n.level)),
            None => Paragraph::new(KEY_HINT).style(theme::base_style().fg(theme::COMMENT)),
        };
        left.alignment(Alignment::Left)
            .render(layout[0], frame.buffer_mut());

        let position: String = match snap.cursor {
            Some(cursor) => format!("{}/{}", cursor + 1, snap.rows.len()),
            None => "empty".to_string(),
        };
        let right_text: String = if snap.marked > 0 {
            format!("Marked: {} | {position}", snap.marked)
        } else {
            position
        };

        Paragraph::new(right_text)
            .style(theme::base_style())
            .alignment(Alignment::Right)
            .render(layout[1], frame.buffer_mut());
    }
}
