//! ``src/view/components/input_prompt_overlay.rs``
//! ============================================================================
//! # `InputPromptOverlay`: single-line text entry

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::view::snapshots::PromptSnapshot;
use crate::view::theme;

pub struct InputPromptOverlay;

impl InputPromptOverlay {
    #[allow(clippy::cast_possible_truncation)]
    pub fn render(frame: &mut Frame<'_>, prompt: &PromptSnapshot, area: Rect) {
        let overlay_area = Self::centered_rect(60, area);
        frame.render_widget(Clear, overlay_area);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", prompt.title))
            .title_alignment(Alignment::Center)
            .border_style(theme::prompt_border_style())
            .style(Style::default().bg(theme::BACKGROUND));

        // Keep the cursor visible on long input.
        let inner_width: usize = usize::from(overlay_area.width.saturating_sub(2)).max(1);
        let skip: usize = (prompt.cursor + 1).saturating_sub(inner_width);
        let visible: String = prompt.input.chars().skip(skip).collect();

        let input_paragraph = Paragraph::new(visible)
            .block(input_block)
            .style(Style::default().fg(theme::FOREGROUND));

        frame.render_widget(input_paragraph, overlay_area);

        frame.set_cursor_position((
            overlay_area.x + (prompt.cursor - skip) as u16 + 1,
            overlay_area.y + 1,
        ));

        let help_text = "Enter to confirm • Esc to cancel";
        let help_paragraph = Paragraph::new(help_text)
            .style(theme::help_style())
            .alignment(Alignment::Center);

        let help_area = Rect {
            x: overlay_area.x,
            y: overlay_area.y + overlay_area.height,
            width: overlay_area.width,
            height: 1,
        };

        if help_area.y < area.height {
            frame.render_widget(help_paragraph, help_area);
        }
    }

    /// Three rows tall, `percent_x` wide, centered in `area`.
    fn centered_rect(percent_x: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(3),
                Constraint::Fill(1),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
