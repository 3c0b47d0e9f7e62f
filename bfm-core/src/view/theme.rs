//! src/view/theme.rs
//! ============================================================================
//! # Catppuccin Mocha Theme Color Palette
//!
//! Colors are from the Catppuccin palette:
//! https://github.com/catppuccin/catppuccin

use ratatui::style::{Color, Modifier, Style};

use crate::fs::entry::EntryKind;
use crate::model::ui_state::NotificationLevel;

pub const BACKGROUND: Color = Color::Rgb(30, 30, 46); // Base
pub const CURRENT_LINE: Color = Color::Rgb(69, 71, 90); // Surface1
pub const FOREGROUND: Color = Color::Rgb(205, 214, 244); // Text
pub const COMMENT: Color = Color::Rgb(127, 132, 156); // Overlay1
pub const CYAN: Color = Color::Rgb(137, 220, 235); // Sky
pub const GREEN: Color = Color::Rgb(166, 227, 161); // Green
pub const ORANGE: Color = Color::Rgb(250, 179, 135); // Peach
pub const PINK: Color = Color::Rgb(245, 194, 231); // Pink
pub const PURPLE: Color = Color::Rgb(203, 166, 247); // Mauve
pub const RED: Color = Color::Rgb(243, 139, 168); // Red
pub const YELLOW: Color = Color::Rgb(249, 226, 175); // Yellow

pub fn base_style() -> Style {
    Style::default().bg(BACKGROUND).fg(FOREGROUND)
}

pub fn border_style() -> Style {
    Style::default().fg(COMMENT)
}

pub fn title_style() -> Style {
    Style::default().fg(PURPLE).add_modifier(Modifier::BOLD)
}

pub fn header_style() -> Style {
    Style::default().fg(YELLOW).add_modifier(Modifier::BOLD)
}

pub fn highlight_style() -> Style {
    Style::default()
        .bg(CURRENT_LINE)
        .add_modifier(Modifier::BOLD)
}

pub fn marked_style() -> Style {
    Style::default().fg(ORANGE).add_modifier(Modifier::ITALIC)
}

/// Row color by entry type.
pub fn entry_style(kind: EntryKind) -> Style {
    let fg: Color = match kind {
        EntryKind::Directory => CYAN,
        EntryKind::Symlink => PINK,
        EntryKind::BlockDevice | EntryKind::CharDevice => YELLOW,
        EntryKind::Fifo | EntryKind::Socket => GREEN,
        EntryKind::Regular | EntryKind::Other => FOREGROUND,
    };
    Style::default().fg(fg)
}

pub fn tab_style(active: bool) -> Style {
    if active {
        Style::default()
            .bg(PURPLE)
            .fg(BACKGROUND)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(BACKGROUND).fg(COMMENT)
    }
}

pub fn notification_style(level: NotificationLevel) -> Style {
    let fg: Color = match level {
        NotificationLevel::Warning => YELLOW,
        NotificationLevel::Error => RED,
    };
    Style::default().bg(BACKGROUND).fg(fg)
}

pub fn prompt_border_style() -> Style {
    Style::default().fg(PURPLE)
}

pub fn help_style() -> Style {
    Style::default().fg(COMMENT)
}
