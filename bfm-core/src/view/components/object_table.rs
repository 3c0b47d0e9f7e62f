//! src/view/components/object_table.rs

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, HighlightSpacing, Row, Table, TableState},
};

use crate::view::snapshots::{RowSnapshot, UiSnapshot};
use crate::view::theme;

pub struct FileTable;

impl FileTable {
    pub fn render(frame: &mut Frame<'_>, snap: &UiSnapshot, area: Rect) {
        let header = Row::new(vec!["Name", "Permissions", "Size", "Modified"])
            .style(theme::header_style())
            .bottom_margin(1);

        let rows: Vec<Row> = snap.rows.iter().map(Self::row).collect();

        let widths = [
            Constraint::Fill(1),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(20),
        ];

        let mut table_state = TableState::default().with_selected(snap.cursor);

        let dotfiles: &str = if snap.show_dotfiles { " [.]" } else { "" };
        let title = format!(" {}{dotfiles} ", snap.title);

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_style(theme::title_style())
                    .border_style(theme::border_style())
                    .style(theme::base_style()),
            )
            .row_highlight_style(theme::highlight_style())
            .highlight_symbol("▶ ")
            .highlight_spacing(HighlightSpacing::Always);

        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn row(row: &RowSnapshot) -> Row<'_> {
        let mut style: Style = theme::entry_style(row.kind);
        if row.marked {
            style = style.patch(theme::marked_style());
        }

        let marker: &str = if row.marked { "* " } else { "" };

        Row::new(vec![
            Cell::from(format!("{marker}{}", row.name)),
            Cell::from(row.permissions.as_str()),
            Cell::from(row.size.as_str()),
            Cell::from(row.modified.as_str()),
        ])
        .style(style)
    }
}
