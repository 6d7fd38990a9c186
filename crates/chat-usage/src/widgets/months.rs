use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Row, Table, TableState},
    Frame,
};

use crate::AppState;

pub struct MonthsWidget;

impl MonthsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let header = Row::new(vec!["Month", "Input tokens", "Output tokens", "Conversations"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = state
            .month_keys
            .iter()
            .filter_map(|key| {
                let usage = state.analyzer.month(key)?;
                let row = Row::new(vec![
                    key.to_string(),
                    usage.input_tokens().to_string(),
                    usage.output_tokens().to_string(),
                    usage.conversation_count().to_string(),
                ]);
                if key.is_unknown() {
                    Some(row.style(Style::default().fg(Color::DarkGray)))
                } else {
                    Some(row)
                }
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Min(14),
            Constraint::Min(14),
            Constraint::Length(14),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::bordered().title("Tokens by month"))
            .row_highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut table_state = TableState::default().with_selected(Some(state.selected_month));
        frame.render_stateful_widget(table, area, &mut table_state);
    }
}
