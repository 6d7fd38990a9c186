use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

pub struct StatisticsWidget;

impl StatisticsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let label = Style::default().fg(Color::White);
        let value = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);

        let stats_text = match state.analyzer.statistics() {
            Some(stats) => vec![
                Line::from(vec![
                    Span::styled("Conversations: ", label),
                    Span::styled(state.analyzer.conversation_count().to_string(), value),
                    Span::styled(format!(" in {} months", stats.month_count()), label),
                ]),
                Line::from(vec![
                    Span::styled("Total: ", label),
                    Span::styled(stats.total_input_tokens().to_string(), value),
                    Span::styled(" in / ", label),
                    Span::styled(stats.total_output_tokens().to_string(), value),
                    Span::styled(" out", label),
                ]),
                Line::from(vec![
                    Span::styled("Max month: ", label),
                    Span::styled(stats.max_input_tokens().to_string(), value),
                    Span::styled(" in / ", label),
                    Span::styled(stats.max_output_tokens().to_string(), value),
                    Span::styled(" out", label),
                ]),
                Line::from(vec![
                    Span::styled("Min month: ", label),
                    Span::styled(stats.min_input_tokens().to_string(), value),
                    Span::styled(" in / ", label),
                    Span::styled(stats.min_output_tokens().to_string(), value),
                    Span::styled(" out", label),
                ]),
                Line::from(vec![
                    Span::styled("Average: ", label),
                    Span::styled(format!("{:.1}", stats.average_input_tokens()), value),
                    Span::styled(" in / ", label),
                    Span::styled(format!("{:.1}", stats.average_output_tokens()), value),
                    Span::styled(" out", label),
                ]),
            ],
            None => vec![Line::from(Span::styled(
                "No conversations",
                Style::default().fg(Color::Red),
            ))],
        };

        let stats = Paragraph::new(stats_text)
            .block(Block::bordered().title("Statistics"))
            .alignment(Alignment::Left);

        frame.render_widget(stats, area);
    }
}
