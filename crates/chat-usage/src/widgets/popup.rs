use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};

use crate::AppState;

pub struct PopupWidget;

impl PopupWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let popup_area = Self::centered_rect(70, 70, area);

        // Clear the area first
        frame.render_widget(Clear, popup_area);

        let title = match state.selected_month_key() {
            Some(key) => format!("Conversations in {}", key),
            None => "Conversations".to_string(),
        };

        let popup = Paragraph::new(Self::create_conversation_lines(state))
            .block(
                Block::bordered()
                    .title(title)
                    .title_alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(popup, popup_area);
    }

    fn create_conversation_lines(state: &AppState) -> Vec<Line> {
        let mut lines = Vec::new();

        if let Some(usage) = state.selected_month_usage() {
            let mut conversations: Vec<_> = usage.conversations().iter().collect();
            conversations.sort_by(|a, b| b.total_tokens().cmp(&a.total_tokens()));

            for conversation in conversations {
                let title: String = conversation.title().chars().take(40).collect();
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<40} ", title), Style::default().fg(Color::White)),
                    Span::styled(
                        format!("{:>8}", conversation.input_tokens()),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(" in ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        format!("{:>8}", conversation.output_tokens()),
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(" out", Style::default().fg(Color::Gray)),
                ]));
            }
        }

        lines.extend(vec![
            Line::from(" "),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "c",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to close", Style::default().fg(Color::Gray)),
            ]),
        ]);

        lines
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

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
