use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

pub struct HeaderWidget;

impl HeaderWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let header_text = vec![Line::from(vec![
            Span::styled(
                "Chat Usage Estimator",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" - {}", state.export_path.display()),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!(" [{}, {}]", state.tokenizer.name(), state.start_rule().name()),
                Style::default().fg(Color::Yellow),
            ),
        ])];

        let header = Paragraph::new(header_text)
            .block(Block::bordered().title("Export"))
            .alignment(Alignment::Center);

        frame.render_widget(header, area);
    }
}
