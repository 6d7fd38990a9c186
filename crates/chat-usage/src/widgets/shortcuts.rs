use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::AppState;

pub struct ShortcutsWidget;

impl ShortcutsWidget {
    pub fn render(frame: &mut Frame, area: Rect, _state: &AppState) {
        let key = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let hint = Style::default().fg(Color::Gray);

        let shortcuts_text = vec![Line::from(vec![
            Span::styled("Press ", hint),
            Span::styled("q", key),
            Span::styled(" to quit, ", hint),
            Span::styled("↑/↓", key),
            Span::styled(" to pick a month, ", hint),
            Span::styled("←/→", key),
            Span::styled(" to switch model, ", hint),
            Span::styled("c", key),
            Span::styled(" for conversations", hint),
        ])];

        let shortcuts = Paragraph::new(shortcuts_text).alignment(Alignment::Center);

        frame.render_widget(shortcuts, area);
    }
}
