use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

pub struct CostWidget;

impl CostWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let label = Style::default().fg(Color::White);
        let money = Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD);

        let title = match state.selected_pricing() {
            Some((model, pricing)) => format!(
                "{} (${:.2} / ${:.2} per 1M)",
                model,
                pricing.input(),
                pricing.output()
            ),
            None => "Pricing".to_string(),
        };

        let mut cost_text = Vec::new();

        if let (Some(key), Some(cost)) = (state.selected_month_key(), state.selected_month_cost()) {
            cost_text.push(Line::from(vec![
                Span::styled(format!("{}: ", key), label),
                Span::styled(format!("${:.2}", cost), money),
            ]));
        }

        if let Some(estimate) = state.selected_estimate() {
            cost_text.extend(vec![
                Line::from(vec![
                    Span::styled("Max month: ", label),
                    Span::styled(format!("${:.2}", estimate.max_input_cost()), money),
                    Span::styled(" in + ", label),
                    Span::styled(format!("${:.2}", estimate.max_output_cost()), money),
                    Span::styled(" out", label),
                ]),
                Line::from(vec![
                    Span::styled("Average month: ", label),
                    Span::styled(format!("${:.2}", estimate.average_input_cost()), money),
                    Span::styled(" in + ", label),
                    Span::styled(format!("${:.2}", estimate.average_output_cost()), money),
                    Span::styled(" out", label),
                ]),
                Line::from(vec![
                    Span::styled("All months: ", label),
                    Span::styled(format!("${:.2}", estimate.total_cost()), money),
                ]),
            ]);
        } else {
            cost_text.push(Line::from(Span::styled(
                "No estimate",
                Style::default().fg(Color::Red),
            )));
        }

        let costs = Paragraph::new(cost_text)
            .block(Block::bordered().title(title))
            .alignment(Alignment::Left);

        frame.render_widget(costs, area);
    }
}
