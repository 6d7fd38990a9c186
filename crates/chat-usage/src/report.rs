//! Plain-text rendering of an analyzed export.

use chat_usage_estimator::prelude::*;
use std::fmt::Write;
use std::path::Path;

const PREVIEW_CHARS: usize = 100;

pub fn render_report(analyzer: &UsageAnalyzer, export_path: &Path, loaded: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Loaded {} conversations from {}",
        loaded,
        export_path.display()
    );

    let Some(stats) = analyzer.statistics() else {
        let _ = writeln!(out, "\nNo conversations found.");
        return out;
    };

    let _ = writeln!(out, "\n=== Tokens by month ===");
    for (month, usage) in analyzer.months() {
        let _ = writeln!(
            out,
            "{}: {} input tokens, {} output tokens across {} conversations",
            month,
            usage.input_tokens(),
            usage.output_tokens(),
            usage.conversation_count()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "max input tokens monthly usage: {}", stats.max_input_tokens());
    let _ = writeln!(out, "max output tokens monthly usage: {}", stats.max_output_tokens());
    let _ = writeln!(out, "min input tokens monthly usage: {}", stats.min_input_tokens());
    let _ = writeln!(out, "min output tokens monthly usage: {}", stats.min_output_tokens());
    let _ = writeln!(
        out,
        "average input tokens monthly usage: {:.1}",
        stats.average_input_tokens()
    );
    let _ = writeln!(
        out,
        "average output tokens monthly usage: {:.1}",
        stats.average_output_tokens()
    );

    let _ = writeln!(out, "\n===== Pricing estimation =====");
    for estimate in analyzer.cost_estimates() {
        render_estimate(&mut out, &estimate);
    }

    out
}

fn render_estimate(out: &mut String, estimate: &CostEstimate) {
    let _ = writeln!(out, "\n==== Model: {} ====", estimate.model());
    let _ = writeln!(out, "Max input cost: ${:.2}", estimate.max_input_cost());
    let _ = writeln!(out, "Max output cost: ${:.2}", estimate.max_output_cost());
    let _ = writeln!(out, "Average input cost: ${:.2}", estimate.average_input_cost());
    let _ = writeln!(out, "Average output cost: ${:.2}", estimate.average_output_cost());
    let _ = writeln!(out, "Total cost: ${:.2}", estimate.total_cost());
}

/// Every non-system message with text, grouped by conversation.
pub fn render_transcript(analyzer: &UsageAnalyzer) -> String {
    let mut out = String::new();

    for usage in analyzer.months().values() {
        for conversation in usage.conversations() {
            let _ = writeln!(out, "--- {} ({}) ---", conversation.title(), conversation.id());
            for message in conversation.messages() {
                if *message.role() == Role::System || message.text().is_empty() {
                    continue;
                }
                let _ = writeln!(out, "{}: {}", message.role(), preview(message.text()));
                let _ = writeln!(out, "Tokens: {}", analyzer.count_tokens(message.text()));
                let _ = writeln!(
                    out,
                    "create time: {}",
                    message.create_time_iso().unwrap_or_else(|| "-".to_string())
                );
            }
        }
    }

    out
}

fn preview(text: &str) -> String {
    let flat: String = text
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if text.chars().count() > PREVIEW_CHARS {
        flat + "..."
    } else {
        flat
    }
}
