use chat_usage_estimator::prelude::*;
use std::env;
use std::path::Path;

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn discover_export_paths() -> Vec<std::path::PathBuf> {
    let standard_paths = [
        "./conversations.json",
        "~/ChatGPTChats/conversations.json",
        "~/Downloads/conversations.json",
    ];

    let mut discovered_paths = Vec::new();

    for path_str in &standard_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(&*path);
        if path.is_file() {
            discovered_paths.push(path.to_path_buf());
        }
    }

    discovered_paths
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let export_path = if args.len() >= 2 {
        args[1].clone().into()
    } else {
        match discover_export_paths().into_iter().next() {
            Some(path) => path,
            None => {
                eprintln!("No conversations.json found in the usual places:");
                eprintln!("  ./conversations.json");
                eprintln!("  ~/ChatGPTChats/conversations.json");
                eprintln!("  ~/Downloads/conversations.json");
                eprintln!();
                eprintln!("Usage: {} [path_to_conversations.json]", args[0]);
                std::process::exit(1);
            }
        }
    };

    println!("Loading conversations from: {}", export_path.display());

    let tokenizer = TokenizerKind::default().build()?;
    let mut analyzer = UsageAnalyzer::new(tokenizer, PricingProvider::new());
    let loaded = analyzer.load_export(&export_path)?;

    println!(
        "Loaded {} conversations across {} months",
        loaded,
        analyzer.month_count()
    );

    let Some(stats) = analyzer.statistics() else {
        println!("No conversations found.");
        return Ok(());
    };

    println!("\n--- Monthly Usage ---");
    for (month, usage) in analyzer.months() {
        println!(
            "{}: {} in / {} out ({} conversations)",
            month,
            format_number(usage.input_tokens()),
            format_number(usage.output_tokens()),
            usage.conversation_count()
        );
    }

    println!("\n--- Overall Statistics ---");
    println!("Total tokens: {}", format_number(analyzer.total_tokens()));
    println!(
        "Busiest month: {} in / {} out",
        format_number(stats.max_input_tokens()),
        format_number(stats.max_output_tokens())
    );
    println!(
        "Monthly average: {:.0} in / {:.0} out",
        stats.average_input_tokens(),
        stats.average_output_tokens()
    );

    println!("\n--- Average Monthly Cost ---");
    for estimate in analyzer.cost_estimates() {
        println!(
            "{}: ${:.2}/month (${:.2} overall)",
            estimate.model(),
            estimate.average_monthly_cost(),
            estimate.total_cost()
        );
    }

    Ok(())
}
