use anyhow::{Context, Result};
use chat_usage_estimator::prelude::*;
use chat_usage_estimator::{ModelPricing, MonthlyUsage};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod report;
mod widgets;
use widgets::*;

const CONFIG_PATH: &str = "~/.config/chat-usage/config.json";

#[derive(Debug, Clone, PartialEq)]
pub enum PopupType {
    Conversations,
}

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Exported conversations.json
    #[arg(default_value = "./conversations.json")]
    export: String,

    #[arg(short = 'v')]
    verbose: bool,

    /// Print every message preview with its token count before the summary
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// o200k, cl100k or estimate
    #[arg(short = 't', long = "tokenizer")]
    tokenizer: Option<String>,

    /// latest-leaf or last-in-mapping
    #[arg(short = 's', long = "start-node")]
    start_node: Option<String>,

    /// JSON pricing table replacing the built-in one
    #[arg(short = 'p', long = "pricing")]
    pricing: Option<String>,

    #[arg(short = 'i', long = "interactive")]
    interactive: bool,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct UsageConfig {
    #[serde(default)]
    tokenizer: Option<String>,
    #[serde(default)]
    start_node: Option<String>,
    #[serde(default)]
    pricing_file: Option<String>,
}

fn get_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(CONFIG_PATH).as_ref())
}

fn load_config() -> Result<UsageConfig> {
    let config_path = get_config_path();

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        let config: UsageConfig = serde_json::from_str(&content)?;
        Ok(config)
    } else {
        Ok(UsageConfig::default())
    }
}

fn save_config(config: &UsageConfig) -> Result<()> {
    let config_path = get_config_path();
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, content)?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();
}

struct Settings {
    tokenizer: TokenizerKind,
    start_rule: StartNodeRule,
    pricing: PricingProvider,
}

/// A bad flag is fatal. A bad saved value is reported and replaced by the
/// default so a stale config never blocks a run.
fn resolve_settings(config: &UsageConfig, args: &Args) -> Result<Settings> {
    let tokenizer = resolve(
        args.tokenizer.as_deref(),
        config.tokenizer.as_deref(),
        "tokenizer",
        str::parse::<TokenizerKind>,
    )?;
    let start_rule = resolve(
        args.start_node.as_deref(),
        config.start_node.as_deref(),
        "start node",
        str::parse::<StartNodeRule>,
    )?;
    let pricing = resolve(
        args.pricing.as_deref(),
        config.pricing_file.as_deref(),
        "pricing file",
        |path| PricingProvider::from_file(PathBuf::from(shellexpand::tilde(path).as_ref())),
    )?;

    Ok(Settings {
        tokenizer,
        start_rule,
        pricing,
    })
}

fn resolve<T, F>(explicit: Option<&str>, saved: Option<&str>, setting: &str, parse: F) -> Result<T>
where
    T: Default,
    F: Fn(&str) -> Result<T>,
{
    if let Some(value) = explicit {
        return parse(value).with_context(|| format!("Invalid {} setting", setting));
    }
    match saved.map(parse).transpose() {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(e) => {
            warn!(error = %e, "Ignoring saved {} setting, using default", setting);
            Ok(T::default())
        }
    }
}

pub struct AppState {
    pub analyzer: UsageAnalyzer,
    pub export_path: PathBuf,
    pub tokenizer: TokenizerKind,
    pub month_keys: Vec<MonthKey>,
    pub estimates: Vec<CostEstimate>,
    pub selected_month: usize,
    pub selected_model: usize,
    pub active_popup: Option<PopupType>,
}

impl AppState {
    fn new(analyzer: UsageAnalyzer, export_path: PathBuf, tokenizer: TokenizerKind) -> Self {
        let month_keys = analyzer.months().keys().copied().collect();
        let estimates = analyzer.cost_estimates();
        Self {
            analyzer,
            export_path,
            tokenizer,
            month_keys,
            estimates,
            selected_month: 0,
            selected_model: 0,
            active_popup: None,
        }
    }

    pub fn selected_month_key(&self) -> Option<&MonthKey> {
        self.month_keys.get(self.selected_month)
    }

    pub fn selected_month_usage(&self) -> Option<&MonthlyUsage> {
        self.selected_month_key()
            .and_then(|key| self.analyzer.month(key))
    }

    pub fn start_rule(&self) -> StartNodeRule {
        self.analyzer.linearizer().start_rule()
    }

    pub fn selected_estimate(&self) -> Option<&CostEstimate> {
        self.estimates.get(self.selected_model)
    }

    pub fn selected_pricing(&self) -> Option<(&str, &ModelPricing)> {
        self.analyzer
            .pricing_provider()
            .models()
            .nth(self.selected_model)
    }

    /// Cost of the selected month under the selected pricing model.
    pub fn selected_month_cost(&self) -> Option<f64> {
        let (model, _) = self.selected_pricing()?;
        let usage = self.selected_month_usage()?;
        self.analyzer
            .pricing_provider()
            .calculate_cost(model, usage.input_tokens(), usage.output_tokens())
    }

    fn select_next_month(&mut self) {
        if self.selected_month + 1 < self.month_keys.len() {
            self.selected_month += 1;
        }
    }

    fn select_previous_month(&mut self) {
        self.selected_month = self.selected_month.saturating_sub(1);
    }

    fn cycle_model(&mut self, forward: bool) {
        let count = self.estimates.len();
        if count == 0 {
            return;
        }
        self.selected_model = if forward {
            (self.selected_model + 1) % count
        } else {
            (self.selected_model + count - 1) % count
        };
    }

    fn toggle_popup(&mut self, popup: PopupType) {
        self.active_popup = if self.active_popup.as_ref() == Some(&popup) {
            None
        } else {
            Some(popup)
        };
    }
}

pub struct App {
    state: AppState,
    exit: bool,
}

impl App {
    pub fn new(analyzer: UsageAnalyzer, export_path: PathBuf, tokenizer: TokenizerKind) -> Self {
        Self {
            state: AppState::new(analyzer, export_path, tokenizer),
            exit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.exit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_event(event::read()?);
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(9),
                Constraint::Length(1),
            ])
            .split(area);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        HeaderWidget::render(frame, chunks[0], &self.state);
        MonthsWidget::render(frame, chunks[1], &self.state);
        StatisticsWidget::render(frame, panels[0], &self.state);
        CostWidget::render(frame, panels[1], &self.state);
        ShortcutsWidget::render(frame, chunks[3], &self.state);

        if let Some(PopupType::Conversations) = &self.state.active_popup {
            PopupWidget::render(frame, area, &self.state);
        }
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key_event) = event {
            if key_event.kind == KeyEventKind::Press {
                match key_event.code {
                    KeyCode::Char('q') => self.exit = true,
                    KeyCode::Esc => {
                        if self.state.active_popup.is_some() {
                            self.state.active_popup = None;
                        } else {
                            self.exit = true;
                        }
                    }
                    KeyCode::Up | KeyCode::Char('k') => self.state.select_previous_month(),
                    KeyCode::Down | KeyCode::Char('j') => self.state.select_next_month(),
                    KeyCode::Left | KeyCode::Char('h') => self.state.cycle_model(false),
                    KeyCode::Right | KeyCode::Char('l') => self.state.cycle_model(true),
                    KeyCode::Char('c') => self.state.toggle_popup(PopupType::Conversations),
                    _ => {}
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config().unwrap_or_else(|e| {
        warn!(error = %e, "Could not read config, using defaults");
        UsageConfig::default()
    });

    // Values given on the command line win and are remembered for next time
    let settings = resolve_settings(&config, &args)?;
    let explicit = args.tokenizer.is_some() || args.start_node.is_some() || args.pricing.is_some();
    if explicit {
        if let Some(tokenizer) = &args.tokenizer {
            config.tokenizer = Some(tokenizer.clone());
        }
        if let Some(start_node) = &args.start_node {
            config.start_node = Some(start_node.clone());
        }
        if let Some(pricing) = &args.pricing {
            config.pricing_file = Some(pricing.clone());
        }
        if let Err(e) = save_config(&config) {
            warn!(error = %e, "Could not save config");
        }
    }

    let Settings {
        tokenizer: tokenizer_kind,
        start_rule,
        pricing,
    } = settings;
    let tokenizer = tokenizer_kind.build()?;
    let mut analyzer = UsageAnalyzer::new(tokenizer, pricing)
        .with_linearizer(Linearizer::with_start_rule(start_rule));

    let export_path = PathBuf::from(shellexpand::tilde(&args.export).as_ref());
    let loaded = analyzer.load_export(&export_path)?;

    if args.interactive {
        let mut terminal = ratatui::init();
        let mut app = App::new(analyzer, export_path, tokenizer_kind);
        let result = app.run(&mut terminal);
        ratatui::restore();
        return result;
    }

    if args.debug {
        print!("{}", report::render_transcript(&analyzer));
    }
    print!("{}", report::render_report(&analyzer, &export_path, loaded));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_usage_estimator::{CharEstimateTokenizer, Conversation};
    use serde_json::json;

    fn state() -> AppState {
        let mut analyzer = UsageAnalyzer::new(
            Box::new(CharEstimateTokenizer::with_chars_per_token(1)),
            PricingProvider::new(),
        );
        let conversations: Vec<Conversation> = serde_json::from_value(json!([
            {"id": "a", "create_time": 1700000000.0, "current_node": "u",
             "mapping": {"u": {"message": {"author": {"role": "user"}, "content": "1234"}}}},
            {"id": "b", "create_time": 1706000000.0, "current_node": "u",
             "mapping": {"u": {"message": {"author": {"role": "user"}, "content": "12"}}}}
        ]))
        .unwrap();
        analyzer.ingest(&conversations);
        AppState::new(analyzer, PathBuf::from("conversations.json"), TokenizerKind::Estimate)
    }

    #[test]
    fn test_month_selection_is_clamped() {
        let mut state = state();
        assert_eq!(state.selected_month_key().unwrap().to_string(), "2023-11");

        state.select_next_month();
        state.select_next_month();
        assert_eq!(state.selected_month_key().unwrap().to_string(), "2024-01");
        assert_eq!(state.selected_month_usage().unwrap().input_tokens(), 2);

        state.select_previous_month();
        state.select_previous_month();
        assert_eq!(state.selected_month, 0);
    }

    #[test]
    fn test_model_cycle_wraps() {
        let mut state = state();
        state.cycle_model(false);
        assert_eq!(state.selected_estimate().unwrap().model(), "google_gemini_3_pro_preview");
        state.cycle_model(true);
        assert_eq!(state.selected_pricing().unwrap().0, "openai_gpt_5_2");
    }

    #[test]
    fn test_popup_toggles() {
        let mut state = state();
        state.toggle_popup(PopupType::Conversations);
        assert_eq!(state.active_popup, Some(PopupType::Conversations));
        state.toggle_popup(PopupType::Conversations);
        assert!(state.active_popup.is_none());
    }

    #[test]
    fn test_start_rule_comes_from_linearizer() {
        let state = state();
        assert_eq!(state.start_rule(), StartNodeRule::LatestLeaf);

        let analyzer = UsageAnalyzer::new(Box::new(CharEstimateTokenizer::new()), PricingProvider::new())
            .with_linearizer(Linearizer::with_start_rule(StartNodeRule::LastInMapping));
        let state = AppState::new(analyzer, PathBuf::from("c.json"), TokenizerKind::Estimate);
        assert_eq!(state.start_rule().name(), "last-in-mapping");
    }

    #[test]
    fn test_bad_saved_tokenizer_falls_back() {
        let config = UsageConfig {
            tokenizer: Some("gpt2".to_string()),
            start_node: Some("last-in-mapping".to_string()),
            ..Default::default()
        };
        let args = Args::parse_from(["chat-usage"]);

        let settings = resolve_settings(&config, &args).unwrap();
        assert_eq!(settings.tokenizer, TokenizerKind::default());
        assert_eq!(settings.start_rule, StartNodeRule::LastInMapping);
    }

    #[test]
    fn test_missing_saved_pricing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = UsageConfig {
            pricing_file: Some(dir.path().join("gone.json").display().to_string()),
            ..Default::default()
        };
        let args = Args::parse_from(["chat-usage", "-t", "estimate"]);

        let settings = resolve_settings(&config, &args).unwrap();
        assert_eq!(settings.tokenizer, TokenizerKind::Estimate);
        assert_eq!(
            settings.pricing.supported_models(),
            PricingProvider::new().supported_models()
        );
    }

    #[test]
    fn test_bad_flags_are_fatal() {
        let config = UsageConfig::default();

        let args = Args::parse_from(["chat-usage", "-t", "gpt2"]);
        let err = resolve_settings(&config, &args).err().unwrap();
        assert!(err.to_string().contains("Invalid tokenizer setting"));

        let args = Args::parse_from(["chat-usage", "-s", "first"]);
        assert!(resolve_settings(&config, &args).is_err());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.json").display().to_string();
        let args = Args::parse_from(["chat-usage", "-p", missing.as_str()]);
        assert!(resolve_settings(&config, &args).is_err());
    }

    #[test]
    fn test_flag_overrides_bad_saved_value() {
        let config = UsageConfig {
            tokenizer: Some("gpt2".to_string()),
            ..Default::default()
        };
        let args = Args::parse_from(["chat-usage", "--tokenizer", "cl100k"]);
        let settings = resolve_settings(&config, &args).unwrap();
        assert_eq!(settings.tokenizer, TokenizerKind::Cl100k);
    }

    #[test]
    fn test_config_round_trip_defaults() {
        let config: UsageConfig = serde_json::from_str(r#"{"tokenizer": "estimate"}"#).unwrap();
        assert_eq!(config.tokenizer.as_deref(), Some("estimate"));
        assert!(config.pricing_file.is_none());
    }
}
