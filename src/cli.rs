//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::decision_log_csv::DecisionLogCsv;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReport;
use crate::domain::backtest::{RunResult, run_strategy};
use crate::domain::batch::{CancelToken, RunUnit, UnitOutcome, run_batch};
use crate::domain::config_validation::{
    parse_signal_set, read_bool, read_f64, read_list, read_usize, validate_data_config,
    validate_strategy,
};
use crate::domain::error::SignalError;
use crate::domain::monitor::{self, MonitorRow};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{
    BollingerParams, CompositeConfig, DualThrustParams, KdjParams, MaParams, MacdParams,
    MemberParams, RsiParams, SignalStrategy, StrategyConfig, TurtleParams,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigfusion", about = "Rule-based trading signals and composite signal fusion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configured strategy over one symbol
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
    },
    /// Run every base strategy and the composite over one symbol
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
    },
    /// Classify the latest signal of each strategy across the monitored codes
    Scan {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration and print the resolved rules
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

pub fn execute(command: Command) -> Result<(), SignalError> {
    match command {
        Command::Run {
            config,
            code,
            output,
            format,
        } => run_single(&config, &code, output.as_deref(), format),
        Command::Compare { config, code } => run_compare(&config, &code),
        Command::Scan { config } => run_scan(&config),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, code } => run_info(&config, &code),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SignalError> {
    FileConfigAdapter::from_file(path)
}

struct DataSettings {
    adapter: CsvAdapter,
    start: NaiveDate,
    end: NaiveDate,
}

fn data_settings(config: &dyn ConfigPort) -> Result<DataSettings, SignalError> {
    let (start, end) = validate_data_config(config)?;
    let dir = config.get_string("data", "dir").unwrap_or_default();
    Ok(DataSettings {
        adapter: CsvAdapter::new(PathBuf::from(dir.trim())),
        start,
        end,
    })
}

pub fn build_ma_params(config: &dyn ConfigPort) -> Result<MaParams, SignalError> {
    let d = MaParams::default();
    Ok(MaParams {
        fast: read_usize(config, "ma", "fast", d.fast)?,
        slow: read_usize(config, "ma", "slow", d.slow)?,
        volume_period: read_usize(config, "ma", "volume_period", d.volume_period)?,
        stop_loss: read_f64(config, "ma", "stop_loss", d.stop_loss)?,
        take_profit: read_f64(config, "ma", "take_profit", d.take_profit)?,
        use_rsi: read_bool(config, "ma", "use_rsi", d.use_rsi)?,
        rsi_period: read_usize(config, "ma", "rsi_period", d.rsi_period)?,
        rsi_low: read_f64(config, "ma", "rsi_low", d.rsi_low)?,
    })
}

/// Reads every base strategy's section, falling back to defaults per key.
pub fn build_member_params(config: &dyn ConfigPort) -> Result<MemberParams, SignalError> {
    let macd = MacdParams::default();
    let bollinger = BollingerParams::default();
    let rsi = RsiParams::default();
    let turtle = TurtleParams::default();
    let kdj = KdjParams::default();
    let dual_thrust = DualThrustParams::default();

    Ok(MemberParams {
        ma: build_ma_params(config)?,
        macd: MacdParams {
            fast: read_usize(config, "macd", "fast", macd.fast)?,
            slow: read_usize(config, "macd", "slow", macd.slow)?,
            signal: read_usize(config, "macd", "signal", macd.signal)?,
        },
        bollinger: BollingerParams {
            period: read_usize(config, "bollinger", "period", bollinger.period)?,
            devfactor: read_f64(config, "bollinger", "devfactor", bollinger.devfactor)?,
        },
        rsi: RsiParams {
            period: read_usize(config, "rsi", "period", rsi.period)?,
            low: read_f64(config, "rsi", "low", rsi.low)?,
            high: read_f64(config, "rsi", "high", rsi.high)?,
        },
        turtle: TurtleParams {
            entry_period: read_usize(config, "turtle", "entry_period", turtle.entry_period)?,
            exit_period: read_usize(config, "turtle", "exit_period", turtle.exit_period)?,
            trailing_stop_pct: read_f64(
                config,
                "turtle",
                "trailing_stop_pct",
                turtle.trailing_stop_pct,
            )?,
        },
        kdj: KdjParams {
            period: read_usize(config, "kdj", "period", kdj.period)?,
            dfast: read_usize(config, "kdj", "dfast", kdj.dfast)?,
            dslow: read_usize(config, "kdj", "dslow", kdj.dslow)?,
        },
        dual_thrust: DualThrustParams {
            period: read_usize(config, "dual_thrust", "period", dual_thrust.period)?,
            k1: read_f64(config, "dual_thrust", "k1", dual_thrust.k1)?,
            k2: read_f64(config, "dual_thrust", "k2", dual_thrust.k2)?,
        },
    })
}

pub fn build_composite_config(
    config: &dyn ConfigPort,
    members: MemberParams,
) -> Result<CompositeConfig, SignalError> {
    let d = CompositeConfig::default();
    let enabled: BTreeSet<StrategyId> = match config.get_string("composite", "signals") {
        Some(_) => parse_signal_set(&read_list(config, "composite", "signals"))?
            .into_iter()
            .collect(),
        None => d.enabled,
    };
    Ok(CompositeConfig {
        enabled,
        use_trend_filter: read_bool(config, "composite", "use_trend_filter", d.use_trend_filter)?,
        trend_period: read_usize(config, "composite", "trend_period", d.trend_period)?,
        use_volume_filter: read_bool(config, "composite", "use_volume_filter", d.use_volume_filter)?,
        volume_period: read_usize(config, "composite", "volume_period", d.volume_period)?,
        members,
    })
}

fn config_for_id(
    id: StrategyId,
    members: &MemberParams,
    composite: &CompositeConfig,
) -> StrategyConfig {
    members
        .config_for(id)
        .unwrap_or_else(|| StrategyConfig::Composite(composite.clone()))
}

/// Resolves `[strategy] kind` and its parameter section into a validated config.
/// Reads `[strategy] kind` and its sections into a checked configuration.
pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, SignalError> {
    let strategy = read_strategy_config(config)?;
    validate_strategy(&strategy)?;
    Ok(strategy)
}

/// Reads the configured strategy and constructs it.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<Box<dyn SignalStrategy>, SignalError> {
    read_strategy_config(config)?.build()
}

fn read_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, SignalError> {
    let kind = config
        .get_string("strategy", "kind")
        .ok_or_else(|| SignalError::ConfigMissing {
            section: "strategy".to_string(),
            key: "kind".to_string(),
        })?;
    let id: StrategyId = kind.parse()?;

    let members = build_member_params(config)?;
    let composite = build_composite_config(config, members.clone())?;
    Ok(config_for_id(id, &members, &composite))
}

struct MonitorSettings {
    codes: Vec<String>,
    configs: Vec<StrategyConfig>,
    recent_bars: usize,
}

const DEFAULT_MONITOR_STRATEGIES: [StrategyId; 3] =
    [StrategyId::Kdj, StrategyId::Rsi, StrategyId::Macd];

fn monitor_settings(config: &dyn ConfigPort) -> Result<MonitorSettings, SignalError> {
    let mut codes = Vec::new();
    for code in read_list(config, "monitor", "codes") {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    if codes.is_empty() {
        return Err(SignalError::ConfigMissing {
            section: "monitor".to_string(),
            key: "codes".to_string(),
        });
    }

    let names = read_list(config, "monitor", "strategies");
    let ids: Vec<StrategyId> = if names.is_empty() {
        DEFAULT_MONITOR_STRATEGIES.to_vec()
    } else {
        names
            .iter()
            .map(|n| n.parse::<StrategyId>())
            .collect::<Result<_, _>>()?
    };

    let members = build_member_params(config)?;
    let composite = build_composite_config(config, members.clone())?;
    let configs: Vec<StrategyConfig> = ids
        .into_iter()
        .map(|id| config_for_id(id, &members, &composite))
        .collect();
    for c in &configs {
        validate_strategy(c)?;
    }

    Ok(MonitorSettings {
        codes,
        configs,
        recent_bars: read_usize(config, "monitor", "recent_bars", 3)?,
    })
}

fn fetch_bars(data: &DataSettings, code: &str) -> Result<Vec<OhlcvBar>, SignalError> {
    let bars = data.adapter.fetch_ohlcv(code, data.start, data.end)?;
    if bars.is_empty() {
        return Err(SignalError::NoData {
            code: code.to_string(),
        });
    }
    Ok(bars)
}

fn run_single(
    config_path: &Path,
    code: &str,
    output: Option<&Path>,
    format: ReportFormat,
) -> Result<(), SignalError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    let data = data_settings(&config)?;
    let strategy = build_strategy(&config)?;

    let bars = fetch_bars(&data, code)?;
    eprintln!(
        "Running {} on {}: {} bars, {} to {}",
        strategy.id(),
        code,
        bars.len(),
        data.start,
        data.end
    );
    let result = run_strategy(strategy.as_ref(), &bars)?;
    print_run(code, &result);

    if let Some(path) = output {
        let writer: Box<dyn ReportPort> = match format {
            ReportFormat::Csv => Box::new(DecisionLogCsv::new()),
            ReportFormat::Json => Box::new(JsonReport::new()),
        };
        writer.write(&result, &path.to_string_lossy())?;
        eprintln!("\nDecision log written to: {}", path.display());
    }

    match result.shortfall {
        Some(shortfall) => Err(SignalError::InsufficientData {
            code: code.to_string(),
            bars: shortfall.bars,
            minimum: shortfall.required,
        }),
        None => Ok(()),
    }
}

fn print_run(code: &str, result: &RunResult) {
    println!("{:<12} {:>6} {:<11} {:>10}  reason", "date", "bar", "action", "price");
    for record in &result.log {
        println!(
            "{:<12} {:>6} {:<11} {:>10.3}  {}",
            record.date.to_string(),
            record.bar_index,
            record.action.to_string(),
            record.price,
            record.reason
        );
    }

    eprintln!("\n=== {} / {} ===", code, result.strategy_id);
    eprintln!("Decisions:        {}", result.log.len());
    eprintln!("Round trips:      {}", result.log.round_trips().len());
    match result.open_position() {
        Some(open) => eprintln!(
            "Final position:   LONG since {} @ {:.3} (high {:.3})",
            open.entry_date, open.entry_price, open.high_water_mark
        ),
        None => eprintln!("Final position:   {}", result.final_state.side),
    }
}

struct CompareRow {
    strategy: String,
    trips: usize,
    wins: usize,
    total_return_pct: f64,
    open: bool,
}

fn compare_row(strategy: &str, result: &RunResult) -> CompareRow {
    let trips = result.log.round_trips();
    let growth = trips
        .iter()
        .fold(1.0, |acc, t| acc * (1.0 + t.return_pct / 100.0));
    CompareRow {
        strategy: strategy.to_string(),
        trips: trips.len(),
        wins: trips.iter().filter(|t| t.return_pct > 0.0).count(),
        total_return_pct: (growth - 1.0) * 100.0,
        open: result.final_state.is_long(),
    }
}

fn run_compare(config_path: &Path, code: &str) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    let data = data_settings(&config)?;
    let members = build_member_params(&config)?;
    let composite = build_composite_config(&config, members.clone())?;

    let bars = Arc::new(fetch_bars(&data, code)?);
    let units: Vec<RunUnit> = StrategyId::BASE
        .iter()
        .map(|&id| config_for_id(id, &members, &composite))
        .chain(std::iter::once(StrategyConfig::Composite(composite.clone())))
        .map(|config| RunUnit {
            code: code.to_string(),
            bars: Arc::clone(&bars),
            config,
        })
        .collect();

    eprintln!("Comparing {} strategies on {} ({} bars)", units.len(), code, bars.len());
    let mut rows = Vec::new();
    for report in run_batch(&units, &CancelToken::new()) {
        match &report.outcome {
            UnitOutcome::Completed(result) => rows.push(compare_row(&report.strategy, result)),
            UnitOutcome::Failed(e) => eprintln!("warning: {} failed: {}", report.strategy, e),
            UnitOutcome::Cancelled => eprintln!("warning: {} cancelled", report.strategy),
        }
    }
    rows.sort_by(|a, b| b.total_return_pct.total_cmp(&a.total_return_pct));

    println!("{}", "-".repeat(56));
    println!(
        "{:<12} | {:>6} | {:>6} | {:>10} | {:>6}",
        "Strategy", "Trades", "Wins", "Return", "Open"
    );
    println!("{}", "-".repeat(56));
    for row in &rows {
        println!(
            "{:<12} | {:>6} | {:>6} | {:>9.2}% | {:>6}",
            row.strategy,
            row.trips,
            row.wins,
            row.total_return_pct,
            if row.open { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn run_scan(config_path: &Path) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    let data = data_settings(&config)?;
    let settings = monitor_settings(&config)?;

    eprintln!(
        "Scanning {} codes x {} strategies",
        settings.codes.len(),
        settings.configs.len()
    );
    let rows = monitor::scan(
        &data.adapter,
        &settings.codes,
        &settings.configs,
        data.start,
        data.end,
        settings.recent_bars,
        &CancelToken::new(),
    );
    print_scan(&settings.configs, &rows);
    Ok(())
}

fn print_scan(configs: &[StrategyConfig], rows: &[MonitorRow]) {
    let mut header = format!("{:<10} {:>10}", "code", "close");
    for c in configs {
        header.push_str(&format!(" {:>11}", c.id().as_str()));
    }
    header.push_str(&format!(" {:>6}", "score"));
    println!("{}", header);

    for row in rows {
        let close = row
            .last_close
            .map(|c| format!("{:.3}", c))
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!("{:<10} {:>10}", row.code, close);
        for c in configs {
            let cell = row
                .cells
                .iter()
                .find(|(id, _)| *id == c.id())
                .map(|(_, cell)| cell.to_string())
                .unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {:>11}", cell));
        }
        line.push_str(&format!(" {:>6}", row.score()));
        println!("{}", line);

        for (id, cell) in &row.cells {
            if let monitor::MonitorCell::Error(reason) = cell {
                eprintln!("warning: {} {}: {}", row.code, id, reason);
            }
        }
    }
}

fn run_validate(config_path: &Path) -> Result<(), SignalError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let strategy = build_strategy(&config)?;

    eprintln!("\nStrategy: {}", strategy.id());
    for line in strategy.describe() {
        eprintln!("  {}", line);
    }
    eprintln!("\nIndicators:");
    for indicator in strategy.indicators() {
        eprintln!("  {}", indicator);
    }
    eprintln!("Warm-up: {} bars", strategy.required_bars());

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    let data = data_settings(&config)?;
    let symbols = data.adapter.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_info(config_path: &Path, code: &str) -> Result<(), SignalError> {
    let config = load_config(config_path)?;
    let data = data_settings(&config)?;
    match data.adapter.get_data_range(code)? {
        Some((first, last, count)) => println!("{}: {} bars, {} to {}", code, count, first, last),
        None => eprintln!("{}: no data found", code),
    }
    Ok(())
}
