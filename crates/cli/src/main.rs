use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{cursor::MoveTo, execute, terminal::Clear, terminal::ClearType};
use env_logger::Env;
use log::debug;

use pnl_monitor_cli::commands::{self, Command, ParseError, HELP};
use pnl_monitor_cli::events::{Event, EventSource};
use pnl_monitor_cli::render::{render_json, render_table, RenderOptions};
use pnl_monitor_core::models::settings::{PriceStrategy, Settings};
use pnl_monitor_core::models::snapshot::RenderState;
use pnl_monitor_core::PnlMonitor;

#[derive(Parser, Debug)]
#[command(name = "pnl-monitor", author, version, about)]
struct Cli {
    /// Settings file (default: ./pnl-monitor.json, then ./config/pnl-monitor.json)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Render a single pass and exit
    #[arg(long)]
    once: bool,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Seconds between automatic refreshes (overrides the settings file)
    #[arg(long)]
    interval: Option<u64>,

    /// How prices are fetched (overrides the settings file)
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Disable red/green profit coloring
    #[arg(long)]
    no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Table,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Batch,
    PerTicker,
}

impl From<StrategyArg> for PriceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Batch => PriceStrategy::Batch,
            StrategyArg::PerTicker => PriceStrategy::PerTicker,
        }
    }
}

const KEY_HINTS: &str = "[r] refresh  [set TICKER QTY COST] edit  [h] help  [q] quit";

/// Where and how a render pass is written.
struct Output {
    format: Format,
    options: RenderOptions,
    interactive: bool,
}

impl Output {
    fn show(&self, state: &RenderState) -> Result<()> {
        let mut stdout = std::io::stdout();
        match self.format {
            Format::Json => {
                let json = render_json(state).context("failed to serialize render state")?;
                writeln!(stdout, "{json}")?;
            }
            Format::Table => {
                if self.interactive && stdout.is_terminal() {
                    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
                }
                write!(stdout, "{}", render_table(state, &self.options))?;
                if self.interactive {
                    writeln!(stdout)?;
                    writeln!(stdout, "{KEY_HINTS}")?;
                }
            }
        }
        stdout.flush()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(strategy) = cli.strategy {
        settings.prices.strategy = strategy.into();
    }
    if let Some(interval) = cli.interval {
        settings.refresh_interval_secs = interval;
    }
    let refresh_every = Duration::from_secs(settings.refresh_interval_secs);

    let mut monitor = PnlMonitor::new(settings).context("invalid configuration")?;
    debug!("{monitor:?}");

    let output = Output {
        format: cli.format,
        options: RenderOptions {
            colored: !cli.no_color,
        },
        interactive: !cli.once,
    };

    output.show(&monitor.render_pass().await)?;
    if cli.once {
        return Ok(());
    }

    let mut events = EventSource::new(refresh_every, tokio::io::stdin(), tokio::signal::ctrl_c());
    loop {
        match events.next().await.context("failed to read stdin")? {
            Event::Tick => output.show(&monitor.render_pass().await)?,
            Event::Line(line) => {
                if !handle_line(&mut monitor, &output, &line).await? {
                    break;
                }
            }
            Event::Shutdown => break,
        }
    }

    Ok(())
}

/// Run one typed command. Returns `false` when the user asked to quit.
async fn handle_line(monitor: &mut PnlMonitor, output: &Output, line: &str) -> Result<bool> {
    match commands::parse(line) {
        Ok(Command::Refresh) => {
            output.show(&monitor.force_refresh().await)?;
        }
        Ok(Command::Set {
            ticker,
            quantity,
            cost,
        }) => match monitor.set_holding(&ticker, quantity, cost) {
            Ok(()) => output.show(&monitor.render_pass().await)?,
            Err(e) => eprintln!("{e}"),
        },
        Ok(Command::Help) => println!("{HELP}"),
        Ok(Command::Quit) => return Ok(false),
        Err(ParseError::Empty) => {}
        Err(e) => eprintln!("{e}"),
    }
    Ok(true)
}
