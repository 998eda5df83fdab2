use chrono::{DateTime, Utc};
use crossterm::style::Stylize;
use pnl_monitor_core::models::analytics::{PortfolioSummary, PositionResult};
use pnl_monitor_core::models::rate::{ExchangeRate, RateSource};
use pnl_monitor_core::models::snapshot::{RenderState, Snapshot};

/// Presentation switches for the terminal table.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Color profit cells red (loss) or green (gain).
    pub colored: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { colored: true }
    }
}

const WAITING_MESSAGE: &str = "Waiting for market data to refresh...";

/// Render one pass as a plain-text dashboard.
pub fn render_table(state: &RenderState, options: &RenderOptions) -> String {
    let mut lines = match state {
        RenderState::Waiting {
            rate,
            as_of,
            missing,
        } => {
            let mut lines = vec![
                header(rate, as_of),
                rate_line(rate),
                String::new(),
                WAITING_MESSAGE.to_string(),
            ];
            lines.extend(skipped_lines(missing));
            lines
        }
        RenderState::Ready(snapshot) => ready(snapshot, options),
    };

    lines.push(String::new());
    lines.join("\n")
}

/// Render one pass as pretty-printed JSON.
pub fn render_json(state: &RenderState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

fn ready(snapshot: &Snapshot, options: &RenderOptions) -> Vec<String> {
    let rate = &snapshot.rate;
    let target = currency_symbol(&rate.quote);

    let mut lines = vec![header(rate, &snapshot.as_of)];
    lines.extend(summary_lines(&snapshot.valuation.summary, rate, options));
    lines.push(String::new());
    lines.push(format!(
        "{:<8} {:>12} {:>12} {:>10} {:>16} {:>16} {:>9}",
        "Ticker",
        "Price",
        "Qty",
        "Cost/sh",
        format!("Value ({target})"),
        format!("P/L ({target})"),
        "P/L %"
    ));
    lines.extend(
        snapshot
            .valuation
            .positions
            .iter()
            .map(|p| position_row(p, &rate.quote, options)),
    );
    lines.extend(skipped_lines(&snapshot.valuation.missing));
    lines
}

fn header(rate: &ExchangeRate, as_of: &DateTime<Utc>) -> String {
    format!(
        "Portfolio P&L ({} -> {})  as of {}",
        rate.base,
        rate.quote,
        as_of.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn summary_lines(
    summary: &PortfolioSummary,
    rate: &ExchangeRate,
    options: &RenderOptions,
) -> [String; 3] {
    let profit = format!(
        "{} ({})",
        format_money(summary.total_profit_target, &rate.quote),
        format_percent(summary.total_profit_percent)
    );
    [
        format!(
            "Total value:  {}",
            format_money(summary.total_value_target, &rate.quote)
        ),
        format!(
            "Total P/L:    {}",
            paint(&profit, summary.total_profit_target, options)
        ),
        rate_line(rate),
    ]
}

fn rate_line(rate: &ExchangeRate) -> String {
    let tag = match &rate.source {
        RateSource::Live { provider } => format!("live, {provider}"),
        RateSource::Fallback => "fallback".to_string(),
    };
    format!(
        "Rate:         1 {} = {:.4} {} ({tag})",
        rate.base, rate.rate, rate.quote
    )
}

/// One table row. Cells are padded before coloring so ANSI codes don't
/// throw off the column widths.
fn position_row(p: &PositionResult, target: &str, options: &RenderOptions) -> String {
    let value = format!("{:>16}", format_money(p.market_value_target, target));
    let profit = format!("{:>16}", format_money(p.profit_target, target));
    let percent = format!("{:>9}", format_percent(p.profit_percent));

    format!(
        "{:<8} {:>12.3} {:>12} {:>10.2} {} {} {}",
        p.ticker,
        p.current_price,
        group_thousands(p.quantity),
        p.cost_per_share,
        value,
        paint(&profit, p.profit_target, options),
        paint(&percent, p.profit_target, options)
    )
}

fn skipped_lines(missing: &[String]) -> Vec<String> {
    if missing.is_empty() {
        return Vec::new();
    }
    vec![
        String::new(),
        format!("Skipped (no price): {}", missing.join(", ")),
    ]
}

/// Red for a loss, green otherwise.
pub fn paint(text: &str, amount: f64, options: &RenderOptions) -> String {
    if !options.colored {
        return text.to_string();
    }
    if amount < 0.0 {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

/// Display symbol for a currency code; unknown codes are shown as-is.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" => "$",
        "CNY" | "JPY" => "¥",
        "EUR" => "€",
        "GBP" => "£",
        other => other,
    }
}

/// `-¥1,234.56` style amount with two decimals.
pub fn format_money(amount: f64, currency: &str) -> String {
    let sign = if shows_negative(amount) { "-" } else { "" };
    format!(
        "{sign}{}{}",
        currency_symbol(currency),
        group_thousands(amount.abs())
    )
}

/// Signed percentage with two decimals, e.g. `+12.50%`.
pub fn format_percent(pct: f64) -> String {
    format!("{pct:+.2}%")
}

/// Two decimals with comma-separated thousands.
pub fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if shows_negative(value) { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

// Values that round to zero at two decimals print without a sign
fn shows_negative(value: f64) -> bool {
    (value * 100.0).round() < 0.0
}
