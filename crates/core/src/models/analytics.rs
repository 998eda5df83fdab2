use serde::{Deserialize, Serialize};

/// Valuation of one held position for the current render pass.
///
/// `*_source` figures are in the quote currency of the market (USD);
/// `*_target` figures are converted with the pass's exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionResult {
    pub ticker: String,

    /// Latest price per share in the source currency
    pub current_price: f64,

    pub quantity: f64,

    /// Cost per share in the source currency
    pub cost_per_share: f64,

    /// quantity × cost_per_share
    pub cost_source: f64,

    /// quantity × current_price
    pub market_value_source: f64,

    /// market_value_source − cost_source
    pub profit_source: f64,

    pub market_value_target: f64,

    pub profit_target: f64,

    /// profit_source / cost_source × 100, or 0 when the cost basis is zero
    pub profit_percent: f64,
}

/// Aggregate figures over every valued position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_cost_source: f64,

    pub total_value_source: f64,

    /// Computed from the two totals above, not summed per position
    pub total_profit_source: f64,

    pub total_value_target: f64,

    pub total_profit_target: f64,

    /// total_profit_source / total_cost_source × 100, or 0 when nothing was paid
    pub total_profit_percent: f64,
}

/// Output of one valuation: positions in entry order, their totals, and
/// the tickers skipped because no price was available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub positions: Vec<PositionResult>,
    pub summary: PortfolioSummary,
    pub missing: Vec<String>,
}

impl Valuation {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
