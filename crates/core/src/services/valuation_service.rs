use crate::models::analytics::{PortfolioSummary, PositionResult, Valuation};
use crate::models::holding::PortfolioEntry;
use crate::models::price::Quotes;
use crate::models::rate::ExchangeRate;

/// Computes per-position and aggregate profit/loss.
///
/// Pure: the result depends only on the three inputs. Entries without a
/// price are left out of the positions and listed in `Valuation::missing`.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(
        &self,
        entries: &[PortfolioEntry],
        quotes: &Quotes,
        rate: &ExchangeRate,
    ) -> Valuation {
        let mut positions = Vec::with_capacity(entries.len());
        let mut missing = Vec::new();
        let mut total_cost = 0.0;
        let mut total_value = 0.0;

        for entry in entries {
            let Some(price) = quotes.price(&entry.ticker) else {
                missing.push(entry.ticker.clone());
                continue;
            };

            let cost = entry.cost_basis();
            let value = entry.quantity * price;
            let profit = value - cost;

            total_cost += cost;
            total_value += value;

            positions.push(PositionResult {
                ticker: entry.ticker.clone(),
                current_price: price,
                quantity: entry.quantity,
                cost_per_share: entry.cost_per_share,
                cost_source: cost,
                market_value_source: value,
                profit_source: profit,
                market_value_target: rate.convert(value),
                profit_target: rate.convert(profit),
                profit_percent: percent_of(profit, cost),
            });
        }

        // Profit from the sums, not a sum of per-position profits
        let total_profit = total_value - total_cost;

        Valuation {
            positions,
            summary: PortfolioSummary {
                total_cost_source: total_cost,
                total_value_source: total_value,
                total_profit_source: total_profit,
                total_value_target: rate.convert(total_value),
                total_profit_target: rate.convert(total_profit),
                total_profit_percent: percent_of(total_profit, total_cost),
            },
            missing,
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// `part / whole × 100`, or 0 when `whole` is zero.
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole != 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
