use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analytics::Valuation;
use super::rate::ExchangeRate;

/// Everything the renderer needs from one completed pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rate: ExchangeRate,
    pub valuation: Valuation,
    pub as_of: DateTime<Utc>,
}

/// What a render pass produced.
///
/// `Waiting` means the portfolio has holdings but not a single quote
/// resolved, so there is nothing meaningful to tabulate yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderState {
    Waiting {
        rate: ExchangeRate,
        as_of: DateTime<Utc>,
        missing: Vec<String>,
    },
    Ready(Snapshot),
}

impl RenderState {
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        matches!(self, RenderState::Waiting { .. })
    }

    #[must_use]
    pub fn rate(&self) -> &ExchangeRate {
        match self {
            RenderState::Waiting { rate, .. } => rate,
            RenderState::Ready(snapshot) => &snapshot.rate,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            RenderState::Waiting { .. } => None,
            RenderState::Ready(snapshot) => Some(snapshot),
        }
    }
}
