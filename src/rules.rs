use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Dealer stands once its soft-adjusted total reaches this value.
pub const DEALER_STAND_TOTAL: u8 = 17;

/// House rules applied to every simulated hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableRules {
    /// Maximum number of boxes a player may hold after splitting.
    pub max_boxes: usize,
    /// Payout multiple of the stake for a natural.
    pub natural_payout: f64,
    /// Whether a two-card 21 on a split-derived box counts as a natural.
    pub split_naturals: bool,
    /// Dealer draws on a soft 17 instead of standing.
    #[serde(default)]
    pub dealer_hits_soft_17: bool,
}

impl Default for TableRules {
    fn default() -> Self {
        TableRules {
            max_boxes: 4,
            natural_payout: 2.0,
            split_naturals: false,
            dealer_hits_soft_17: false,
        }
    }
}

impl TableRules {
    pub fn validate(&self) -> SimResult<()> {
        if self.max_boxes == 0 {
            return Err(SimError::InvalidConfig(
                "max boxes must be at least 1".to_string(),
            ));
        }
        if !self.natural_payout.is_finite() || self.natural_payout < 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "natural payout must be at least 1.0, got {}",
                self.natural_payout
            )));
        }
        Ok(())
    }
}
