//! Dealer play-out and per-box settlement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::Shoe;
use crate::error::SimResult;
use crate::game::PlayerBox;
use crate::hand::{Hand, BLACKJACK};
use crate::rules::{TableRules, DEALER_STAND_TOTAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Push,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Loss => write!(f, "loss"),
            Outcome::Push => write!(f, "push"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub outcome: Outcome,
    pub payout: f64,
}

/// Whether the dealer takes another card under `rules`.
pub fn dealer_draws(dealer: &Hand, rules: &TableRules) -> bool {
    let total = dealer.soft_total();
    total < DEALER_STAND_TOTAL
        || (rules.dealer_hits_soft_17 && total == DEALER_STAND_TOTAL && dealer.is_soft())
}

/// Dealer draws while its soft-adjusted total is below 17, and on a soft 17
/// when the table says so.
pub fn play_dealer(dealer: &mut Hand, shoe: &mut Shoe, rules: &TableRules) -> SimResult<()> {
    while dealer_draws(dealer, rules) {
        dealer.push(shoe.draw()?);
    }
    Ok(())
}

/// Untouched two-card 21. Split-derived boxes qualify only when the rules
/// allow it.
pub fn is_natural(player: &PlayerBox, rules: &TableRules) -> bool {
    player.hand.is_two_card_21() && !player.doubled && (!player.from_split || rules.split_naturals)
}

/// Settle one box against the finished dealer hand.
pub fn settle(player: &PlayerBox, dealer: &Hand, rules: &TableRules) -> Settlement {
    let stake = player.stake as f64;
    let p = player.hand.soft_total();
    let d = dealer.soft_total();

    let win = || Settlement {
        outcome: Outcome::Win,
        payout: if is_natural(player, rules) {
            stake * rules.natural_payout
        } else {
            stake
        },
    };
    let loss = Settlement {
        outcome: Outcome::Loss,
        payout: -stake,
    };

    if p > BLACKJACK {
        loss
    } else if d > BLACKJACK {
        win()
    } else if p == d {
        Settlement {
            outcome: Outcome::Push,
            payout: 0.0,
        }
    } else if p > d {
        win()
    } else {
        loss
    }
}
