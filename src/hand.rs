//! Hand scoring under the usable-ace rule, plus the category used to key
//! strategy statistics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cards::{format_cards, Card};
use crate::error::{SimError, SimResult};

pub const BLACKJACK: u8 = 21;

/// Aggregation key describing the shape of a hand. Not a legality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandCategory {
    Hard,
    Soft,
    Splittable,
}

pub const ALL_CATEGORIES: [HandCategory; 3] =
    [HandCategory::Hard, HandCategory::Soft, HandCategory::Splittable];

impl HandCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            HandCategory::Hard => "hard",
            HandCategory::Soft => "soft",
            HandCategory::Splittable => "splittable",
        }
    }

}

impl FromStr for HandCategory {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<HandCategory> {
        match s {
            "hard" => Ok(HandCategory::Hard),
            "soft" => Ok(HandCategory::Soft),
            "splittable" => Ok(HandCategory::Splittable),
            _ => Err(SimError::UnknownLabel(s.to_string())),
        }
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand { cards: Vec::new() }
    }

    pub fn from_cards(cards: &[Card]) -> Hand {
        Hand { cards: cards.to_vec() }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn has_ace(&self) -> bool {
        self.cards.iter().any(Card::is_ace)
    }

    /// Every Ace counts 1.
    pub fn hard_total(&self) -> u8 {
        self.cards.iter().map(Card::points).sum()
    }

    /// Hard total, plus 10 when one Ace can count 11 without busting.
    pub fn soft_total(&self) -> u8 {
        let hard = self.hard_total();
        if self.has_ace() && hard + 10 <= BLACKJACK {
            hard + 10
        } else {
            hard
        }
    }

    pub fn is_soft(&self) -> bool {
        self.soft_total() != self.hard_total()
    }

    pub fn is_bust(&self) -> bool {
        self.soft_total() > BLACKJACK
    }

    /// Two cards of the same rank (a King and a Queen are not a pair).
    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank == self.cards[1].rank
    }

    /// Two-card 21.
    pub fn is_two_card_21(&self) -> bool {
        self.cards.len() == 2 && self.soft_total() == BLACKJACK
    }

    pub fn category(&self) -> HandCategory {
        if self.is_pair() {
            HandCategory::Splittable
        } else if self.has_ace() && self.hard_total() <= 11 {
            HandCategory::Soft
        } else {
            HandCategory::Hard
        }
    }

    /// Score as a player would read it, e.g. `"7/17"` for a soft hand.
    pub fn score_label(&self) -> String {
        if self.is_soft() {
            format!("{}/{}", self.hard_total(), self.soft_total())
        } else {
            self.soft_total().to_string()
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", format_cards(&self.cards), self.score_label())
    }
}
