//! Game state and the action state machine.
//!
//! A [`GameState`] is treated as an immutable value: [`GameState::apply`]
//! returns the successor state and leaves `self` untouched, so the explorer
//! can branch the same position down every legal action.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, Shoe};
use crate::error::{SimError, SimResult};
use crate::hand::{Hand, HandCategory, BLACKJACK};
use crate::resolve::{play_dealer, settle, Outcome};
use crate::rules::TableRules;

// ---------------------------------------------------------------------------
// Actions and move sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Stand,
    Hit,
    Double,
    Split,
}

/// Actions in enumeration order. Stand comes first so it wins EV ties.
pub const ALL_ACTIONS: [Action; 4] = [Action::Stand, Action::Hit, Action::Double, Action::Split];

impl Action {
    pub fn mask(self) -> u8 {
        match self {
            Action::Stand => 0b0001,
            Action::Hit => 0b0010,
            Action::Double => 0b0100,
            Action::Split => 0b1000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Stand => "stand",
            Action::Hit => "hit",
            Action::Double => "double",
            Action::Split => "split",
        }
    }

}

impl FromStr for Action {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Action> {
        match s {
            "stand" => Ok(Action::Stand),
            "hit" => Ok(Action::Hit),
            "double" => Ok(Action::Double),
            "split" => Ok(Action::Split),
            _ => Err(SimError::UnknownLabel(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmask of legal actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MoveSet(u8);

impl MoveSet {
    pub const EMPTY: MoveSet = MoveSet(0);
    pub const ALL: MoveSet = MoveSet(0b1111);

    pub fn with(self, action: Action) -> MoveSet {
        MoveSet(self.0 | action.mask())
    }

    pub fn contains(self, action: Action) -> bool {
        self.0 & action.mask() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Action> {
        ALL_ACTIONS.into_iter().filter(move |a| self.contains(*a))
    }
}

impl FromIterator<Action> for MoveSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        iter.into_iter().fold(MoveSet::EMPTY, MoveSet::with)
    }
}

impl fmt::Display for MoveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Action::as_str).collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

// ---------------------------------------------------------------------------
// Player boxes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    Active,
    /// Stood, doubled, reached 21 or busted.
    Standing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBox {
    pub hand: Hand,
    /// Stake multiplier: 1 for a fresh box, 2 after doubling.
    pub stake: u32,
    pub state: BoxState,
    pub doubled: bool,
    pub from_split: bool,
    pub moves: MoveSet,
    pub outcome: Option<Outcome>,
    pub payout: Option<f64>,
}

impl PlayerBox {
    pub fn new(hand: Hand) -> PlayerBox {
        PlayerBox {
            hand,
            stake: 1,
            state: BoxState::Active,
            doubled: false,
            from_split: false,
            moves: MoveSet::EMPTY,
            outcome: None,
            payout: None,
        }
    }

    fn split_from(card: Card, drawn: Card) -> PlayerBox {
        let mut b = PlayerBox::new(Hand::from_cards(&[card, drawn]));
        b.from_split = true;
        b
    }

    pub fn score(&self) -> u8 {
        self.hand.soft_total()
    }

    pub fn category(&self) -> HandCategory {
        self.hand.category()
    }

    pub fn is_active(&self) -> bool {
        self.state == BoxState::Active
    }

    pub fn is_bust(&self) -> bool {
        self.hand.is_bust()
    }

    /// Legal moves for this box while `box_count` boxes are in play.
    pub fn legal_moves(&self, box_count: usize, rules: &TableRules) -> MoveSet {
        let mut moves = MoveSet::EMPTY.with(Action::Stand);
        if !self.is_active() {
            return moves;
        }
        moves = moves.with(Action::Hit);
        if self.hand.len() == 2 && self.hand.hard_total() < BLACKJACK {
            moves = moves.with(Action::Double);
        }
        if self.hand.is_pair() && box_count < rules.max_boxes {
            moves = moves.with(Action::Split);
        }
        moves
    }
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    shoe: Shoe,
    boxes: Vec<PlayerBox>,
    acting: usize,
    dealer: Hand,
    rules: TableRules,
}

impl GameState {
    /// Deal a new hand from `shoe`: two player cards, then two dealer cards.
    pub fn deal(mut shoe: Shoe, rules: TableRules) -> SimResult<GameState> {
        let p1 = shoe.draw()?;
        let p2 = shoe.draw()?;
        let d1 = shoe.draw()?;
        let d2 = shoe.draw()?;
        let mut gs = GameState {
            shoe,
            boxes: vec![PlayerBox::new(Hand::from_cards(&[p1, p2]))],
            acting: 0,
            dealer: Hand::from_cards(&[d1, d2]),
            rules,
        };
        gs.refresh_moves();
        Ok(gs)
    }

    /// Deal a new hand from a freshly shuffled shoe.
    pub fn new_hand<R: Rng + ?Sized>(rng: &mut R, rules: TableRules) -> SimResult<GameState> {
        GameState::deal(Shoe::shuffled(rng), rules)
    }

    pub fn boxes(&self) -> &[PlayerBox] {
        &self.boxes
    }

    pub fn acting_index(&self) -> usize {
        self.acting
    }

    pub fn acting_box(&self) -> Option<&PlayerBox> {
        self.boxes.get(self.acting)
    }

    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    pub fn up_card(&self) -> Card {
        self.dealer.cards()[0]
    }

    /// Point value of the dealer's up-card (Ace = 1, faces = 10).
    pub fn dealer_up_value(&self) -> u8 {
        self.up_card().points()
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn rules(&self) -> &TableRules {
        &self.rules
    }

    /// All boxes have been played and settled against the dealer.
    pub fn is_terminal(&self) -> bool {
        self.acting >= self.boxes.len()
    }

    pub fn legal_moves(&self) -> MoveSet {
        self.acting_box().map(|b| b.moves).unwrap_or(MoveSet::EMPTY)
    }

    /// Sum of per-box payouts, once the hand is terminal.
    pub fn total_payout(&self) -> Option<f64> {
        if !self.is_terminal() {
            return None;
        }
        self.boxes.iter().map(|b| b.payout).sum()
    }

    /// Apply `action` for the acting box, returning the successor state.
    pub fn apply(&self, action: Action) -> SimResult<GameState> {
        if self.is_terminal() {
            return Err(SimError::HandFinished);
        }
        let legal = self.legal_moves();
        if !legal.contains(action) {
            return Err(SimError::IllegalAction { action, legal });
        }
        let mut next = self.clone();
        next.step(action)?;
        Ok(next)
    }

    fn step(&mut self, action: Action) -> SimResult<()> {
        let idx = self.acting;
        match action {
            Action::Stand => {
                self.boxes[idx].state = BoxState::Standing;
            }
            Action::Hit => {
                let card = self.shoe.draw()?;
                let b = &mut self.boxes[idx];
                b.hand.push(card);
                if b.hand.soft_total() >= BLACKJACK {
                    b.state = BoxState::Standing;
                }
            }
            Action::Double => {
                let card = self.shoe.draw()?;
                let b = &mut self.boxes[idx];
                b.stake *= 2;
                b.doubled = true;
                b.hand.push(card);
                b.state = BoxState::Standing;
            }
            Action::Split => {
                let (first, second) = match self.boxes[idx].hand.cards() {
                    [a, b] => (*a, *b),
                    _ => {
                        return Err(SimError::IllegalAction {
                            action,
                            legal: self.boxes[idx].moves,
                        })
                    }
                };
                let left = PlayerBox::split_from(first, self.shoe.draw()?);
                let right = PlayerBox::split_from(second, self.shoe.draw()?);
                self.boxes[idx] = left;
                self.boxes.insert(idx + 1, right);
            }
        }

        if action != Action::Split && !self.boxes[idx].is_active() {
            self.acting += 1;
        }
        self.refresh_moves();

        if self.is_terminal() {
            self.finish()?;
        }
        Ok(())
    }

    fn refresh_moves(&mut self) {
        let count = self.boxes.len();
        let rules = self.rules;
        for b in &mut self.boxes {
            b.moves = b.legal_moves(count, &rules);
        }
    }

    /// Dealer plays out, then every box is settled.
    fn finish(&mut self) -> SimResult<()> {
        play_dealer(&mut self.dealer, &mut self.shoe, &self.rules)?;
        for b in &mut self.boxes {
            let s = settle(b, &self.dealer, &self.rules);
            b.outcome = Some(s.outcome);
            b.payout = Some(s.payout);
        }
        Ok(())
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.boxes.iter().enumerate() {
            let marker = if i == self.acting { ">" } else { " " };
            write!(f, "{} box {}: {} x{}", marker, i + 1, b.hand, b.stake)?;
            if let (Some(o), Some(p)) = (b.outcome, b.payout) {
                write!(f, " {} {:+}", o, p)?;
            }
            writeln!(f)?;
        }
        if self.is_terminal() {
            write!(f, "  dealer: {}", self.dealer)
        } else {
            write!(f, "  dealer: {} ?", self.up_card())
        }
    }
}
