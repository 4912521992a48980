use std::fmt;

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

use crate::error::{SimError, SimResult};

pub const RANKS_STR: &str = "A23456789TJQK";
pub const SUITS_STR: &str = "shdc";

/// Number of cards in a single shoe.
pub const SHOE_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
}

impl Rank {
    pub fn from_char(c: char) -> SimResult<Rank> {
        match c {
            'A' => Ok(Rank::Ace),
            '2' => Ok(Rank::Two),
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            _ => Err(SimError::InvalidRank(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Rank::Ace => 'A',
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
        }
    }

    /// Rank number, Ace = 1 through King = 13.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Blackjack points: face cards count 10, the Ace counts 1.
    pub fn points(self) -> u8 {
        self.number().min(10)
    }
}

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Ace,
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub fn from_char(c: char) -> SimResult<Suit> {
        match c.to_ascii_lowercase() {
            's' => Ok(Suit::Spades),
            'h' => Ok(Suit::Hearts),
            'd' => Ok(Suit::Diamonds),
            'c' => Ok(Suit::Clubs),
            _ => Err(SimError::InvalidSuit(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "\u{2660}",
            Suit::Hearts => "\u{2665}",
            Suit::Diamonds => "\u{2666}",
            Suit::Clubs => "\u{2663}",
        }
    }
}

pub const ALL_SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn points(&self) -> u8 {
        self.rank.points()
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.to_char(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

/// All 52 cards in canonical order: suit-major, Ace to King.
pub fn full_deck() -> [Card; SHOE_SIZE] {
    let mut cards = [Card::new(Rank::Ace, Suit::Spades); SHOE_SIZE];
    for (s, &suit) in ALL_SUITS.iter().enumerate() {
        for (r, &rank) in ALL_RANKS.iter().enumerate() {
            cards[s * ALL_RANKS.len() + r] = Card::new(rank, suit);
        }
    }
    cards
}

/// A single 52-card shoe with a draw cursor.
///
/// The shoe is a plain `Copy`-able array, so cloning a game state for a new
/// branch of the explorer copies the remaining card order along with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shoe {
    cards: [Card; SHOE_SIZE],
    cursor: usize,
}

impl Shoe {
    /// Fresh shoe shuffled with the thread-local RNG.
    pub fn new() -> Shoe {
        Shoe::shuffled(&mut thread_rng())
    }

    /// Fresh shoe under a uniformly random permutation drawn from `rng`.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Shoe {
        let mut cards = full_deck();
        cards.shuffle(rng);
        Shoe { cards, cursor: 0 }
    }

    /// Shoe that deals `top` first, then the remaining cards in canonical order.
    pub fn stacked(top: &[Card]) -> SimResult<Shoe> {
        let mut cards = [Card::new(Rank::Ace, Suit::Spades); SHOE_SIZE];
        let mut used = [false; SHOE_SIZE];
        for (i, card) in top.iter().enumerate() {
            let idx = card_index(card);
            if used[idx] {
                return Err(SimError::DuplicateCard(card.to_string()));
            }
            used[idx] = true;
            cards[i] = *card;
        }
        let mut next = top.len();
        for (idx, card) in full_deck().iter().enumerate() {
            if !used[idx] {
                cards[next] = *card;
                next += 1;
            }
        }
        Ok(Shoe { cards, cursor: 0 })
    }

    pub fn draw(&mut self) -> SimResult<Card> {
        if self.cursor >= SHOE_SIZE {
            return Err(SimError::ExhaustedShoe { dealt: self.cursor });
        }
        let card = self.cards[self.cursor];
        self.cursor += 1;
        Ok(card)
    }

    pub fn dealt(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        SHOE_SIZE - self.cursor
    }

    pub fn cards(&self) -> &[Card; SHOE_SIZE] {
        &self.cards
    }
}

impl Default for Shoe {
    fn default() -> Self {
        Shoe::new()
    }
}

/// Position of a card in `full_deck` order (0..52).
pub fn card_index(card: &Card) -> usize {
    let suit = ALL_SUITS.iter().position(|&s| s == card.suit).unwrap_or(0);
    suit * ALL_RANKS.len() + (card.rank.number() as usize - 1)
}

pub fn parse_card(notation: &str) -> SimResult<Card> {
    let notation = notation.trim();
    let chars: Vec<char> = notation.chars().collect();
    if chars.len() != 2 {
        return Err(SimError::InvalidCardNotation(notation.to_string()));
    }
    let rank = Rank::from_char(chars[0].to_ascii_uppercase())?;
    let suit = Suit::from_char(chars[1])?;
    Ok(Card::new(rank, suit))
}

/// Parse a run of cards such as `"AsKh 8d,8c"`.
pub fn parse_cards(notation: &str) -> SimResult<Vec<Card>> {
    let notation = notation.trim().replace([' ', ','], "");
    let chars: Vec<char> = notation.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(SimError::InvalidCardNotation(notation));
    }
    chars
        .chunks(2)
        .map(|pair| parse_card(&pair.iter().collect::<String>()))
        .collect()
}

pub fn format_cards(cards: &[Card]) -> String {
    cards.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
}
