use std::collections::HashSet;

use bj_sim::cards::*;
use bj_sim::error::SimError;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_card_creation() {
    let c = Card::new(Rank::Ace, Suit::Spades);
    assert_eq!(c.rank, Rank::Ace);
    assert_eq!(c.suit, Suit::Spades);
    assert_eq!(c.points(), 1);
    assert_eq!(c.rank.number(), 1);
}

#[test]
fn test_face_card_points() {
    assert_eq!(Card::new(Rank::Jack, Suit::Hearts).points(), 10);
    assert_eq!(Card::new(Rank::Queen, Suit::Hearts).points(), 10);
    assert_eq!(Card::new(Rank::King, Suit::Hearts).rank.number(), 13);
}

#[test]
fn test_invalid_rank() {
    assert!(matches!(Rank::from_char('X'), Err(SimError::InvalidRank('X'))));
}

#[test]
fn test_invalid_suit() {
    assert!(Suit::from_char('x').is_err());
}

#[test]
fn test_card_str() {
    let c = Card::new(Rank::King, Suit::Diamonds);
    assert_eq!(format!("{}", c), "Kd");
}

#[test]
fn test_card_pretty() {
    let c = Card::new(Rank::Ace, Suit::Spades);
    assert_eq!(c.pretty(), "A\u{2660}");
}

#[test]
fn test_parse_card_basic() {
    assert_eq!(parse_card("As").unwrap(), Card::new(Rank::Ace, Suit::Spades));
    assert_eq!(parse_card("Td").unwrap(), Card::new(Rank::Ten, Suit::Diamonds));
    assert_eq!(parse_card("kH").unwrap(), Card::new(Rank::King, Suit::Hearts));
}

#[test]
fn test_parse_card_invalid() {
    assert!(parse_card("ABC").is_err());
    assert!(parse_card("1s").is_err());
}

#[test]
fn test_parse_cards_with_separators() {
    let cards = parse_cards("As Kh, 8d8c").unwrap();
    assert_eq!(cards.len(), 4);
    assert_eq!(cards[3], Card::new(Rank::Eight, Suit::Clubs));
    assert!(parse_cards("AsK").is_err());
}

#[test]
fn test_fresh_shoe_has_52_distinct_cards() {
    let shoe = Shoe::new();
    let set: HashSet<Card> = shoe.cards().iter().copied().collect();
    assert_eq!(set.len(), SHOE_SIZE);
    assert_eq!(shoe.dealt(), 0);
    assert_eq!(shoe.remaining(), 52);
}

#[test]
fn test_shoe_never_deals_a_card_twice() {
    let mut shoe = Shoe::shuffled(&mut StdRng::seed_from_u64(3));
    let mut seen = HashSet::new();
    for _ in 0..SHOE_SIZE {
        assert!(seen.insert(shoe.draw().unwrap()));
    }
    assert_eq!(seen.len(), SHOE_SIZE);
    assert!(matches!(shoe.draw(), Err(SimError::ExhaustedShoe { .. })));
}

#[test]
fn test_shuffles_differ_across_seeds() {
    let a = Shoe::shuffled(&mut StdRng::seed_from_u64(1));
    let b = Shoe::shuffled(&mut StdRng::seed_from_u64(2));
    assert_ne!(a.cards(), b.cards());
}

#[test]
fn test_stacked_shoe_deals_prefix_then_rest() {
    let top = parse_cards("8s8hTc").unwrap();
    let mut shoe = Shoe::stacked(&top).unwrap();
    for card in &top {
        assert_eq!(shoe.draw().unwrap(), *card);
    }
    // Rest follows canonical order, skipping the stacked cards.
    assert_eq!(shoe.draw().unwrap(), Card::new(Rank::Ace, Suit::Spades));
    let set: HashSet<Card> = shoe.cards().iter().copied().collect();
    assert_eq!(set.len(), SHOE_SIZE);
}

#[test]
fn test_format_cards() {
    assert_eq!(format_cards(&parse_cards("AsKh").unwrap()), "As Kh");
}
