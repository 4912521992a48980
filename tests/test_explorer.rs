use approx::assert_relative_eq;
use bj_sim::aggregator::{Aggregator, StateKey};
use bj_sim::cards::{parse_cards, Shoe};
use bj_sim::explorer::{explore, SimRecord};
use bj_sim::game::{Action, GameState};
use bj_sim::hand::HandCategory;
use bj_sim::rules::TableRules;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn deal(cards: &str) -> GameState {
    let shoe = Shoe::stacked(&parse_cards(cards).unwrap()).unwrap();
    GameState::deal(shoe, TableRules::default()).unwrap()
}

fn preferring(state: StateKey, action: Action, value: f64) -> Aggregator {
    let mut stats = Aggregator::new();
    stats.add(&[SimRecord {
        dealer_up: state.dealer_up,
        player_score: state.player_score,
        category: state.category,
        action,
        value,
    }]);
    stats
}

/// Independent count of the records a full exploration must emit: one per
/// legal action at every decision point.
fn count_decisions(state: &GameState) -> usize {
    state
        .legal_moves()
        .iter()
        .map(|a| 1 + count_decisions(&state.apply(a).unwrap()))
        .sum()
}

// Player 16 against dealer Th7h. The next card in the shoe is the As, so
// hitting or doubling reaches a hard 17 and pushes; standing loses.
const SIXTEEN_VS_SEVENTEEN: &str = "Ts6s Th7h";

fn sixteen() -> StateKey {
    StateKey::new(10, 16, HandCategory::Hard)
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

#[test]
fn test_records_cover_every_legal_action() {
    let gs = deal(SIXTEEN_VS_SEVENTEEN);
    let result = explore(&gs, &Aggregator::new()).unwrap();
    assert_eq!(result.records.len(), count_decisions(&gs));

    let root: Vec<&SimRecord> = result
        .records
        .iter()
        .filter(|r| r.player_score == 16)
        .collect();
    let actions: Vec<Action> = root.iter().map(|r| r.action).collect();
    assert_eq!(actions, vec![Action::Stand, Action::Hit, Action::Double]);
    assert!(root.iter().all(|r| r.dealer_up == 10));
}

#[test]
fn test_no_record_for_illegal_split() {
    let gs = deal("KsQh 9d8d");
    let result = explore(&gs, &Aggregator::new()).unwrap();
    assert!(result.records.iter().all(|r| r.action != Action::Split));
}

#[test]
fn test_pair_tree_includes_split_branches() {
    let gs = deal("8s8h Tc8c");
    let result = explore(&gs, &Aggregator::new()).unwrap();
    assert_eq!(result.records.len(), count_decisions(&gs));
    let split = result
        .records
        .iter()
        .filter(|r| r.category == HandCategory::Splittable && r.action == Action::Split)
        .count();
    assert!(split >= 1);
}

#[test]
fn test_random_hands_enumerate_fully() {
    let mut rng = StdRng::seed_from_u64(5);
    let stats = Aggregator::new();
    for _ in 0..50 {
        let gs = GameState::new_hand(&mut rng, TableRules::default()).unwrap();
        let result = explore(&gs, &stats).unwrap();
        assert_eq!(result.records.len(), count_decisions(&gs));
        assert!(result.terminals >= 1);
    }
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

#[test]
fn test_cold_start_propagates_stand() {
    let gs = deal(SIXTEEN_VS_SEVENTEEN);
    let result = explore(&gs, &Aggregator::new()).unwrap();
    assert_relative_eq!(result.value, -1.0);
}

#[test]
fn test_preferred_action_changes_propagated_value() {
    let gs = deal(SIXTEEN_VS_SEVENTEEN);
    let stats = preferring(sixteen(), Action::Hit, 0.5);
    let result = explore(&gs, &stats).unwrap();
    assert_relative_eq!(result.value, 0.0);
}

#[test]
fn test_ties_go_to_stand() {
    let gs = deal(SIXTEEN_VS_SEVENTEEN);
    let mut stats = Aggregator::new();
    for action in [Action::Hit, Action::Stand] {
        stats.add(&[SimRecord {
            dealer_up: 10,
            player_score: 16,
            category: HandCategory::Hard,
            action,
            value: 0.0,
        }]);
    }
    let result = explore(&gs, &stats).unwrap();
    assert_relative_eq!(result.value, -1.0);
}

#[test]
fn test_illegal_preference_falls_back_to_stand() {
    let gs = deal(SIXTEEN_VS_SEVENTEEN);
    let stats = preferring(sixteen(), Action::Split, 5.0);
    let result = explore(&gs, &stats).unwrap();
    assert_relative_eq!(result.value, -1.0);
}

#[test]
fn test_records_carry_decision_time_state() {
    let gs = deal(SIXTEEN_VS_SEVENTEEN);
    let result = explore(&gs, &Aggregator::new()).unwrap();
    // Every record's value is what its branch propagated, and branches from
    // the root are listed after their subtrees.
    let last = result.records.last().unwrap();
    assert_eq!(last.player_score, 16);
    assert_eq!(last.action, Action::Double);
    assert_relative_eq!(last.value, 0.0);
    let stand = result
        .records
        .iter()
        .find(|r| r.player_score == 16 && r.action == Action::Stand)
        .unwrap();
    assert_relative_eq!(stand.value, -1.0);
}

#[test]
fn test_exploration_leaves_state_untouched() {
    let gs = deal("8s8h Tc8c");
    let before = gs.shoe().dealt();
    explore(&gs, &Aggregator::new()).unwrap();
    assert_eq!(gs.shoe().dealt(), before);
    assert!(!gs.is_terminal());
}
