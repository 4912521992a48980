//! Exhaustive depth-first exploration of a hand's action tree.
//!
//! Every legal action at every decision point is played out and recorded.
//! The value a node hands back to its parent is not an average of its
//! branches: it is the value of the branch the current statistics prefer,
//! or the Stand branch when there are no statistics yet. Repeating this over
//! many hands bootstraps the strategy the statistics describe.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::aggregator::{Aggregator, StatKey, StateKey};
use crate::error::SimResult;
use crate::game::{Action, GameState, ALL_ACTIONS};
use crate::hand::HandCategory;

/// One observation: the value of taking `action` at a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimRecord {
    pub dealer_up: u8,
    pub player_score: u8,
    pub category: HandCategory,
    pub action: Action,
    pub value: f64,
}

impl SimRecord {
    pub fn state(&self) -> StateKey {
        StateKey::new(self.dealer_up, self.player_score, self.category)
    }

    pub fn key(&self) -> StatKey {
        self.state().with(self.action)
    }
}

/// Result of exploring one dealt hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exploration {
    /// Value propagated to the root under the current statistics.
    pub value: f64,
    /// One record per explored (decision point, action) pair, children first.
    pub records: Vec<SimRecord>,
    /// Terminal states reached.
    pub terminals: usize,
    /// Deepest decision chain explored.
    pub max_depth: usize,
}

/// Explore every action sequence reachable from `state`.
///
/// `stats` is only read: it decides which branch value each node returns.
pub fn explore(state: &GameState, stats: &Aggregator) -> SimResult<Exploration> {
    let mut explorer = Explorer {
        stats,
        records: Vec::new(),
        terminals: 0,
        max_depth: 0,
    };
    let value = explorer.visit(state, 0)?;
    Ok(Exploration {
        value,
        records: explorer.records,
        terminals: explorer.terminals,
        max_depth: explorer.max_depth,
    })
}

struct Explorer<'a> {
    stats: &'a Aggregator,
    records: Vec<SimRecord>,
    terminals: usize,
    max_depth: usize,
}

impl<'a> Explorer<'a> {
    fn visit(&mut self, state: &GameState, depth: usize) -> SimResult<f64> {
        self.max_depth = self.max_depth.max(depth);

        let acting = match state.acting_box() {
            Some(b) => b,
            None => {
                self.terminals += 1;
                let total = state.total_payout().unwrap_or_default();
                trace!(
                    "{:indent$}terminal: dealer {} -> {:+}",
                    "",
                    state.dealer().soft_total(),
                    total,
                    indent = depth * 2
                );
                return Ok(total);
            }
        };

        let key = StateKey::new(state.dealer_up_value(), acting.score(), acting.category());
        let legal = acting.moves;

        // Enumerate: every legal branch is played out and recorded.
        let mut values: [Option<f64>; 4] = [None; 4];
        for action in legal.iter() {
            trace!(
                "{:indent$}box {} {} vs {}: {}",
                "",
                state.acting_index() + 1,
                acting.hand,
                key.dealer_up,
                action,
                indent = depth * 2
            );
            let next = state.apply(action)?;
            let value = self.visit(&next, depth + 1)?;
            self.records.push(SimRecord {
                dealer_up: key.dealer_up,
                player_score: key.player_score,
                category: key.category,
                action,
                value,
            });
            values[action_slot(action)] = Some(value);
        }

        // Propagate: a read-only query picks the branch whose value goes up.
        let chosen = self.stats.best_action(key, legal).unwrap_or(Action::Stand);
        let value = values[action_slot(chosen)]
            .or(values[action_slot(Action::Stand)])
            .unwrap_or_default();
        trace!(
            "{:indent$}-> {} ({:+})",
            "",
            chosen,
            value,
            indent = depth * 2
        );
        Ok(value)
    }
}

fn action_slot(action: Action) -> usize {
    ALL_ACTIONS.iter().position(|&a| a == action).unwrap_or(0)
}
