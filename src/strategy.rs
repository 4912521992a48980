//! Learned strategy chart: the best-ranked action at every decision point
//! the statistics have seen.

use crate::aggregator::{Aggregator, StatEntry, StateKey};
use crate::game::{Action, MoveSet};

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub state: StateKey,
    pub best: Action,
    pub best_ev: f64,
    /// Trials summed over every action at this state.
    pub trials: u64,
    /// Tried actions, ranked by running average.
    pub ranked: Vec<(Action, StatEntry)>,
}

impl ChartRow {
    /// Gap between the best and second-best action, if two were tried.
    pub fn margin(&self) -> Option<f64> {
        match self.ranked.as_slice() {
            [first, second, ..] => Some(first.1.average - second.1.average),
            _ => None,
        }
    }
}

/// Chart row for one decision point, or `None` without data.
pub fn chart_row(stats: &Aggregator, state: StateKey) -> Option<ChartRow> {
    let best = stats.best_action(state, MoveSet::ALL)?;
    let mut ranked = stats.action_stats(state);
    // Stable sort keeps Stand ahead of equal averages.
    ranked.sort_by(|a, b| b.1.average.total_cmp(&a.1.average));
    Some(ChartRow {
        state,
        best,
        best_ev: stats.get(state, best).average,
        trials: ranked.iter().map(|(_, e)| e.trials).sum(),
        ranked,
    })
}

/// Rows for every decision point with data, optionally for one dealer
/// up-card, ordered by up-card, category and player score.
pub fn build_chart(stats: &Aggregator, dealer_up: Option<u8>) -> Vec<ChartRow> {
    let mut rows: Vec<ChartRow> = stats
        .states()
        .into_iter()
        .filter(|s| dealer_up.map_or(true, |up| s.dealer_up == up))
        .filter_map(|s| chart_row(stats, s))
        .collect();
    rows.sort_by_key(|r| (r.state.dealer_up, r.state.category, r.state.player_score));
    rows
}

/// Trial-weighted average EV of the preferred action across the chart.
pub fn chart_ev(rows: &[ChartRow]) -> f64 {
    let (weighted, trials) = rows.iter().fold((0.0, 0u64), |(w, n), r| {
        let t = r.ranked.first().map(|(_, e)| e.trials).unwrap_or(0);
        (w + r.best_ev * t as f64, n + t)
    });
    if trials == 0 {
        0.0
    } else {
        weighted / trials as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::SimRecord;
    use crate::hand::HandCategory;

    fn rec(up: u8, score: u8, action: Action, value: f64) -> SimRecord {
        SimRecord {
            dealer_up: up,
            player_score: score,
            category: HandCategory::Hard,
            action,
            value,
        }
    }

    #[test]
    fn row_ranks_actions_by_ev() {
        let mut stats = Aggregator::new();
        stats.add(&[
            rec(10, 12, Action::Stand, -0.6),
            rec(10, 12, Action::Hit, -0.4),
            rec(10, 12, Action::Double, -1.2),
        ]);
        let row = chart_row(&stats, StateKey::new(10, 12, HandCategory::Hard)).unwrap();
        assert_eq!(row.best, Action::Hit);
        assert_eq!(row.trials, 3);
        assert_eq!(row.ranked[0].0, Action::Hit);
        assert!((row.margin().unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn chart_filters_by_dealer() {
        let mut stats = Aggregator::new();
        stats.add(&[rec(10, 12, Action::Stand, -0.5), rec(6, 12, Action::Stand, 0.1)]);
        let rows = build_chart(&stats, Some(6));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state.dealer_up, 6);
        assert_eq!(build_chart(&stats, None).len(), 2);
    }

    #[test]
    fn empty_stats_give_empty_chart() {
        assert!(build_chart(&Aggregator::new(), None).is_empty());
    }
}
