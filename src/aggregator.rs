//! Running expected-value statistics per decision state and action.
//!
//! The store is keyed by (dealer up-card, player score, hand category,
//! action). An absent key means zero trials, which the explorer treats as a
//! cold start. Keys are never removed.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::explorer::SimRecord;
use crate::game::{Action, MoveSet, ALL_ACTIONS};
use crate::hand::HandCategory;

/// Version tag written into every statistics document.
pub const FORMAT_VERSION: u32 = 1;

/// A decision point, without the action taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey {
    pub dealer_up: u8,
    pub player_score: u8,
    pub category: HandCategory,
}

impl StateKey {
    pub fn new(dealer_up: u8, player_score: u8, category: HandCategory) -> StateKey {
        StateKey {
            dealer_up,
            player_score,
            category,
        }
    }

    pub fn with(self, action: Action) -> StatKey {
        StatKey { state: self, action }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatKey {
    pub state: StateKey,
    pub action: Action,
}

/// Trial count and running-average payout for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub trials: u64,
    pub average: f64,
}

impl StatEntry {
    /// Fold one payout into the running average. The average uses the
    /// pre-increment trial count.
    pub fn record(&mut self, payout: f64) {
        let n = self.trials as f64;
        self.average = (self.average * n + payout) / (n + 1.0);
        self.trials += 1;
    }

    /// Count-weighted combination with another entry.
    pub fn merge(&mut self, other: &StatEntry) {
        let total = self.trials + other.trials;
        if total == 0 {
            return;
        }
        self.average = (self.average * self.trials as f64 + other.average * other.trials as f64)
            / total as f64;
        self.trials = total;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregator {
    entries: HashMap<StatKey, StatEntry>,
    hands: u64,
}

impl Aggregator {
    pub fn new() -> Aggregator {
        Aggregator::default()
    }

    /// Fold every record into its key's running average.
    pub fn add(&mut self, records: &[SimRecord]) {
        for r in records {
            self.entries.entry(r.key()).or_default().record(r.value);
        }
    }

    /// Fold the records of one simulated hand and count the hand.
    pub fn add_hand(&mut self, records: &[SimRecord]) {
        self.add(records);
        self.hands += 1;
    }

    /// Entry for one key; zero trials when absent.
    pub fn get(&self, state: StateKey, action: Action) -> StatEntry {
        self.entries.get(&state.with(action)).copied().unwrap_or_default()
    }

    /// Per-action statistics at a decision point, skipping untried actions.
    pub fn action_stats(&self, state: StateKey) -> Vec<(Action, StatEntry)> {
        ALL_ACTIONS
            .iter()
            .filter_map(|&a| {
                self.entries
                    .get(&state.with(a))
                    .filter(|e| e.trials > 0)
                    .map(|e| (a, *e))
            })
            .collect()
    }

    /// Candidate with the highest running average among those with at least
    /// one trial. Ties go to the earlier action, so Stand wins them. `None`
    /// means no candidate has data yet.
    pub fn best_action(&self, state: StateKey, candidates: MoveSet) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for (action, entry) in self.action_stats(state) {
            if !candidates.contains(action) {
                continue;
            }
            match best {
                Some((_, avg)) if entry.average <= avg => {}
                _ => best = Some((action, entry.average)),
            }
        }
        best.map(|(a, _)| a)
    }

    /// Fold another aggregator into this one.
    pub fn merge(&mut self, other: &Aggregator) {
        for (key, entry) in &other.entries {
            self.entries.entry(*key).or_default().merge(entry);
        }
        self.hands += other.hands;
    }

    pub fn hands(&self) -> u64 {
        self.hands
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_trials(&self) -> u64 {
        self.entries.values().map(|e| e.trials).sum()
    }

    /// Distinct decision points with any data, in key order.
    pub fn states(&self) -> Vec<StateKey> {
        let mut states: Vec<StateKey> = self.entries.keys().map(|k| k.state).collect();
        states.sort_unstable();
        states.dedup();
        states
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn to_document(&self) -> StatsDocument {
        let mut stats: NestedStats = BTreeMap::new();
        for (key, entry) in &self.entries {
            stats
                .entry(key.state.dealer_up.to_string())
                .or_default()
                .entry(key.state.player_score.to_string())
                .or_default()
                .entry(key.state.category.as_str().to_string())
                .or_default()
                .insert(key.action.as_str().to_string(), *entry);
        }
        StatsDocument {
            version: FORMAT_VERSION,
            hands: self.hands,
            stats,
        }
    }

    pub fn from_document(doc: StatsDocument) -> SimResult<Aggregator> {
        if doc.version != FORMAT_VERSION {
            return Err(SimError::UnsupportedVersion(doc.version));
        }
        let mut agg = Aggregator {
            entries: HashMap::new(),
            hands: doc.hands,
        };
        for (up, scores) in &doc.stats {
            let Some(dealer_up) = up.parse::<u8>().ok().filter(|v| (1..=10).contains(v)) else {
                warn!("skipping unknown dealer up-card key {:?}", up);
                continue;
            };
            for (score, categories) in scores {
                let Ok(player_score) = score.parse::<u8>() else {
                    warn!("skipping unknown player score key {:?}", score);
                    continue;
                };
                for (cat, actions) in categories {
                    let Ok(category) = cat.parse::<HandCategory>() else {
                        warn!("skipping unknown hand category key {:?}", cat);
                        continue;
                    };
                    let state = StateKey::new(dealer_up, player_score, category);
                    for (name, entry) in actions {
                        let Ok(action) = name.parse::<Action>() else {
                            warn!("skipping unknown action key {:?}", name);
                            continue;
                        };
                        agg.entries.insert(state.with(action), *entry);
                    }
                }
            }
        }
        Ok(agg)
    }

    /// Write the statistics document to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> SimResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.to_document())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> SimResult<Aggregator> {
        let json = std::fs::read_to_string(path)?;
        let doc: StatsDocument = serde_json::from_str(&json)?;
        Aggregator::from_document(doc)
    }

    /// Load from `path`, falling back to an empty store on any failure.
    pub fn load_or_default(path: &Path) -> Aggregator {
        match Aggregator::load(path) {
            Ok(agg) => {
                info!(
                    "loaded {} entries ({} hands) from {}",
                    agg.len(),
                    agg.hands(),
                    path.display()
                );
                agg
            }
            Err(SimError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no statistics at {}, starting cold", path.display());
                Aggregator::new()
            }
            Err(e) => {
                warn!(
                    "could not load statistics from {} ({}), starting cold",
                    path.display(),
                    e
                );
                Aggregator::new()
            }
        }
    }
}

/// dealer up-card -> player score -> hand category -> action -> entry
pub type NestedStats =
    BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, StatEntry>>>>;

/// On-disk form of an [`Aggregator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument {
    pub version: u32,
    #[serde(default)]
    pub hands: u64,
    pub stats: NestedStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: f64, action: Action) -> SimRecord {
        SimRecord {
            dealer_up: 10,
            player_score: 16,
            category: HandCategory::Hard,
            action,
            value,
        }
    }

    fn state() -> StateKey {
        StateKey::new(10, 16, HandCategory::Hard)
    }

    #[test]
    fn incremental_mean_uses_pre_increment_count() {
        let mut agg = Aggregator::new();
        agg.add(&[record(1.0, Action::Hit), record(-1.0, Action::Hit), record(0.0, Action::Hit)]);
        let e = agg.get(state(), Action::Hit);
        assert_eq!(e.trials, 3);
        assert!(e.average.abs() < 1e-12);
    }

    #[test]
    fn absent_key_is_zero_trials() {
        let agg = Aggregator::new();
        assert_eq!(agg.get(state(), Action::Stand), StatEntry::default());
        assert_eq!(agg.best_action(state(), MoveSet::ALL), None);
    }

    #[test]
    fn best_action_prefers_stand_on_ties() {
        let mut agg = Aggregator::new();
        agg.add(&[record(-0.5, Action::Hit), record(-0.5, Action::Stand)]);
        let all = MoveSet::ALL;
        assert_eq!(agg.best_action(state(), all), Some(Action::Stand));
    }

    #[test]
    fn best_action_respects_candidates() {
        let mut agg = Aggregator::new();
        agg.add(&[record(1.0, Action::Double), record(-0.2, Action::Hit)]);
        let no_double: MoveSet = [Action::Stand, Action::Hit].into_iter().collect();
        assert_eq!(agg.best_action(state(), no_double), Some(Action::Hit));
    }

    #[test]
    fn merge_matches_sequential_folding() {
        let payouts = [1.0, -1.0, 2.0, 0.0, -1.0];
        let mut whole = Aggregator::new();
        whole.add(&payouts.map(|v| record(v, Action::Stand)));

        let mut left = Aggregator::new();
        left.add(&payouts[..2].iter().map(|&v| record(v, Action::Stand)).collect::<Vec<_>>());
        let mut right = Aggregator::new();
        right.add(&payouts[2..].iter().map(|&v| record(v, Action::Stand)).collect::<Vec<_>>());
        left.merge(&right);

        let a = whole.get(state(), Action::Stand);
        let b = left.get(state(), Action::Stand);
        assert_eq!(a.trials, b.trials);
        assert!((a.average - b.average).abs() < 1e-12);
    }

    #[test]
    fn document_nests_by_dealer_score_category_action() {
        let mut agg = Aggregator::new();
        agg.add_hand(&[record(1.0, Action::Hit)]);
        let doc = agg.to_document();
        assert_eq!(doc.hands, 1);
        assert_eq!(doc.stats["10"]["16"]["hard"]["hit"].trials, 1);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let json = r#"{"version":1,"hands":2,"stats":{"10":{"16":{"hard":{"hit":{"trials":2,"average":0.5},"surrender":{"trials":1,"average":-0.5}},"weird":{}}},"11":{}}}"#;
        let doc: StatsDocument = serde_json::from_str(json).unwrap();
        let agg = Aggregator::from_document(doc).unwrap();
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.get(state(), Action::Hit).trials, 2);
    }

    #[test]
    fn rejects_other_versions() {
        let doc = StatsDocument {
            version: 99,
            hands: 0,
            stats: BTreeMap::new(),
        };
        assert!(matches!(
            Aggregator::from_document(doc),
            Err(SimError::UnsupportedVersion(99))
        ));
    }
}
