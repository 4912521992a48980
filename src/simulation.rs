//! Simulation driver: deals hands, explores them and folds the records into
//! the aggregator, batch by batch.
//!
//! The aggregator is owned by the caller. Nothing here touches the disk;
//! the caller's checkpoint hook runs after every batch and decides whether
//! to persist.

use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::aggregator::Aggregator;
use crate::config::RunConfig;
use crate::error::{SimError, SimResult};
use crate::explorer::{explore, Exploration};
use crate::game::GameState;
use crate::rules::TableRules;

/// Deal one hand from a fresh shoe and explore it against `stats`.
pub fn simulate_hand<R: Rng + ?Sized>(
    rng: &mut R,
    rules: TableRules,
    stats: &Aggregator,
) -> SimResult<Exploration> {
    let state = GameState::new_hand(rng, rules)?;
    debug!("dealt:\n{}", state);
    explore(&state, stats)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunTotals {
    pub hands_played: u64,
    pub hands_aborted: u64,
    pub records: u64,
    /// Sum of the root values of every played hand.
    pub net_value: f64,
}

impl RunTotals {
    /// Average propagated value per played hand.
    pub fn mean_value(&self) -> f64 {
        if self.hands_played == 0 {
            0.0
        } else {
            self.net_value / self.hands_played as f64
        }
    }

    fn absorb(&mut self, other: &RunTotals) {
        self.hands_played += other.hands_played;
        self.hands_aborted += other.hands_aborted;
        self.records += other.records;
        self.net_value += other.net_value;
    }

    /// Fold one hand's result; hand-local errors count as aborted hands.
    fn tally(
        &mut self,
        result: SimResult<Exploration>,
        stats: &mut Aggregator,
    ) -> SimResult<()> {
        match result {
            Ok(exp) => {
                stats.add_hand(&exp.records);
                self.hands_played += 1;
                self.records += exp.records.len() as u64;
                self.net_value += exp.value;
                Ok(())
            }
            Err(e) if e.is_hand_local() => {
                warn!("hand aborted: {}", e);
                self.hands_aborted += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Snapshot handed to the checkpoint hook after every batch.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub done: u64,
    pub total: u64,
    pub elapsed: Duration,
    pub totals: RunTotals,
}

impl Progress {
    pub fn is_final(&self) -> bool {
        self.done >= self.total
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.done as f64 / self.total as f64 * 100.0
        }
    }

    pub fn hands_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.done as f64 / secs
        } else {
            0.0
        }
    }

    pub fn eta(&self) -> Option<Duration> {
        let rate = self.hands_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            (self.total - self.done.min(self.total)) as f64 / rate,
        ))
    }
}

pub struct Simulation {
    config: RunConfig,
    rng: StdRng,
    pool: Option<ThreadPool>,
    totals: RunTotals,
}

impl Simulation {
    pub fn new(config: RunConfig) -> SimResult<Simulation> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pool = if config.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .build()
                .map_err(|e| SimError::InvalidConfig(format!("worker pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };
        Ok(Simulation {
            config,
            rng,
            pool,
            totals: RunTotals::default(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Run all configured hands, calling `on_checkpoint` after every batch
    /// of `checkpoint_every` hands and after the final partial batch.
    pub fn run<F>(&mut self, stats: &mut Aggregator, mut on_checkpoint: F) -> SimResult<RunTotals>
    where
        F: FnMut(&Aggregator, &Progress),
    {
        let started = Instant::now();
        let total = self.config.hands;
        let mut done = 0;
        while done < total {
            let batch = self.config.checkpoint_every.min(total - done);
            self.run_batch(stats, batch)?;
            done += batch;
            let progress = Progress {
                done,
                total,
                elapsed: started.elapsed(),
                totals: self.totals,
            };
            on_checkpoint(stats, &progress);
        }
        Ok(self.totals)
    }

    /// Simulate `hands` hands and fold them into `stats`.
    pub fn run_batch(&mut self, stats: &mut Aggregator, hands: u64) -> SimResult<()> {
        if self.pool.is_some() {
            self.run_batch_parallel(stats, hands)
        } else {
            self.run_batch_sequential(stats, hands)
        }
    }

    fn run_batch_sequential(&mut self, stats: &mut Aggregator, hands: u64) -> SimResult<()> {
        let rules = self.config.rules;
        for _ in 0..hands {
            let result = simulate_hand(&mut self.rng, rules, stats);
            self.totals.tally(result, stats)?;
        }
        Ok(())
    }

    /// Workers explore disjoint chunks against the statistics as they stood
    /// at the start of the batch, each into a private aggregator. The
    /// private aggregators are merged in worker order afterwards.
    fn run_batch_parallel(&mut self, stats: &mut Aggregator, hands: u64) -> SimResult<()> {
        let rules = self.config.rules;
        let workers = self.config.workers as u64;
        let jobs: Vec<(u64, u64)> = (0..workers)
            .map(|i| {
                let share = hands / workers + u64::from(i < hands % workers);
                (self.rng.gen::<u64>(), share)
            })
            .filter(|&(_, share)| share > 0)
            .collect();

        let snapshot: &Aggregator = stats;
        let work = || {
            jobs.par_iter()
                .map(|&(seed, share)| -> SimResult<(Aggregator, RunTotals)> {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let mut local = Aggregator::new();
                    let mut totals = RunTotals::default();
                    for _ in 0..share {
                        let result = simulate_hand(&mut rng, rules, snapshot);
                        totals.tally(result, &mut local)?;
                    }
                    Ok((local, totals))
                })
                .collect::<Vec<_>>()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        for result in results {
            let (local, totals) = result?;
            stats.merge(&local);
            self.totals.absorb(&totals);
        }
        Ok(())
    }
}
