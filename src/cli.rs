use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::aggregator::{Aggregator, StateKey};
use crate::cards::{parse_cards, Shoe};
use crate::config::{debug_from_env, default_data_path, init_logging, RunConfig};
use crate::display::{
    chart_table, print_deal, print_error, print_section, print_success, records_table,
    styled_action, styled_ev,
};
use crate::error::SimResult;
use crate::explorer::explore;
use crate::game::GameState;
use crate::rules::TableRules;
use crate::simulation::{Progress, Simulation};
use crate::strategy::{build_chart, chart_ev};

#[derive(Parser)]
#[command(
    name = "bjsim",
    version = "0.1.0",
    about = "Blackjack simulator: exhaustive action trees and bootstrapped EV statistics."
)]
struct Cli {
    /// Verbose per-decision tracing (also BJSIM_DEBUG=1)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct RuleArgs {
    /// Maximum number of boxes after splitting
    #[arg(long, default_value = "4")]
    max_boxes: usize,
    /// Payout multiple for a natural
    #[arg(long, default_value = "2.0")]
    natural_payout: f64,
    /// Pay the natural bonus on split-derived boxes too
    #[arg(long)]
    split_naturals: bool,
    /// Dealer draws on soft 17
    #[arg(long)]
    dealer_hits_soft_17: bool,
}

impl RuleArgs {
    fn rules(&self) -> TableRules {
        TableRules {
            max_boxes: self.max_boxes,
            natural_payout: self.natural_payout,
            split_naturals: self.split_naturals,
            dealer_hits_soft_17: self.dealer_hits_soft_17,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate hands and accumulate EV statistics
    Simulate {
        /// Number of hands to simulate
        #[arg(short = 'n', long, default_value = "100000")]
        hands: u64,
        /// Hands between checkpoints (statistics are saved at each)
        #[arg(short, long, default_value = "10000")]
        checkpoint: u64,
        /// Statistics file (default: BJSIM_DATA or ./bj_sim_data.json)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Parallel workers (1 = sequential, live statistics)
        #[arg(short, long, default_value = "1")]
        workers: usize,
        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Ignore any saved statistics and start cold
        #[arg(long)]
        fresh: bool,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Show the learned strategy chart
    Chart {
        /// Statistics file (default: BJSIM_DATA or ./bj_sim_data.json)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Only this dealer up-card value (1 = Ace, 10 = ten/face)
        #[arg(long)]
        dealer: Option<u8>,
    },
    /// Deal one hand and show every explored decision
    Explore {
        /// Statistics file used to pick propagated branches
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// RNG seed for the shoe
        #[arg(long)]
        seed: Option<u64>,
        /// Stack the shoe: player, player, dealer, dealer, then draws (e.g. "8s8hTc8c")
        #[arg(long)]
        cards: Option<String>,
        #[command(flatten)]
        rules: RuleArgs,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

fn dispatch(cli: Cli) {
    init_logging(cli.debug || debug_from_env());

    let result = match cli.command {
        Commands::Simulate {
            hands,
            checkpoint,
            data,
            workers,
            seed,
            fresh,
            rules,
        } => {
            let config = RunConfig {
                hands,
                checkpoint_every: checkpoint,
                workers,
                seed,
                rules: rules.rules(),
            };
            cmd_simulate(config, &data.unwrap_or_else(default_data_path), fresh)
        }
        Commands::Chart { data, dealer } => {
            cmd_chart(&data.unwrap_or_else(default_data_path), dealer);
            Ok(())
        }
        Commands::Explore {
            data,
            seed,
            cards,
            rules,
        } => cmd_explore(data, seed, cards, rules.rules()),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn save_checkpoint(stats: &Aggregator, path: &Path) {
    match stats.save(path) {
        Ok(()) => info!("saved {} entries to {}", stats.len(), path.display()),
        Err(e) => error!(
            "failed to save statistics to {}: {} (continuing in memory)",
            path.display(),
            e
        ),
    }
}

fn print_progress(p: &Progress) {
    let eta = p
        .eta()
        .map(|d| format!("{:.0}s", d.as_secs_f64()))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  [{:>6.2}%] {} / {} hands  {:.0} hands/s  eta {}  mean {}",
        p.percent(),
        p.done.to_string().bold(),
        p.total,
        p.hands_per_sec(),
        eta,
        styled_ev(p.totals.mean_value()),
    );
}

fn cmd_simulate(config: RunConfig, path: &Path, fresh: bool) -> SimResult<()> {
    let mut sim = Simulation::new(config)?;
    let mut stats = if fresh {
        Aggregator::new()
    } else {
        Aggregator::load_or_default(path)
    };

    let cfg = sim.config().clone();
    println!();
    println!(
        "  {} Simulating {} hands ({} per checkpoint, {} worker{})",
        "BJ".bold(),
        cfg.hands.to_string().bold(),
        cfg.checkpoint_every,
        cfg.workers,
        if cfg.workers == 1 { "" } else { "s" },
    );
    println!(
        "  Statistics: {} ({} hands so far)",
        path.display(),
        stats.hands()
    );
    println!();

    let totals = sim.run(&mut stats, |stats, progress| {
        print_progress(progress);
        save_checkpoint(stats, path);
    })?;

    println!();
    print_success(&format!(
        "  Done: {} hands played, {} aborted, {} records",
        totals.hands_played, totals.hands_aborted, totals.records
    ));
    println!(
        "  Mean propagated value: {}  |  Statistics now cover {} hands, {} entries",
        styled_ev(totals.mean_value()),
        stats.hands(),
        stats.len(),
    );
    println!();
    Ok(())
}

fn cmd_chart(path: &Path, dealer: Option<u8>) {
    let stats = Aggregator::load_or_default(path);
    if stats.is_empty() {
        print_error(&format!(
            "No statistics in {}. Run `bjsim simulate` first.",
            path.display()
        ));
        return;
    }
    let rows = build_chart(&stats, dealer);
    if rows.is_empty() {
        print_error("No decision points match that dealer up-card.");
        return;
    }
    println!();
    println!(
        "  {} Learned strategy from {} hands ({} decision points)",
        "BJ".bold(),
        stats.hands().to_string().bold(),
        rows.len(),
    );
    println!("{}", chart_table(&rows));
    println!("  Weighted EV of preferred actions: {}", styled_ev(chart_ev(&rows)));
    println!();
}

fn cmd_explore(
    data: Option<PathBuf>,
    seed: Option<u64>,
    cards: Option<String>,
    rules: TableRules,
) -> SimResult<()> {
    rules.validate()?;
    let stats = match data {
        Some(path) => Aggregator::load_or_default(&path),
        None => Aggregator::new(),
    };
    let shoe = match (cards, seed) {
        (Some(notation), _) => Shoe::stacked(&parse_cards(&notation)?)?,
        (None, Some(seed)) => Shoe::shuffled(&mut StdRng::seed_from_u64(seed)),
        (None, None) => Shoe::new(),
    };
    let state = GameState::deal(shoe, rules)?;

    println!();
    print_deal(&state);

    let result = explore(&state, &stats)?;
    println!("{}", records_table(&result.records));

    let best = state
        .acting_box()
        .and_then(|b| {
            let key = StateKey::new(state.dealer_up_value(), b.score(), b.category());
            stats.best_action(key, b.moves)
        })
        .map(styled_action)
        .unwrap_or_else(|| "STAND (no data)".dimmed().to_string());
    print_section(
        "Result",
        &format!(
            "root value {}  via {}  |  {} records, {} terminal states, depth {}",
            styled_ev(result.value),
            best,
            result.records.len(),
            result.terminals,
            result.max_depth,
        ),
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "bjsim", "simulate", "-n", "500", "--checkpoint", "100", "--workers", "2",
            "--split-naturals",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate {
                hands,
                checkpoint,
                workers,
                rules,
                ..
            } => {
                assert_eq!(hands, 500);
                assert_eq!(checkpoint, 100);
                assert_eq!(workers, 2);
                assert!(rules.rules().split_naturals);
                assert!(!rules.rules().dealer_hits_soft_17);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn parses_dealer_soft_17_rule() {
        let cli = Cli::try_parse_from(["bjsim", "explore", "--dealer-hits-soft-17"]).unwrap();
        match cli.command {
            Commands::Explore { rules, .. } => assert!(rules.rules().dealer_hits_soft_17),
            _ => panic!("expected explore"),
        }
    }
}
