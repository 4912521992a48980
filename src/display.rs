use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::cards::{Card, Suit};
use crate::explorer::SimRecord;
use crate::game::{Action, GameState};
use crate::strategy::ChartRow;

pub fn hand_display(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| {
            let text = card.pretty();
            match card.suit {
                Suit::Spades => text.white().to_string(),
                Suit::Hearts => text.red().to_string(),
                Suit::Diamonds => text.blue().to_string(),
                Suit::Clubs => text.green().to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn styled_action(action: Action) -> String {
    let label = action.as_str().to_uppercase();
    match action {
        Action::Stand => label.yellow().bold().to_string(),
        Action::Hit => label.green().bold().to_string(),
        Action::Double => label.red().bold().to_string(),
        Action::Split => label.cyan().bold().to_string(),
    }
}

pub fn styled_ev(ev: f64) -> String {
    let text = format!("{:+.3}", ev);
    if ev >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn up_card_label(value: u8) -> String {
    match value {
        1 => "A".to_string(),
        v => v.to_string(),
    }
}

pub fn chart_table(rows: &[ChartRow]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Dealer").set_alignment(CellAlignment::Center),
        Cell::new("Hand").set_alignment(CellAlignment::Left),
        Cell::new("Score").set_alignment(CellAlignment::Right),
        Cell::new("Best").set_alignment(CellAlignment::Center),
        Cell::new("EV").set_alignment(CellAlignment::Right),
        Cell::new("Trials").set_alignment(CellAlignment::Right),
        Cell::new("Others").set_alignment(CellAlignment::Left),
    ]);

    for row in rows {
        let others = row
            .ranked
            .iter()
            .filter(|(a, _)| *a != row.best)
            .map(|(a, e)| format!("{} {:+.3}", a, e.average))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(up_card_label(row.state.dealer_up)).set_alignment(CellAlignment::Center),
            Cell::new(row.state.category.as_str()),
            Cell::new(row.state.player_score).set_alignment(CellAlignment::Right),
            Cell::new(styled_action(row.best)).set_alignment(CellAlignment::Center),
            Cell::new(styled_ev(row.best_ev)).set_alignment(CellAlignment::Right),
            Cell::new(row.trials).set_alignment(CellAlignment::Right),
            Cell::new(others.dimmed().to_string()),
        ]);
    }

    table.to_string()
}

pub fn records_table(records: &[SimRecord]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").set_alignment(CellAlignment::Right),
        Cell::new("Dealer").set_alignment(CellAlignment::Center),
        Cell::new("Hand").set_alignment(CellAlignment::Left),
        Cell::new("Score").set_alignment(CellAlignment::Right),
        Cell::new("Action").set_alignment(CellAlignment::Center),
        Cell::new("Value").set_alignment(CellAlignment::Right),
    ]);
    for (i, r) in records.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(up_card_label(r.dealer_up)).set_alignment(CellAlignment::Center),
            Cell::new(r.category.as_str()),
            Cell::new(r.player_score).set_alignment(CellAlignment::Right),
            Cell::new(styled_action(r.action)).set_alignment(CellAlignment::Center),
            Cell::new(styled_ev(r.value)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

pub fn print_deal(state: &GameState) {
    for (i, b) in state.boxes().iter().enumerate() {
        println!(
            "  Box {}: {}  ({})",
            i + 1,
            hand_display(b.hand.cards()),
            b.hand.score_label().bold()
        );
    }
    println!("  Dealer: {}  ?", hand_display(&[state.up_card()]));
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("  {}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}
