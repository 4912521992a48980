pub mod aggregator;
pub mod cards;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod explorer;
pub mod game;
pub mod hand;
pub mod resolve;
pub mod rules;
pub mod simulation;
pub mod strategy;
