pub mod app;
pub mod cli;
pub mod config;
pub mod enhance;
pub mod filter;
pub mod listing;
pub mod output;
pub mod runner;
pub mod timefmt;
pub mod utils;
pub mod vulns;

#[cfg(test)]
mod tests;
