pub mod aggregate;
pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod grid;
pub mod logging;
pub mod output;
pub mod record;
pub mod source;
pub mod utils;

#[cfg(test)]
mod tests;
