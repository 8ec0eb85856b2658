//! Signal strategies for the trading loop
//!
//! Strategies only read price history and never see the position; the loop
//! decides whether a signal is actionable.

pub mod crossover;
pub mod trend;

pub use crossover::CrossoverStrategy;
pub use trend::TrendStrategy;

use crate::config::Config;
use crate::history::PriceHistory;
use crate::types::Signal;
use std::time::Duration;

/// Trait for signal strategies
pub trait SignalStrategy: Send {
    /// Derive this cycle's signal from the history, latest sample included
    fn evaluate(&mut self, history: &PriceHistory) -> Signal;

    /// Number of most recent samples the strategy ever reads
    fn required_history(&self) -> usize;

    /// Get strategy name for display
    fn name(&self) -> &'static str;
}

/// Strategy selectable from the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyKind {
    /// Moving average crossover
    Crossover,
    /// Latest price against the price `window` samples back
    Trend,
}

impl StrategyKind {
    pub fn build(&self, config: &Config) -> Box<dyn SignalStrategy> {
        match self {
            StrategyKind::Crossover => Box::new(CrossoverStrategy::new(
                config.crossover.short_window,
                config.crossover.long_window,
            )),
            StrategyKind::Trend => Box::new(TrendStrategy::new(config.trend.window)),
        }
    }

    /// Default polling interval for this strategy
    pub fn interval(&self, config: &Config) -> Duration {
        match self {
            StrategyKind::Crossover => Duration::from_secs(config.crossover.interval_secs),
            StrategyKind::Trend => Duration::from_secs(config.trend.interval_secs),
        }
    }
}
