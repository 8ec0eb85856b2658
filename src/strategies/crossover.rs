//! Moving Average Crossover Strategy
//!
//! Buys when the short moving average crosses above the long one and sells on
//! the reverse cross. Only a change in ordering between two consecutive
//! cycles fires; the absolute level of the averages never does.

use super::SignalStrategy;
use crate::history::PriceHistory;
use crate::types::Signal;
use std::cmp::Ordering;
use tracing::debug;

/// Signal for the current short-vs-long ordering given the previous cycle's.
///
/// The current comparison is strict, so a tie never fires. A tie in the
/// previous cycle counts as "not yet crossed" in either direction.
pub fn crossover_signal(previous: Option<Ordering>, current: Ordering) -> Signal {
    let Some(previous) = previous else {
        return Signal::Hold;
    };

    match current {
        Ordering::Greater if previous != Ordering::Greater => Signal::Buy,
        Ordering::Less if previous != Ordering::Less => Signal::Sell,
        _ => Signal::Hold,
    }
}

pub struct CrossoverStrategy {
    short_window: usize,
    long_window: usize,
    /// Short-vs-long ordering from the last cycle that had enough history
    previous: Option<Ordering>,
}

impl CrossoverStrategy {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window,
            long_window,
            previous: None,
        }
    }

    pub fn previous(&self) -> Option<Ordering> {
        self.previous
    }
}

impl SignalStrategy for CrossoverStrategy {
    fn evaluate(&mut self, history: &PriceHistory) -> Signal {
        if history.len() < self.long_window {
            return Signal::Hold;
        }

        let Some(current) = history.compare_means(self.short_window, self.long_window) else {
            return Signal::Hold;
        };

        let signal = crossover_signal(self.previous, current);
        debug!(
            "Crossover short_ma={:?} long_ma={:?} {:?} (previous {:?}) -> {}",
            history.mean_of_last(self.short_window),
            history.mean_of_last(self.long_window),
            current,
            self.previous,
            signal
        );

        self.previous = Some(current);
        signal
    }

    fn required_history(&self) -> usize {
        self.short_window.max(self.long_window)
    }

    fn name(&self) -> &'static str {
        "MA Crossover"
    }
}
