//! Trend Strategy
//!
//! Compares the latest price with the price `window` samples back. Samples in
//! between are ignored; this is a coarse direction detector.

use super::SignalStrategy;
use crate::history::PriceHistory;
use crate::types::Signal;

/// Direction of the latest sample relative to `history[-window]`
pub fn predict_trend(history: &PriceHistory, window: usize) -> Signal {
    if window == 0 || history.len() < window {
        return Signal::Hold;
    }

    let (Some(reference), Some(latest)) = (history.from_end(window), history.latest()) else {
        return Signal::Hold;
    };

    if latest > reference {
        Signal::Buy
    } else if latest < reference {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

pub struct TrendStrategy {
    window: usize,
}

impl TrendStrategy {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl SignalStrategy for TrendStrategy {
    fn evaluate(&mut self, history: &PriceHistory) -> Signal {
        predict_trend(history, self.window)
    }

    fn required_history(&self) -> usize {
        self.window
    }

    fn name(&self) -> &'static str {
        "Trend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(prices: &[f64], capacity: usize) -> PriceHistory {
        let mut history = PriceHistory::with_capacity(capacity);
        for &p in prices {
            history.push(p);
        }
        history
    }

    #[test]
    fn test_requires_full_window() {
        assert_eq!(predict_trend(&history_of(&[10.0, 20.0], 5), 3), Signal::Hold);
    }

    #[test]
    fn test_direction_from_endpoints() {
        assert_eq!(predict_trend(&history_of(&[10.0, 5.0, 11.0], 3), 3), Signal::Buy);
        assert_eq!(predict_trend(&history_of(&[10.0, 50.0, 9.0], 3), 3), Signal::Sell);
        assert_eq!(predict_trend(&history_of(&[10.0, 99.0, 10.0], 3), 3), Signal::Hold);
    }

    #[test]
    fn test_reference_is_window_back_not_oldest() {
        let history = history_of(&[1.0, 100.0, 10.0, 10.0, 12.0], 10);
        // history[-3] == 10.0, latest 12.0
        assert_eq!(predict_trend(&history, 3), Signal::Buy);
    }

    #[test]
    fn test_window_of_one_compares_latest_with_itself() {
        assert_eq!(predict_trend(&history_of(&[10.0, 20.0], 1), 1), Signal::Hold);
    }

    #[test]
    fn test_signal_sequence() {
        let prices = [10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 12.0, 11.0, 10.0];
        let mut strategy = TrendStrategy::new(3);
        let mut history = PriceHistory::with_capacity(strategy.required_history());
        let result: Vec<Signal> = prices
            .iter()
            .map(|&p| {
                history.push(p);
                strategy.evaluate(&history)
            })
            .collect();

        use Signal::*;
        assert_eq!(result, vec![Hold, Hold, Hold, Buy, Buy, Buy, Hold, Sell, Sell]);
    }
}
