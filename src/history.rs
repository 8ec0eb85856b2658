//! Bounded price history for one symbol

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
struct Sample {
    price: f64,
    /// Decimal value of the shortest representation of `price`
    exact: Option<Decimal>,
}

impl Sample {
    fn new(price: f64) -> Self {
        Self {
            price,
            exact: Decimal::from_str(&price.to_string()).ok(),
        }
    }
}

/// Append-only window over the most recent prices.
///
/// Strategies only ever read the last `capacity` samples, so older samples
/// are dropped as new ones arrive. Averages are computed in decimal so that
/// equal averages compare equal.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl PriceHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, price: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample::new(price));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|s| s.price)
    }

    /// Sample `n` positions from the end; `from_end(1)` is the latest
    pub fn from_end(&self, n: usize) -> Option<f64> {
        if n == 0 || n > self.samples.len() {
            return None;
        }
        self.samples.get(self.samples.len() - n).map(|s| s.price)
    }

    /// Arithmetic mean of the last `n` samples, if that many exist.
    ///
    /// For display; use [`PriceHistory::compare_means`] to order two means.
    pub fn mean_of_last(&self, n: usize) -> Option<f64> {
        if n == 0 || n > self.samples.len() {
            return None;
        }
        Some(self.float_mean_of_last(n))
    }

    /// Ordering of the mean of the last `a` samples against the mean of the last `b`
    pub fn compare_means(&self, a: usize, b: usize) -> Option<Ordering> {
        if a == 0 || b == 0 || a > self.samples.len() || b > self.samples.len() {
            return None;
        }

        // sum_a / a against sum_b / b, cross-multiplied to avoid division
        let exact = self.exact_sum_of_last(a).zip(self.exact_sum_of_last(b)).and_then(|(sum_a, sum_b)| {
            let lhs = sum_a.checked_mul(Decimal::from(b as u64))?;
            let rhs = sum_b.checked_mul(Decimal::from(a as u64))?;
            Some(lhs.cmp(&rhs))
        });

        // Prices outside decimal range
        exact.or_else(|| {
            self.float_mean_of_last(a)
                .partial_cmp(&self.float_mean_of_last(b))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter().map(|s| &s.price)
    }

    fn last(&self, n: usize) -> impl Iterator<Item = &Sample> {
        self.samples.iter().skip(self.samples.len() - n)
    }

    fn exact_sum_of_last(&self, n: usize) -> Option<Decimal> {
        self.last(n)
            .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.exact?))
    }

    /// Averages offsets from the latest sample so identical samples return
    /// that sample unchanged.
    fn float_mean_of_last(&self, n: usize) -> f64 {
        let reference = self.latest().unwrap_or_default();
        let offset: f64 = self.last(n).map(|s| s.price - reference).sum();
        reference + offset / n as f64
    }
}
