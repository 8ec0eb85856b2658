//! Trading loop
//!
//! Polls one symbol on a fixed interval, feeds each price to a strategy and
//! gates the resulting signal by the current position. Cycles run strictly
//! one after another on a single task.

use crate::config::{Config, Iterations, PositionPolicy};
use crate::errors::{ApiError, OrderError};
use crate::history::PriceHistory;
use crate::market_data::PriceFeed;
use crate::orders::OrderPlacer;
use crate::strategies::SignalStrategy;
use crate::types::{OrderResult, Position, Side, Signal};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Loop parameters fixed at startup
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub symbol: String,
    pub usd_amount: f64,
    pub interval: Duration,
    pub iterations: Iterations,
    pub position_policy: PositionPolicy,
}

impl LoopSettings {
    pub fn from_config(config: &Config, interval: Duration) -> Self {
        Self {
            symbol: config.trading.symbol.clone(),
            usd_amount: config.trading.usd_amount,
            interval,
            iterations: config.trading.iterations,
            position_policy: config.trading.position_policy,
        }
    }
}

/// What a single cycle did
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Price fetch failed; history, signal and position untouched
    PriceUnavailable(ApiError),
    /// No actionable signal this cycle
    Held { price: f64, signal: Signal },
    /// Order accepted by the trading API
    Ordered { side: Side, order: OrderResult },
    /// Order attempt failed
    OrderFailed { side: Side, error: OrderError },
}

/// Counters over a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u32,
    pub orders_placed: u32,
    pub orders_failed: u32,
    pub fetch_failures: u32,
}

impl LoopSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::PriceUnavailable(_) => self.fetch_failures += 1,
            CycleOutcome::Held { .. } => {}
            CycleOutcome::Ordered { .. } => self.orders_placed += 1,
            CycleOutcome::OrderFailed { .. } => self.orders_failed += 1,
        }
    }
}

pub struct TradingLoop {
    settings: LoopSettings,
    feed: Arc<dyn PriceFeed>,
    orders: Arc<dyn OrderPlacer>,
    strategy: Box<dyn SignalStrategy>,
    history: PriceHistory,
    position: Position,
}

impl TradingLoop {
    pub fn new(
        settings: LoopSettings,
        feed: Arc<dyn PriceFeed>,
        orders: Arc<dyn OrderPlacer>,
        strategy: Box<dyn SignalStrategy>,
    ) -> Self {
        let history = PriceHistory::with_capacity(strategy.required_history());
        Self {
            settings,
            feed,
            orders,
            strategy,
            history,
            position: Position::Flat,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    /// Run cycles until the iteration bound is reached (forever if unbounded)
    pub async fn run(&mut self) -> LoopSummary {
        info!(
            "Starting {} loop on {} (${} per order, every {:?}, {:?})",
            self.strategy.name(),
            self.settings.symbol,
            self.settings.usd_amount,
            self.settings.interval,
            self.settings.iterations
        );

        let mut summary = LoopSummary::default();
        while self.settings.iterations.allows(summary.cycles) {
            let outcome = self.run_cycle().await;
            summary.record(&outcome);

            // No sleep once the last bounded cycle is done
            if self.settings.iterations.allows(summary.cycles) {
                tokio::time::sleep(self.settings.interval).await;
            }
        }

        info!(
            "Loop finished: {} cycles, {} orders placed, {} failed, {} fetch failures",
            summary.cycles, summary.orders_placed, summary.orders_failed, summary.fetch_failures
        );
        summary
    }

    /// One fetch, evaluate, gate and maybe order step
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let symbol = self.settings.symbol.as_str();

        let price = match self.feed.fetch_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Error fetching price for {}: {}", symbol, e);
                return CycleOutcome::PriceUnavailable(e);
            }
        };

        self.history.push(price);
        let signal = self.strategy.evaluate(&self.history);
        info!("Price {}: {} | signal {} | position {}", symbol, price, signal, self.position);

        let side = match signal.side() {
            Some(side) if side == self.position.actionable_side() => side,
            Some(side) => {
                debug!("Ignoring {} signal while {}", side, self.position);
                return CycleOutcome::Held { price, signal };
            }
            None => return CycleOutcome::Held { price, signal },
        };

        match self
            .orders
            .place_market_order(symbol, side, self.settings.usd_amount)
            .await
        {
            Ok(order) => {
                self.position = self.position.after(side);
                info!(
                    "{} order placed for {}: id={} status={} -> {}",
                    side, symbol, order.order_id, order.status, self.position
                );
                CycleOutcome::Ordered { side, order }
            }
            Err(error) => {
                if self.settings.position_policy == PositionPolicy::Optimistic {
                    self.position = self.position.after(side);
                }
                warn!(
                    "{} order failed for {}: {} (position {})",
                    side, symbol, error, self.position
                );
                CycleOutcome::OrderFailed { side, error }
            }
        }
    }
}
