//! Crypto Trading Bot CLI
//!
//! Runs one of the automated strategies, or performs a single quote or
//! order call against the trading API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use crypto_trader::{
    BrokerClient, Config, Iterations, LoopSettings, MarketDataClient, OrderClient, PriceFeed, Side,
    StrategyKind, TradingLoop,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "crypto-trader")]
#[command(about = "Automated crypto trading with moving-average crossover and trend strategies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a trading loop
    Run {
        /// Strategy to trade with
        #[arg(short, long, value_enum)]
        strategy: StrategyKind,

        /// Trading pair (overrides TRADE_SYMBOL)
        #[arg(long)]
        symbol: Option<String>,

        /// USD notional per order (overrides TRADE_USD_AMOUNT)
        #[arg(long)]
        usd_amount: Option<f64>,

        /// Seconds between cycles (overrides the strategy interval)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many cycles (overrides TRADE_ITERATIONS)
        #[arg(short = 'n', long)]
        iterations: Option<u32>,

        /// Short moving average window (crossover)
        #[arg(long)]
        short_window: Option<usize>,

        /// Long moving average window (crossover)
        #[arg(long)]
        long_window: Option<usize>,

        /// Lookback window (trend)
        #[arg(long)]
        window: Option<usize>,
    },

    /// Show the current best bid/ask
    Price {
        #[arg(long, default_value = "BTC-USD")]
        symbol: String,
    },

    /// Place a single market order
    Order {
        #[arg(long)]
        symbol: String,

        /// buy or sell
        #[arg(long)]
        side: Side,

        #[arg(long)]
        usd_amount: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Run {
            strategy,
            symbol,
            usd_amount,
            interval,
            iterations,
            short_window,
            long_window,
            window,
        } => {
            if let Some(symbol) = symbol {
                config.trading.symbol = symbol;
            }
            if let Some(usd_amount) = usd_amount {
                config.trading.usd_amount = usd_amount;
            }
            if iterations.is_some() {
                config.trading.iterations = Iterations::from_option(iterations);
            }
            if let Some(short_window) = short_window {
                config.crossover.short_window = short_window;
            }
            if let Some(long_window) = long_window {
                config.crossover.long_window = long_window;
            }
            if let Some(window) = window {
                config.trend.window = window;
            }
            config.validate()?;

            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| strategy.interval(&config));
            run_loop(&config, strategy, interval).await?
        }
        Commands::Price { symbol } => show_price(&config, &symbol).await?,
        Commands::Order { symbol, side, usd_amount } => {
            place_order(&config, &symbol, side, usd_amount).await?
        }
    }

    Ok(())
}

async fn run_loop(config: &Config, kind: StrategyKind, interval: Duration) -> Result<()> {
    let strategy = kind.build(config);

    println!("\n{}", "=".repeat(70));
    println!("  {} TRADER", strategy.name().to_uppercase());
    println!(
        "  Symbol: {} | ${} per order | Interval: {}s | Iterations: {:?}",
        config.trading.symbol,
        config.trading.usd_amount,
        interval.as_secs(),
        config.trading.iterations
    );
    println!("  API: {}", config.base_url);
    println!("{}\n", "=".repeat(70));

    let broker = Arc::new(BrokerClient::from_config(config)?);
    let feed: Arc<dyn PriceFeed> = Arc::new(MarketDataClient::new(broker.clone()));
    let orders = Arc::new(OrderClient::new(broker, feed.clone(), config.trading.quote_pricing));

    let settings = LoopSettings::from_config(config, interval);
    let mut trader = TradingLoop::new(settings, feed, orders, strategy);
    let summary = trader.run().await;

    println!("\n{}", "-".repeat(70));
    println!(
        "Cycles: {} | Orders placed: {} | Orders failed: {} | Price fetch failures: {} | Final position: {}",
        summary.cycles,
        summary.orders_placed,
        summary.orders_failed,
        summary.fetch_failures,
        trader.position()
    );

    Ok(())
}

async fn show_price(config: &Config, symbol: &str) -> Result<()> {
    let broker = Arc::new(BrokerClient::from_config(config)?);
    let client = MarketDataClient::new(broker);

    let quote = client.fetch_quote(symbol).await?;
    println!("{}", quote.symbol);
    println!("  Ask: {}", quote.ask);
    match quote.bid {
        Some(bid) => println!("  Bid: {}", bid),
        None => println!("  Bid: -"),
    }

    Ok(())
}

async fn place_order(config: &Config, symbol: &str, side: Side, usd_amount: f64) -> Result<()> {
    let broker = Arc::new(BrokerClient::from_config(config)?);
    let feed = Arc::new(MarketDataClient::new(broker.clone()));
    let orders = OrderClient::new(broker, feed, config.trading.quote_pricing);

    let result = orders.submit(&symbol.to_uppercase(), side, usd_amount).await?;
    info!("Order {} is {}", result.order_id, result.status);
    println!("Order placed: id={} status={}", result.order_id, result.status);

    Ok(())
}
