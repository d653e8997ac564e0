use price_feed_sdk::{FeedConfig, PriceFeed};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "price_feed_sdk=info".into()),
        )
        .init();

    println!("Price Feed Failover Example");
    println!("===========================");

    // Point COINGECKO_BASE_URL at something unreachable to watch the feed
    // fail over to Chainlink.
    let config = FeedConfig::from_env()?;
    let mut feed = PriceFeed::from_config(&config).await?;

    if let Some(active) = feed.active_provider() {
        println!("Active provider: {}", active.name());
    }

    for _ in 0..5 {
        match feed.get_price("ETH/USD").await {
            Ok(quote) => println!(
                "{:<10} ${:<12.2} (via {}, age {:?})",
                quote.symbol,
                quote.price,
                feed.active_provider().map(|p| p.name()).unwrap_or("-"),
                quote.age()
            ),
            Err(e) => {
                eprintln!("Error: {e}");
                if feed.recover().await.is_err() {
                    eprintln!("No provider is healthy, giving up");
                    break;
                }
            }
        }
        sleep(Duration::from_secs(2)).await;
    }

    println!("\n{:-<50}", "");
    for metrics in feed.provider_metrics().await {
        println!(
            "{:<10} requests={} failed={} p50={:.0}ms",
            metrics.provider_name,
            metrics.total_requests,
            metrics.failed_requests,
            metrics.latency_p50_ms
        );
    }
    println!("Failovers: {}", feed.failover_count());

    Ok(())
}
