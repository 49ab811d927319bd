//! Example demonstrating a remote release document with polling.
//!
//! Run with the URL of a JSON release document:
//!
//! ```text
//! cargo run --example remote_polling -- https://config.example.com/releases.json
//! ```

use feature_release::core::Reason;
use feature_release::prelude::*;
use feature_release::sources::HttpFetcher;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Remote Release Example ===\n");

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://config.example.com/releases.json".to_string());

    let fetcher = HttpFetcher::builder()
        .with_timeout(Duration::from_secs(5))
        .build()?;

    let release = init_feature_release_remote(
        FeatureRelease::remote(&url)
            .with_fetcher(fetcher)
            .with_polling(true)
            .with_polling_interval_secs(5),
    )
    .await?;

    println!("✓ Release document loaded from {}", url);
    println!("  Flags: {}", release.config().len());
    println!("  Polling every {:?}", release.polling_interval());
    println!();

    for round in 0..3 {
        println!("Round {}", round + 1);
        println!("--------");

        let config = release.config();
        let mut flags: Vec<_> = config.flags().map(|(name, _)| name).collect();
        flags.sort();

        for flag in flags {
            for user in ["user-1", "user-2", "user-3"] {
                let evaluation = release.evaluate(flag, user, Some("production"));
                let reason = match evaluation.reason {
                    Reason::IndividualTarget => "target".to_string(),
                    Reason::Percentage { bucket } => format!("bucket {}", bucket),
                    Reason::UnknownFlag => "unknown".to_string(),
                    Reason::NoMatchingRule => "no rule".to_string(),
                };
                println!("  {:<24} {:<8} {:<5} ({})", flag, user, evaluation.enabled, reason);
            }
        }
        println!();

        tokio::time::sleep(Duration::from_secs(6)).await;
    }

    release.stop_polling().await;
    println!("✓ Polling stopped");

    Ok(())
}
