use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use evicting_map::{EvictionConfig, EvictionMap, TTL_ENV_VAR};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_TTL: Duration = Duration::from_millis(250);
const WORKERS: usize = 8;
const KEYS_PER_WORKER: usize = 1_000;

/// Hammers one shared map from several tasks, then waits out the TTL and
/// checks that everything was evicted.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evicting_map=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if std::env::var_os(TTL_ENV_VAR).is_some() {
        EvictionConfig::from_env().context("reading eviction config")?
    } else {
        EvictionConfig::new().with_ttl(DEFAULT_TTL)
    };
    let map: Arc<EvictionMap<String, String>> = Arc::new(EvictionMap::with_config(config)?);
    tracing::info!(ttl = ?map.ttl(), workers = WORKERS, "starting");

    let hits = Arc::new(AtomicUsize::new(0));
    let mut tasks = Vec::with_capacity(WORKERS);
    for worker in 0..WORKERS {
        let map = Arc::clone(&map);
        let hits = Arc::clone(&hits);
        tasks.push(tokio::spawn(async move {
            for i in 0..KEYS_PER_WORKER {
                let key = format!("worker{worker}:{i}");
                map.put(key.clone(), format!("value{i}"));
                if map.get(&key).is_some() {
                    hits.fetch_add(1, Ordering::Relaxed);
                }
                if i % 10 == 0 {
                    map.remove(&key);
                }
            }
        }));
    }
    for task in tasks {
        task.await.context("worker task panicked")?;
    }

    let live = map.len();
    tracing::info!(
        live,
        hits = hits.load(Ordering::Relaxed),
        next_expiry = ?map.time_to_next_expiry(),
        "writes finished"
    );

    match map.ttl() {
        Some(ttl) => {
            tokio::time::sleep(ttl).await;
            let left = map.len();
            tracing::info!(left, "after ttl elapsed");
            anyhow::ensure!(left == 0, "{left} entries outlived their ttl");
        }
        None => tracing::info!("entries never expire, skipping expiry check"),
    }

    Ok(())
}
