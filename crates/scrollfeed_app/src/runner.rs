use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use feed_logging::{feed_info, feed_warn};
use scrollfeed_core::{AdaptiveConfigResolver, StaticProbe};
use scrollfeed_engine::{CachingProvider, FetchCoordinator, HttpContentProvider, PageCache};

use crate::settings::load_settings;
use crate::Args;

/// Environment variable holding an optional bearer token for the endpoint.
const TOKEN_VAR: &str = "SCROLLFEED_TOKEN";

pub(crate) async fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = load_settings(&args.settings)?;
    if let Some(content_type) = args.content_type {
        settings.content_type = content_type;
    }
    if let Ok(token) = std::env::var(TOKEN_VAR) {
        settings.http.bearer_token = Some(token);
    }

    let probe = if args.narrow {
        StaticProbe::narrow()
    } else {
        StaticProbe::default()
    }
    .with_connection(args.connection);
    let config = AdaptiveConfigResolver::new(probe)
        .resolve(settings.content_type, &settings.overrides)
        .context("resolving paging configuration")?;
    feed_info!(
        "{} list: page_size={} threshold={} root_margin={} debounce={}ms",
        settings.content_type,
        config.page_size,
        config.threshold,
        config.root_margin,
        config.debounce_ms
    );

    let http = HttpContentProvider::new(&args.url, settings.http.clone())
        .with_context(|| format!("invalid endpoint {}", args.url))?;
    let cache = PageCache::new(Duration::from_secs(settings.cache_ttl_secs));
    let provider = Arc::new(CachingProvider::new(http, cache));

    let mut coordinator = FetchCoordinator::new(
        provider.clone(),
        config,
        settings.content_type.default_schema(),
    )
    .with_memory_policy(settings.memory.policy(config.page_size))
    .with_thresholds(settings.thresholds);
    let (mut sentinel, mut events) = coordinator.attach_sentinel();

    if let Err(err) = coordinator.load_initial().await {
        feed_warn!("initial load failed: {}", err);
        anyhow::bail!(err.user_message());
    }

    // Each page scrolls the sentinel into view and back out.
    for _ in 1..args.pages {
        if !coordinator.state().has_more() {
            break;
        }
        sentinel.intersection(true);
        coordinator.drain_events(&mut events);
        coordinator.settle().await;
        sentinel.intersection(false);

        if let Some(err) = coordinator.state().last_error() {
            feed_warn!("stopping after failed page: {}", err);
            break;
        }
    }
    sentinel.detach();

    let view = coordinator.view();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in &view.rows {
        writeln!(out, "{}", serde_json::to_string(row)?)?;
    }

    let summary = coordinator.recorder().summary();
    feed_info!(
        "{} page(s), {} item(s) in memory, has_more={}",
        view.page,
        view.total_in_memory,
        view.has_more
    );
    feed_info!(
        "{} load(s), avg {}ms, cache hit rate {:.1}% ({} hits), {} warning(s)",
        summary.loads,
        summary.average_latency.as_millis(),
        provider.stats().hit_rate(),
        provider.stats().hits,
        summary.warnings
    );
    if let Some(message) = view.error_message {
        eprintln!("{message}");
    }
    Ok(())
}
