pub mod api;
pub mod background;
pub mod cache;
pub mod config;
pub mod db;
pub mod dedup;
pub mod entities;
pub mod error;
pub mod executor;
pub mod fingerprint;
pub mod models;
pub mod processor;
pub mod providers;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use db::Store;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder().label("app", "fetcharr")?;
        for (key, value) in &config.observability.loki_labels {
            if key != "app" {
                builder = builder.label(key, value)?;
            }
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config, prometheus_handle).await,

        "search" | "s" => {
            if args.len() < 3 {
                println!("Usage: fetcharr search <query>");
                return Ok(());
            }
            let query = args[2..].join(" ");
            cmd_search(&config, &query).await
        }

        "status" => {
            let id = args.get(2).map(String::as_str);
            cmd_status(&config, id).await
        }

        "cleanup" => {
            let max_age = args.get(2).and_then(|s| s.parse().ok());
            cmd_cleanup(&config, max_age).await
        }

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Fetcharr - Search Aggregation Service");
    println!("Fans queries out to search providers and consolidates the results");
    println!();
    println!("USAGE:");
    println!("  fetcharr <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  search <query>    Run a search and print the consolidated results");
    println!("  status [id]       Show a stored request, or recent pending requests");
    println!("  cleanup [secs]    Drop cache entries and requests older than secs");
    println!("  daemon            Run the HTTP API with background workers");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  fetcharr search \"diabetes treatment\"   # One-shot search");
    println!("  fetcharr status                          # Pending requests");
    println!("  fetcharr cleanup 86400                   # Drop entries older than a day");
    println!("  fetcharr daemon                          # Start the service");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure providers, timeouts, cache TTL, etc.");
}

async fn cmd_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let shared = Arc::new(SharedState::new(config.clone()).await?);

    let mut request = models::SearchRequest::new(query);
    request.providers = config.providers.default.clone();
    request.dedup = config.default_dedup_options();
    request
        .validate()
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    shared.store.create_request(&request).await?;

    println!("Searching: {}", query);
    println!("Providers: {}", request.providers.join(", "));
    println!();

    let outcome = shared
        .background
        .process_immediately(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    if outcome.unique_results.is_empty() {
        println!("No results.");
    } else {
        for (i, result) in outcome.unique_results.iter().enumerate() {
            println!("[{}] {} ({})", i + 1, result.title, result.provider);
            println!("    {}", result.url);
            if !result.snippet.is_empty() {
                println!("    {}", result.snippet.chars().take(120).collect::<String>());
            }
            println!();
        }
    }

    println!("{:-<70}", "");
    let source = if outcome.cache_hit { "cache" } else { "providers" };
    println!(
        "{} unique results ({} duplicates removed, served from {})",
        outcome.unique_results.len(),
        outcome.duplicates_removed,
        source
    );
    println!("Request ID: {}", request.id);

    shared.shutdown().await;
    Ok(())
}

async fn cmd_status(config: &Config, id: Option<&str>) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if let Some(id_str) = id {
        let id: uuid::Uuid = id_str.parse().context("Invalid request id")?;
        let Some(request) = store.get_request(id).await? else {
            println!("Request {} not found.", id);
            return Ok(());
        };

        println!("Request: {}", request.id);
        println!("{:-<70}", "");
        println!("Query:    {}", request.query);
        println!("Status:   {}", request.status.as_str());
        println!("Created:  {}", request.created_at.to_rfc3339());
        if let Some(count) = request.result_count {
            println!("Results:  {}", count);
        }
        if let Some(message) = &request.error_message {
            println!("Error:    {}", message);
        }

        let results = store.get_unique_results(id).await?;
        if !results.is_empty() {
            println!();
            for result in results.iter().take(10) {
                println!("  • {} ({})", result.title, result.provider);
                println!("    {}", result.url);
            }
            if results.len() > 10 {
                println!("  ... and {} more", results.len() - 10);
            }
        }
        return Ok(());
    }

    let pending = store
        .list_requests_by_status(models::RequestStatus::Pending)
        .await?;
    let processing = store
        .list_requests_by_status(models::RequestStatus::Processing)
        .await?;

    if pending.is_empty() && processing.is_empty() {
        println!("No pending or in-flight requests.");
        return Ok(());
    }

    println!(
        "Requests ({} pending, {} processing)",
        pending.len(),
        processing.len()
    );
    println!("{:-<70}", "");
    for request in processing.iter().chain(pending.iter()) {
        println!(
            "• [{}] {} ({})",
            request.status.as_str(),
            request.query,
            request.id
        );
    }

    Ok(())
}

async fn cmd_cleanup(config: &Config, max_age_seconds: Option<u64>) -> anyhow::Result<()> {
    let max_age = max_age_seconds.unwrap_or(24 * 60 * 60);

    let store = Store::new(&config.general.database_path).await?;
    let search_cache = cache::SearchCache::new(store.clone(), config.cache.ttl_seconds);

    let cache_removed = search_cache.cleanup(max_age).await?;

    #[allow(clippy::cast_possible_wrap)]
    let cutoff = (chrono::Utc::now() - chrono::Duration::seconds(max_age as i64)).to_rfc3339();
    let requests_removed = store.delete_requests_older_than(&cutoff).await?;

    println!("Cleanup complete!");
    println!("  Cache entries removed: {}", cache_removed);
    println!("  Requests removed:      {}", requests_removed);

    Ok(())
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Fetcharr v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    let api_state = api::create_app_state(shared.clone(), prometheus_handle);

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting Web API on port {}", port);

        let app = api::router(api_state).await;
        let addr = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("🌐 Web Server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    shared.shutdown().await;
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}
