//! CLI entrypoint for parley
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use parley_application::{ConversationStore, Orchestrator};
use parley_domain::ToolRegistry;
use parley_infrastructure::{
    ConfigIssue, ConfigLoader, DateTimeProvider, FileConfig, InMemoryConversationStore,
    JsonlConversationLogger, JsonlConversationStore, MathProvider, OllamaBackend, Severity,
    StoreKind, TaskBook, TaskProvider, ToolDiscovery, WeatherProvider,
};
use parley_presentation::{ChatRepl, Cli, ProgressReporter};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, &config);

    info!("Starting parley");
    report_issues(&config.validate());

    // === Dependency Injection ===
    let (mut settings, _) = config.backend.to_ollama_settings();
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    info!("Using model '{}' at {}", settings.model, settings.host);
    let backend = Arc::new(OllamaBackend::new(settings)?);

    let registry = Arc::new(discover_tools(&config).await?);

    let store: Arc<dyn ConversationStore> = match config.conversation.parse_store().0 {
        StoreKind::Memory => Arc::new(InMemoryConversationStore::new()),
        StoreKind::Jsonl { dir } => {
            info!("Persisting conversations under {}", dir.display());
            Arc::new(JsonlConversationStore::new(dir))
        }
    };

    let mut orchestrator = Orchestrator::new(backend, registry, config.to_orchestrator_config())
        .with_store(store);

    if let Some(path) = config.logging.conversation_log_path()
        && let Some(logger) = JsonlConversationLogger::try_open(&path)
    {
        orchestrator = orchestrator.with_conversation_logger(Arc::new(logger));
    }

    let show_progress = !cli.quiet && config.repl.show_progress;
    let reporter = Arc::new(ProgressReporter::new());
    if show_progress {
        orchestrator = orchestrator.with_progress(reporter.clone());
    }

    let conversation_id = cli
        .conversation
        .clone()
        .unwrap_or_else(|| config.repl.conversation_id.clone());

    let mut repl = ChatRepl::new(Arc::new(orchestrator), conversation_id)
        .with_stream(!cli.no_stream && config.repl.stream)
        .with_history_file(config.repl.history_path());
    if show_progress {
        repl = repl.with_progress(reporter);
    }

    match cli.message {
        Some(message) => {
            repl.send(&message).await?;
        }
        None => repl.run().await?,
    }

    Ok(())
}

/// Initialize tracing: stderr always, plus a daily file when `log_dir` is set.
///
/// `-v` wins over `RUST_LOG`, which wins over `[logging] level`.
fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.logging.level.as_deref().unwrap_or("warn"))
        }),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match config.logging.log_dir_path() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "parley.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn report_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Error => error!("Config: {}", issue),
            Severity::Warning => warn!("Config: {}", issue),
        }
    }
}

/// Register the enabled built-in providers and collect their tools
async fn discover_tools(config: &FileConfig) -> Result<ToolRegistry> {
    let tools = &config.tools;
    let mut discovery = ToolDiscovery::new();

    if tools.is_enabled("math") {
        discovery = discovery.register(MathProvider);
    }

    if tools.is_enabled("tasks") {
        let book = match tools.tasks.file_path() {
            Some(path) => TaskBook::open(path.clone())
                .with_context(|| format!("Failed to open task file {}", path.display()))?,
            None => TaskBook::in_memory(),
        };
        discovery = discovery.register(TaskProvider::new(Arc::new(book)));
    }

    if tools.is_enabled("datetime") {
        discovery = discovery.register(DateTimeProvider::with_format(
            tools.datetime.format.clone(),
        ));
    }

    if tools.is_enabled("weather") {
        let (settings, _) = tools.weather.to_settings();
        discovery = discovery.register(WeatherProvider::new(settings));
    }

    let registry = discovery.discover().await;
    let stats = discovery.stats();
    info!(
        "Registered {} tool(s) from {} provider(s)",
        stats.total_tools, stats.total_providers
    );
    Ok(registry)
}
