//! Image Analysis MCP Server — entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use image_analysis::{CacheKind, ImageLoader, OpenAiBackend, PathGuard, ResultCache};

use image_analysis_mcp::config::{openai_config, probe_timeout, resolve_cache_path};
use image_analysis_mcp::protocol::ProtocolHandler;
use image_analysis_mcp::service::AnalysisService;
use image_analysis_mcp::tools::ToolRegistry;
use image_analysis_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "image-analysis-mcp",
    about = "MCP server that analyzes images by URL or local path with a vision model",
    version
)]
struct Cli {
    /// Path to the analysis cache file.
    #[arg(short, long, global = true)]
    cache: Option<String>,

    /// Vision model name (overrides OPENAI_MODEL).
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Print server capabilities and tools as JSON.
    Info,

    /// Show the cache file location and entry counts.
    Cache,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   image-analysis-mcp completions bash > ~/.local/share/bash-completion/completions/image-analysis-mcp
    ///   image-analysis-mcp completions zsh > ~/.zfunc/_image-analysis-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cache_path = resolve_cache_path(cli.cache.as_deref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let backend = OpenAiBackend::new(openai_config(cli.model.as_deref())?)?;
            let loader = ImageLoader::with_timeout(PathGuard::from_env()?, probe_timeout())?;

            let cache = Arc::new(ResultCache::new(&cache_path));
            let loading = Arc::clone(&cache);
            tokio::spawn(async move { loading.load().await });

            tracing::info!("Image Analysis MCP server");
            tracing::info!("Cache: {}", cache_path.display());

            let service = AnalysisService::new(cache, loader, Arc::new(backend));
            let handler = ProtocolHandler::new(Arc::new(service));
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Info => {
            let capabilities = image_analysis_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Cache => {
            let cache = ResultCache::open(&cache_path).await;
            println!("Cache file: {}", cache.path().display());
            println!("  Exists: {}", cache.path().exists());
            println!("  URL entries: {}", cache.len(CacheKind::Url));
            println!("  Path entries: {}", cache.len(CacheKind::Path));
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "image-analysis-mcp",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
