//! strata CLI - client for the Strata data platform.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;

use display::Format;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Client for the Strata data platform", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// API key (defaults to the STRATA_API_KEY environment variable)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stream metadata and schema
    Info {
        /// Stream key, or unique label with --label
        stream: String,

        /// Treat the stream argument as a unique label
        #[arg(short, long)]
        label: bool,
    },

    /// Download stream data
    Download {
        /// Stream key, or unique label with --label
        stream: String,

        /// Treat the stream argument as a unique label
        #[arg(short, long)]
        label: bool,

        /// Restrict the download to these columns (repeatable)
        #[arg(short = 'F', long = "field")]
        fields: Vec<String>,

        /// Rows to skip (requires --limit)
        #[arg(long, requires = "limit")]
        skip: Option<u64>,

        /// Row limit (requires --skip)
        #[arg(long, requires = "skip")]
        limit: Option<u64>,

        /// Bypass the local page cache
        #[arg(long)]
        live: bool,

        /// Output file path. Defaults to <stream>.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write one part file per page under <dir>/<key>/data/ instead
        #[arg(long, conflicts_with = "output")]
        output_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Maximum concurrent page downloads
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Overwrite existing output without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Download rows added since a data version
    Delta {
        /// Stream key, or unique label with --label
        stream: String,

        /// Treat the stream argument as a unique label
        #[arg(short, long)]
        label: bool,

        /// The data version (UUID) to diff against
        version: String,

        /// Bypass the local cache
        #[arg(long)]
        live: bool,

        /// Output file path. Defaults to stdout as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Overwrite existing output without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Invoke a data service
    Invoke {
        /// Service key
        service: String,

        /// Input parameter as name=value (repeatable; value parsed as JSON,
        /// falling back to a plain string)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Cache invocation results for this many minutes
        #[arg(long, default_value = "0")]
        cache_minutes: u64,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// List all data sources
    Sources,
}

/// Filter directive for a `-v` count; library targets share the `strata`
/// prefix, so everything below `hyper` and friends stays quiet.
fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "strata=info",
        2 => "strata=debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Info { stream, label } => {
            commands::info::show_info(&cli.api_key, &cli.base_url, &stream, label).await
        }
        Commands::Download {
            stream,
            label,
            fields,
            skip,
            limit,
            live,
            output,
            output_dir,
            format,
            concurrency,
            yes,
        } => {
            commands::download::download(commands::download::DownloadArgs {
                api_key: cli.api_key,
                base_url: cli.base_url,
                stream,
                label,
                fields,
                skip,
                limit,
                live,
                output,
                output_dir,
                format,
                concurrency,
                yes,
                quiet: cli.quiet,
            })
            .await
        }
        Commands::Delta {
            stream,
            label,
            version,
            live,
            output,
            format,
            yes,
        } => {
            commands::delta::delta(
                &cli.api_key,
                &cli.base_url,
                &stream,
                label,
                &version,
                live,
                output,
                format,
                yes,
            )
            .await
        }
        Commands::Invoke {
            service,
            params,
            cache_minutes,
            pretty,
        } => {
            commands::invoke::invoke(
                &cli.api_key,
                &cli.base_url,
                &service,
                &params,
                cache_minutes,
                pretty,
            )
            .await
        }
        Commands::Sources => commands::sources::list_sources(&cli.api_key, &cli.base_url).await,
    }
}
