use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use webclone::core::{clone_site, failure_message, success_message, CloneError};
use webclone::env::EnvConfig;

#[derive(Parser, Debug)]
#[command(
    name = "webclone",
    version,
    about = "Save a rendered web page as a static folder that opens offline"
)]
struct Cli {
    /// Page to clone (http, https or file)
    url: String,

    /// Name of the output folder [default: cloned-<host>]
    folder: Option<String>,

    /// Directory that receives the clone folder
    #[arg(long, value_name = "DIR")]
    output_root: Option<PathBuf>,

    /// User-Agent sent by the browser and the asset fetcher
    #[arg(long)]
    user_agent: Option<String>,

    /// Per-asset timeout in seconds (1-300)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..=300))]
    timeout: Option<u64>,

    /// Navigation timeout in seconds (1-600)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..=600))]
    render_timeout: Option<u64>,

    /// Wait after scrolling, in milliseconds (0-60000)
    #[arg(long, value_name = "MILLIS", value_parser = clap::value_parser!(u64).range(0..=60_000))]
    settle_ms: Option<u64>,

    /// Fetch the raw HTML instead of rendering it in a headless browser
    #[arg(long)]
    no_render: bool,

    /// Path to the Chrome/Chromium executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Print the clone report as JSON instead of the summary line
    #[arg(long)]
    report: bool,

    /// Log every asset
    #[arg(short, long, conflicts_with = "silent")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    silent: bool,
}

fn init_logging(cli: &Cli, config: Option<&EnvConfig>) {
    let level = if cli.verbose {
        "debug"
    } else if cli.silent {
        "error"
    } else {
        config.map(|c| c.log_level.as_str()).unwrap_or("info")
    };
    let no_color = config.map(|c| c.no_color).unwrap_or(false);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("webclone={level}")))
        .with_ansi(!no_color)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli, config: EnvConfig) -> Result<String, CloneError> {
    let mut options = config.to_options();

    if let Some(output_root) = &cli.output_root {
        options.output_root = output_root.clone();
    }
    if let Some(user_agent) = &cli.user_agent {
        options.user_agent = user_agent.clone();
    }
    if let Some(seconds) = cli.timeout {
        options.fetch_timeout = Duration::from_secs(seconds);
    }
    if let Some(seconds) = cli.render_timeout {
        options.render_timeout = Duration::from_secs(seconds);
    }
    if let Some(millis) = cli.settle_ms {
        options.settle_delay = Duration::from_millis(millis);
    }
    if cli.no_render {
        options.render = false;
    }
    if let Some(chrome_path) = &cli.chrome_path {
        options.chrome_path = Some(chrome_path.clone());
    }

    let report = clone_site(&cli.url, cli.folder.as_deref(), &options)?;

    if cli.report {
        serde_json::to_string_pretty(&report).map_err(|e| CloneError::Io(e.into()))
    } else {
        Ok(success_message(&report.folder))
    }
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = EnvConfig::from_env();
    init_logging(&cli, config.as_ref().ok());

    let result = config
        .map_err(CloneError::from)
        .and_then(|config| run(&cli, config));

    let mut stdout = io::stdout();
    match result {
        Ok(message) => {
            writeln!(stdout, "{message}").ok();
        }
        Err(error) => {
            tracing::error!("clone failed: {error}");
            writeln!(stdout, "{}", failure_message(&error)).ok();
            process::exit(1);
        }
    }
}
