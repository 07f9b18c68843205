//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use lekcjonarz_core::{CancellationToken, Extractor, ProgressReporter, run_discovery};
use lekcjonarz_crawler::PageFetcher;
use lekcjonarz_extract::read_page;
use lekcjonarz_shared::{
    AppConfig, CrawlConfig, ExtractConfig, HttpConfig, SiglaRules, config_file_path,
    init_config, load_config, load_config_from, render_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Lekcjonarz: crawl liturgia.wiara.pl and extract Mass readings as JSON.
#[derive(Parser)]
#[command(
    name = "lekcjonarz",
    version,
    about = "Crawl the liturgical reading navigator and extract daily readings into JSON files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.lekcjonarz/lekcjonarz.toml).
    #[arg(long, global = true, env = "LEKCJONARZ_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Crawl the navigator and write the Job Store.
    Discover {
        /// Job Store output path (defaults to `extract.jobs_file`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Site origin, e.g. a mirror or a local test server.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Fetch every job, extract its readings and write one JSON file per day.
    Extract {
        /// Job Store to read (defaults to `extract.jobs_file`).
        #[arg(short, long)]
        jobs: Option<PathBuf>,

        /// Output root directory (defaults to `extract.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Error manifest path (defaults to `extract.errors_file`).
        #[arg(long)]
        errors: Option<PathBuf>,

        /// Concurrent work units.
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Parse one saved HTML page and print its readings as JSON.
    Parse {
        /// HTML file to read.
        file: PathBuf,

        /// Source URL recorded in the output (defaults to the file path).
        #[arg(long)]
        url: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lekcjonarz=info",
        1 => "lekcjonarz=debug",
        _ => "lekcjonarz=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Discover { out, base_url } => {
            cmd_discover(config_path, out, base_url).await
        }
        Command::Extract {
            jobs,
            out,
            errors,
            concurrency,
        } => cmd_extract(config_path, jobs, out, errors, concurrency).await,
        Command::Parse { file, url } => cmd_parse(config_path, &file, url.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_discover(
    config_path: Option<&Path>,
    out: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if let Some(base_url) = base_url {
        config.site.base_url = base_url;
    }

    let crawl_config = CrawlConfig::try_from(&config)?;
    let fetcher = PageFetcher::new(&HttpConfig::from(&config))?;
    let out = out.unwrap_or_else(|| PathBuf::from(&config.extract.jobs_file));

    info!(root = %crawl_config.navigator_url, out = %out.display(), "discovering jobs");

    let reporter = CliProgress::new();
    let summary = run_discovery(&crawl_config, &fetcher, &out, &reporter).await?;

    println!();
    println!("  Discovery finished");
    println!("  Navigator pages: {}", summary.pages_scanned);
    if summary.nav_errors > 0 {
        println!("  Failed pages:    {}", summary.nav_errors);
    }
    println!("  Documents:       {}", summary.leaves);
    println!("  Jobs:            {}", summary.jobs);
    println!("  Job Store:       {}", summary.out.display());
    println!("  Time:            {:.1}s", summary.duration.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_extract(
    config_path: Option<&Path>,
    jobs: Option<PathBuf>,
    out: Option<PathBuf>,
    errors: Option<PathBuf>,
    concurrency: Option<usize>,
) -> Result<()> {
    let app = resolve_config(config_path)?;
    let mut config = ExtractConfig::from(&app);
    if let Some(jobs) = jobs {
        config.jobs_file = jobs;
    }
    if let Some(out) = out {
        config.output_dir = out;
    }
    if let Some(errors) = errors {
        config.errors_file = errors;
    }
    if let Some(concurrency) = concurrency {
        if concurrency == 0 {
            return Err(eyre!("--concurrency must be at least 1"));
        }
        config.concurrency = concurrency;
    }

    let fetcher = PageFetcher::new(&HttpConfig::from(&app))?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight work");
            on_signal.cancel();
        }
    });

    let reporter = CliProgress::new();
    let summary = Extractor::new(&config, &fetcher, &reporter)
        .run(&cancel)
        .await?;

    println!();
    println!("  Extraction finished");
    println!("  Jobs:       {}", summary.jobs);
    println!("  Days:       {}", summary.written.len());
    println!("  Failed:     {}", summary.failures.len());
    if summary.cancelled > 0 {
        println!("  Cancelled:  {}", summary.cancelled);
    }
    println!("  Output:     {}", config.output_dir.display());
    println!("  Manifest:   {}", summary.manifest.display());
    println!("  Time:       {:.1}s", summary.duration.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_parse(config_path: Option<&Path>, file: &Path, url: Option<&str>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let rules = SiglaRules::from(&config.heuristics);

    let html = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("cannot read {}", file.display()))?;
    let source = url
        .map(String::from)
        .unwrap_or_else(|| file.display().to_string());

    let page = read_page(&html, &rules)?;
    info!(file = %file.display(), layout = %page.layout, blocks = page.blocks.len(), "page parsed");

    let day = page.into_day(source);
    println!("{}", serde_json::to_string_pretty(&day)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = config_file_path()?;
    if path.exists() {
        return Err(eyre!(
            "config already exists at {}; remove it first to regenerate",
            path.display()
        ));
    }
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    println!("{}", render_config(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: a spinner that turns into a bar once the unit count is known.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn planned(&self, units: usize) {
        self.bar.set_length(units as u64);
        self.bar.set_position(0);
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30}] {pos}/{len} {wide_msg}")
                .unwrap()
                .progress_chars("=> "),
        );
    }

    fn job_started(&self, url: &str) {
        self.bar.set_message(url.to_string());
    }

    fn job_failed(&self, url: &str, error: &str) {
        self.bar.println(format!("  failed: {url} ({error})"));
    }

    fn unit_finished(&self, _label: &str) {
        self.bar.inc(1);
    }

    fn done(&self, message: &str) {
        self.bar.finish_and_clear();
        info!("{message}");
    }
}
