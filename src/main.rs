use clap::{Parser, Subcommand};
use folio::{compose, config, output, pipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Content compiler for a hand-built static site")]
#[command(long_about = "\
Content compiler for a hand-built static site

Markdown posts are rendered into hand-written page templates, section
listings are kept in sync with the posts, and the site shell is assembled
from its section fragments.

Site structure:

  site/
  ├── site.toml                        # Optional config (see gen-config)
  ├── markdown/
  │   ├── night-walk.md                # Front matter, blank line, body
  │   └── _draft.md                    # Leading _ or . = ignored
  ├── posts/
  │   ├── art/_single-template.html    # Single-image layout template
  │   ├── art/_gallery-template.html   # Gallery layout template
  │   └── <section>/<slug>.html        # Generated pages
  ├── sections/
  │   └── art.html                     # Fragment; listing between md-posts markers
  ├── index.template.html              # Shell with {{section:<id>}} placeholders
  └── index.html                       # Generated shell

Front matter keys:
  title, date, section, type (single|gallery), label, summary, post-to-site

Run 'folio gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log per-document progress (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile posts and rebuild section listings
    Build {
        /// Also write the build report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Assemble the site shell from its section fragments
    Compose,
    /// Build, then compose
    All {
        /// Also write the build report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Compile everything in memory without writing files
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ok = match cli.command {
        Command::Build { report } => run_build(&cli.root, report.as_deref())?,
        Command::Compose => {
            let config = config::load_config(&cli.root)?;
            let report = compose::compose_site(&cli.root, &config)?;
            output::print_compose_output(&report, &cli.root);
            true
        }
        Command::All { report } => {
            let ok = run_build(&cli.root, report.as_deref())?;
            println!();
            let config = config::load_config(&cli.root)?;
            let composed = compose::compose_site(&cli.root, &config)?;
            output::print_compose_output(&composed, &cli.root);
            ok
        }
        Command::Check => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            println!("==> Checking {}", cli.root.display());
            let report = pipeline::check(&cli.root, &config)?;
            output::print_build_output(&report, &cli.root);
            if report.is_success() {
                println!("==> Content is valid");
            }
            report.is_success()
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Build the site; returns whether every document compiled.
fn run_build(root: &Path, report_path: Option<&Path>) -> Result<bool, Box<dyn std::error::Error>> {
    let config = config::load_config(root)?;
    init_thread_pool(&config.processing);

    println!("==> Building {}", root.display());
    let report = pipeline::build(root, &config)?;
    output::print_build_output(&report, root);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)?;
    }
    Ok(report.is_success())
}

/// `RUST_LOG` wins when set; otherwise warnings, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "folio=debug" } else { "folio=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
