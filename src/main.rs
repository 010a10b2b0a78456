mod commands;
mod core;
mod impact;
mod release;
mod ui;

use clap::{Parser, Subcommand};
use crate::core::error::{GantryError, print_error};

/// Build-impact detection and release automation for CI monorepos
#[derive(Parser)]
#[command(name = "gantry")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Gantry {
  /// Increase verbosity (-v debug, -vv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Quiet mode (suppress non-error output)
  #[arg(short, long)]
  quiet: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Decide which packages the current pipeline has to build
  Build {
    /// Kind of build the pipeline runs: feature, stage, prod, tag
    #[arg(long, default_value = "feature")]
    build: String,

    /// Language ecosystem for dependency resolution: go, node
    /// (defaults to [build] repo_type from gantry.toml)
    #[arg(long)]
    repo_type: Option<String>,

    /// Git ref to compare against (overrides the CI-derived ref)
    #[arg(long)]
    since: Option<String>,

    /// Output format: text (default), json, names
    #[arg(long, default_value = "text")]
    format: String,

    /// Show what would be analyzed without resolving dependencies
    #[arg(long)]
    dry_run: bool,
  },

  /// Bump the version, update the changelog, tag and back-merge
  Bump {
    /// Project type with extra version handling (android)
    #[arg(long)]
    project: Option<String>,

    /// Secondary version file bumped alongside the primary one
    #[arg(long)]
    config_file: Option<std::path::PathBuf>,

    /// Merge request labels driving the bump size (bump-major, bump-minor)
    #[arg(long, env = "CI_MERGE_REQUEST_LABELS", value_delimiter = ',')]
    labels: Vec<String>,

    /// Skip merging the release back into the develop branch
    #[arg(long)]
    no_git_flow: bool,

    /// Show the release plan without executing it
    #[arg(long)]
    dry_run: bool,
  },

  /// Write a starter gantry.toml configuration
  Init,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Gantry::parse();

  let log_level = match cli.verbose {
    0 if cli.quiet => tracing::Level::ERROR,
    0 => tracing::Level::INFO,
    1 => tracing::Level::DEBUG,
    _ => tracing::Level::TRACE,
  };

  // Logs go to stderr; stdout is reserved for command output that CI
  // scripts parse (names and json formats).
  tracing_subscriber::fmt()
    .with_max_level(log_level)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: cannot determine the working directory: {}", e);
      std::process::exit(1);
    }
  };

  // Build pipeline context once (captures CI environment, loads config)
  let ctx = match core::context::PipelineContext::build(&root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Build {
      build,
      repo_type,
      since,
      format,
      dry_run,
    } => commands::run_build(&ctx, build, repo_type, since, format, dry_run),
    Commands::Bump {
      project,
      config_file,
      labels,
      no_git_flow,
      dry_run,
    } => commands::run_bump(&ctx, project, config_file, labels, no_git_flow, dry_run),
    Commands::Init => commands::run_init(&ctx),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: GantryError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
