use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use console::style;
use std::path::PathBuf;

use tome_config::ConfigLoader;

mod setup;
mod skills;

/// 📚 Tome — pick the right skill bundles for an assistant's context
#[derive(Parser)]
#[command(name = "tome", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to tome.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered skill bundles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a bundle's summary and detail topics
    Show {
        name: String,
        /// Also print every detail document
        #[arg(long)]
        details: bool,
    },
    /// Rank bundles for a task description
    Match {
        /// Task description (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Select bundles for a task and print the loaded context
    Load {
        /// Task description (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
        /// Extra detail documents to load, as bundle/topic
        #[arg(short, long, value_parser = parse_detail_key)]
        detail: Vec<(String, String)>,
        /// Output the selection report and context as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check bundles for orphan detail documents and broken links
    Validate,
    /// Scaffold a new skill bundle in the first skills directory
    Create { name: String },
    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a starter tome.toml in the current or home directory
    Init {
        /// Create in current directory instead of ~/.tome/
        #[arg(long)]
        local: bool,
    },
    /// Show version and build info
    Version,
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse "bundle/topic" CLI arguments.
fn parse_detail_key(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('/') {
        Some((bundle, topic)) if !bundle.is_empty() && !topic.is_empty() => {
            Ok((bundle.to_string(), topic.to_string()))
        }
        _ => Err(format!("invalid BUNDLE/TOPIC: `{s}`")),
    }
}

impl Cli {
    pub fn run(self) -> tome_core::Result<()> {
        // `init` and `completions` must work without a valid config.
        match &self.command {
            Commands::Init { local } => return setup::cmd_init(*local),
            Commands::Completions { shell } => return Self::cmd_completions(*shell),
            Commands::Version => return Self::cmd_version(),
            _ => {}
        }

        // Load config first so we can use it for log format
        let loader = ConfigLoader::load(self.config.as_deref())?;

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level
                .as_deref()
                .unwrap_or(loader.get().logging.level.as_str())
        };
        init_tracing(log_level, &loader.get().logging.format);

        match self.command {
            Commands::List { json } => skills::cmd_list(&loader, json),
            Commands::Show { name, details } => skills::cmd_show(&loader, &name, details),
            Commands::Match { task, json } => skills::cmd_match(&loader, &task.join(" "), json),
            Commands::Load { task, detail, json } => {
                skills::cmd_load(&loader, &task.join(" "), &detail, json)
            }
            Commands::Validate => skills::cmd_validate(&loader),
            Commands::Create { name } => skills::cmd_create(&loader, &name),
            Commands::Config { json } => Self::cmd_config(&loader, json),
            Commands::Init { .. } | Commands::Completions { .. } | Commands::Version => Ok(()),
        }
    }

    fn cmd_config(loader: &ConfigLoader, json: bool) -> tome_core::Result<()> {
        let config = loader.get();
        if json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!("{} {}", style("#").dim(), style(loader.path().display()).dim());
            println!(
                "{}",
                toml::to_string_pretty(config)
                    .map_err(|e| tome_core::TomeError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_version() -> tome_core::Result<()> {
        println!("📚 Tome v{}", env!("CARGO_PKG_VERSION"));
        println!("   Target: {}", std::env::consts::ARCH);
        println!("   OS: {}", std::env::consts::OS);
        #[cfg(debug_assertions)]
        println!("   Profile: debug");
        #[cfg(not(debug_assertions))]
        println!("   Profile: release");
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> tome_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "tome", &mut std::io::stdout());
        Ok(())
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        "json" => builder.json().with_target(true).init(),
        "compact" => builder.compact().with_target(false).init(),
        _ => builder.with_target(false).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_detail_keys() {
        assert_eq!(
            parse_detail_key("build/nix-expressions").unwrap(),
            ("build".to_string(), "nix-expressions".to_string())
        );
        assert!(parse_detail_key("build").is_err());
        assert!(parse_detail_key("/topic").is_err());
        assert!(parse_detail_key("build/").is_err());
    }

    #[test]
    fn match_joins_task_words() {
        let cli = Cli::try_parse_from(["tome", "match", "publish", "my", "build", "--json"]).unwrap();
        match cli.command {
            Commands::Match { task, json } => {
                assert_eq!(task.join(" "), "publish my build");
                assert!(json);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn match_requires_task() {
        assert!(Cli::try_parse_from(["tome", "match"]).is_err());
    }

    #[test]
    fn load_accepts_repeated_details() {
        let cli = Cli::try_parse_from([
            "tome", "load", "ship", "it", "-d", "build/containers", "--detail", "sharing/compose",
        ])
        .unwrap();
        match cli.command {
            Commands::Load { detail, .. } => assert_eq!(detail.len(), 2),
            _ => panic!("expected load command"),
        }
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["tome", "-v", "-q", "list"]).is_err());
    }
}
