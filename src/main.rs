//! eb-config CLI
//!
//! Entry point for the `eb-config` command-line tool: inspect the merged
//! deployment settings for an environment.

use clap::{Args, Parser, Subcommand};
use eb_config::logging::{init_logging, LogConfig};
use eb_config::{ConfigError, ConfigStore, RootDirResolver, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "eb-config")]
#[command(about = "Inspect merged deployment settings", version)]
struct Cli {
    /// Verbose logging to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Environment section to overlay (e.g., production)
    #[arg(long, short = 'e')]
    env: Option<String>,

    /// Path to config file (default: config/eb.yml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Project root that relative config paths are anchored at
    /// (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Expand ${NAME} environment references in the config file
    #[arg(long)]
    interpolate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List option settings
    Settings {
        #[command(flatten)]
        source: SourceArgs,

        /// List inactive settings instead of option settings
        #[arg(long)]
        inactive: bool,

        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,
    },

    /// Print the value of the first setting with the given option name
    Find {
        /// Option name to look up
        name: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Search inactive settings instead of option settings
        #[arg(long)]
        inactive: bool,
    },

    /// Print the whole merged configuration as JSON
    Show {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the config files that were merged, with digests, as JSON
    Sources {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match cli.command {
        Commands::Settings {
            source,
            inactive,
            human,
        } => run_settings(&source, inactive, human),
        Commands::Find {
            name,
            source,
            inactive,
        } => run_find(&name, &source, inactive),
        Commands::Show { source } => run_show(&source),
        Commands::Sources { source } => run_sources(&source),
    }
}

fn run_settings(source: &SourceArgs, inactive: bool, human: bool) {
    let store = load_store_or_exit(source);

    let result = if inactive {
        store.inactive_settings()
    } else {
        store.option_settings()
    };
    let settings = exit_on_error(result);

    if human {
        for setting in &settings {
            println!("{}", setting);
        }
    } else {
        print_json(&settings);
    }
}

fn run_find(name: &str, source: &SourceArgs, inactive: bool) {
    let store = load_store_or_exit(source);

    let result = if inactive {
        store.find_inactive_setting_value(name)
    } else {
        store.find_option_setting_value(name)
    };

    match exit_on_error(result) {
        Some(value) => println!("{}", value),
        None => {
            eprintln!("Setting not found: {}", name);
            process::exit(1);
        }
    }
}

fn run_show(source: &SourceArgs) {
    let store = load_store_or_exit(source);
    print_json(&store.tree().to_json());
}

fn run_sources(source: &SourceArgs) {
    let store = load_store_or_exit(source);
    print_json(store.sources());
}

fn load_store(source: &SourceArgs) -> Result<ConfigStore, ConfigError> {
    let mut store = ConfigStore::default().with_interpolation(source.interpolate);
    if let Some(root) = &source.root {
        store = store.with_resolver(RootDirResolver::new(root));
    }

    let path = source
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    store.load(source.env.as_deref(), path)?;

    // Files may extend disallow_environments, so check the merged list
    if let Some(env) = &source.env {
        store.ensure_environment_allowed(env)?;
    }
    Ok(store)
}

fn load_store_or_exit(source: &SourceArgs) -> ConfigStore {
    match load_store(source) {
        Ok(store) => store,
        Err(e @ ConfigError::DisallowedEnvironment(_)) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    }
}

fn exit_on_error<T>(result: Result<T, ConfigError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

