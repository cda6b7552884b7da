//! envreg CLI
//!
//! Resolve typed variables from the environment and check that required
//! variables are set.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use envreg::{AnyVariable, EnvSource, ParseStrategy, ProcessEnv, Registry, RegistrySettings, Value, ValueKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envreg")]
#[command(about = "Resolve typed configuration from environment variables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single variable
    Resolve {
        /// Value kind (string, i32, u16, f64, bool, bytes, chars, ...)
        kind: ValueKind,

        /// Variable name
        name: String,

        /// Fallback used when the variable is unset or invalid
        #[arg(short, long)]
        fallback: Option<String>,

        /// Fail on invalid values instead of using the fallback
        #[arg(long)]
        strict: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that variables are set, given as KIND:NAME
    Check {
        #[arg(required = true)]
        variables: Vec<AnyVariable>,
    },

    /// Show registry settings
    Settings {
        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = RegistrySettings::load().context("loading ENVREG_* settings")?;

    match cli.command {
        Commands::Resolve { kind, name, fallback, strict, json } => {
            if strict {
                settings.strategy = ParseStrategy::FailFast;
            }
            let fallback = match fallback {
                Some(text) => Value::parse(kind, &text)
                    .ok_or_else(|| anyhow!("fallback {:?} is not a valid {}", text, kind))?,
                None => Value::default_for(kind),
            };

            let key = AnyVariable::new(name, kind);
            let registry = Registry::with_settings(&settings);
            registry.try_load_value(&ProcessEnv, &key, fallback)?;
            let value = registry
                .value(&key)
                .ok_or_else(|| anyhow!("{} was not stored", key))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", value);
            }
        }

        Commands::Check { variables } => {
            let registry = Registry::with_settings(&settings);
            for variable in &variables {
                let is_set = ProcessEnv
                    .get(variable.name())
                    .is_some_and(|raw| !(settings.empty_as_unset && raw.is_empty()));
                if is_set {
                    registry.try_load_value(&ProcessEnv, variable, Value::default_for(variable.kind()))?;
                }
            }

            match registry.configuration_keys_registered(&variables) {
                Ok(()) => {
                    println!("✅ All {} variables registered", variables.len());
                    for entry in registry.snapshot() {
                        println!("   {}:{}", entry.kind(), entry.name);
                    }
                }
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Settings { toml, json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else if toml {
                println!("{}", settings.to_toml()?);
            } else {
                println!("📋 Registry Settings\n");
                println!("  Strategy: {}", settings.strategy);
                println!("  Empty as unset: {}", settings.empty_as_unset);
                println!("\nSupported kinds:");
                let kinds: Vec<_> = ValueKind::ALL.iter().map(ValueKind::as_str).collect();
                println!("  {}", kinds.join(", "));
            }
        }
    }

    Ok(())
}
