//! SD Model Cache - command line entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sd_model_cache::{
    HubLoader, ModelFamily, ModelLoaders, ResolverConfig, TaskArgs, prepare_models, resolve_model,
    unapplied_proxy,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sd-model-cache")]
#[command(about = "Resolve inference task models into the local cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a single model identifier and print its local reference
    Resolve {
        /// Download URL or repository name
        identifier: String,

        /// Loader used when the identifier is a repository name
        #[arg(long, value_enum, default_value = "pipeline")]
        family: FamilyArg,
    },

    /// Resolve every model slot of a task argument JSON file
    Prepare {
        /// Task argument file
        task_args: PathBuf,

        /// Where to write the resolved arguments (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    Pipeline,
    Lora,
    TextualInversion,
}

impl From<FamilyArg> for ModelFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Pipeline => ModelFamily::Pipeline,
            FamilyArg::Lora => ModelFamily::Lora,
            FamilyArg::TextualInversion => ModelFamily::TextualInversion,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results
    match cli.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let config = ResolverConfig::load(cli.config)?;
    config.validate()?;

    tracing::debug!(
        hf_cache_dir = ?config.hf_cache_dir,
        external_cache_dir = ?config.external_cache_dir,
        proxy = ?config.proxy.as_ref().map(|p| &p.host),
        "Configuration loaded"
    );

    if let Some(proxy) = unapplied_proxy(config.proxy.as_ref()) {
        tracing::warn!(
            proxy = %proxy,
            "Named model downloads do not use the configured proxy; set HTTPS_PROXY to route them"
        );
    }

    match cli.command {
        Command::Resolve { identifier, family } => {
            let loader = HubLoader::new(family.into());
            let resolved = resolve_model(&identifier, &loader, &config).await?;
            println!("{}", resolved);
        }
        Command::Prepare { task_args, output } => {
            let content = std::fs::read_to_string(&task_args)
                .with_context(|| format!("Failed to read task arguments: {:?}", task_args))?;
            let mut args: TaskArgs =
                serde_json::from_str(&content).context("Failed to parse task arguments")?;

            let loaders = ModelLoaders {
                base: HubLoader::new(ModelFamily::Pipeline),
                lora: HubLoader::new(ModelFamily::Lora),
                textual_inversion: HubLoader::new(ModelFamily::TextualInversion),
            };
            prepare_models(&mut args, &loaders, &config).await?;

            let resolved = serde_json::to_string_pretty(&args)?;
            match output {
                Some(path) => std::fs::write(&path, resolved)
                    .with_context(|| format!("Failed to write resolved arguments: {:?}", path))?,
                None => println!("{}", resolved),
            }
        }
    }

    Ok(())
}
