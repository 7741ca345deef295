//! CloudKit CLI - Command line interface for object storage.
//!
//! This tool resolves a storage provider from a JSON config file and runs
//! a single object operation against it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cloudkit_common::StorageConfig;
use cloudkit_storage::{create_default_registry, StorageProvider};

#[derive(Parser)]
#[command(name = "cloudkit")]
#[command(about = "CloudKit - Uniform object storage across providers")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// JSON file holding the storage config sections.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Provider name, e.g. "local", "s3" or "aliyun-oss".
    #[arg(short, long, global = true, default_value = "local")]
    provider: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file as an object.
    Save {
        /// Object key.
        key: String,

        /// Source file to upload.
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Download an object.
    Load {
        /// Object key.
        key: String,

        /// Destination file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether an object exists.
    Exists {
        /// Object key.
        key: String,
    },

    /// Show size and modification time of an object.
    Stat {
        /// Object key.
        key: String,
    },

    /// List objects below a prefix.
    List {
        /// Prefix to list (default: everything).
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Delete an object.
    Delete {
        /// Object key.
        key: String,
    },

    /// Show registered provider names.
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Providers = cli.command {
        return cmd_providers();
    }

    let provider = open_provider(&cli.provider, cli.config.as_deref()).await?;

    match cli.command {
        Commands::Save { key, file } => cmd_save(provider.as_ref(), &key, &file).await,
        Commands::Load { key, output } => {
            cmd_load(provider.as_ref(), &key, output.as_deref()).await
        }
        Commands::Exists { key } => cmd_exists(provider.as_ref(), &key).await,
        Commands::Stat { key } => cmd_stat(provider.as_ref(), &key).await,
        Commands::List { prefix } => cmd_list(provider.as_ref(), &prefix).await,
        Commands::Delete { key } => cmd_delete(provider.as_ref(), &key).await,
        Commands::Providers => cmd_providers(),
    }
}

/// Read the config file and resolve the requested provider.
async fn open_provider(name: &str, config: Option<&Path>) -> Result<Arc<dyn StorageProvider>> {
    let config = match config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            StorageConfig::from_json_str(&raw).context("Invalid storage config")?
        }
        None => StorageConfig::default(),
    };

    let registry = create_default_registry().context("Failed to build provider registry")?;
    let provider = registry
        .resolve(name, config)
        .await
        .with_context(|| format!("Failed to open provider '{}'", name))?;

    info!("Using provider: {}", provider.provider_type());
    Ok(provider)
}

/// Upload a local file.
async fn cmd_save(provider: &dyn StorageProvider, key: &str, file: &Path) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let size = data.len();

    provider
        .save(key, data)
        .await
        .with_context(|| format!("Failed to save '{}'", key))?;

    println!("Saved {} ({} bytes)", key, size);
    Ok(())
}

/// Download an object to a file or stdout.
async fn cmd_load(provider: &dyn StorageProvider, key: &str, output: Option<&Path>) -> Result<()> {
    let data = provider
        .load(key)
        .await
        .with_context(|| format!("Failed to load '{}'", key))?;

    match output {
        Some(path) => {
            std::fs::write(path, &data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Loaded {} ({} bytes) to {}", key, data.len(), path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&data)
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

async fn cmd_exists(provider: &dyn StorageProvider, key: &str) -> Result<()> {
    let exists = provider
        .exists(key)
        .await
        .with_context(|| format!("Failed to check '{}'", key))?;
    println!("{}", exists);
    Ok(())
}

/// Print object state as JSON.
async fn cmd_stat(provider: &dyn StorageProvider, key: &str) -> Result<()> {
    let state = provider
        .stat(key)
        .await
        .with_context(|| format!("Failed to stat '{}'", key))?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

/// Print listed entries as JSON.
async fn cmd_list(provider: &dyn StorageProvider, prefix: &str) -> Result<()> {
    let mut entries = provider
        .list(prefix)
        .await
        .with_context(|| format!("Failed to list '{}'", prefix))?;
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

async fn cmd_delete(provider: &dyn StorageProvider, key: &str) -> Result<()> {
    provider
        .delete(key)
        .await
        .with_context(|| format!("Failed to delete '{}'", key))?;
    println!("Deleted {}", key);
    Ok(())
}

fn cmd_providers() -> Result<()> {
    let registry = create_default_registry().context("Failed to build provider registry")?;
    for name in registry.providers() {
        println!("{}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_with_global_options() {
        let cli = Cli::try_parse_from([
            "cloudkit",
            "list",
            "docs",
            "--provider",
            "s3",
            "--config",
            "storage.json",
        ])
        .unwrap();

        assert_eq!(cli.provider, "s3");
        assert_eq!(cli.config, Some(PathBuf::from("storage.json")));
        assert!(matches!(cli.command, Commands::List { prefix } if prefix == "docs"));
    }

    #[tokio::test]
    async fn test_open_provider_from_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path();
        let config_path = dir.join("storage.json");
        let root = dir.join("store");
        std::fs::write(
            &config_path,
            serde_json::json!({ "local": { "path": root } }).to_string(),
        )
        .unwrap();

        let provider = open_provider("local", Some(&config_path)).await.unwrap();
        cmd_save(provider.as_ref(), "a.txt", &config_path).await.unwrap();
        assert!(provider.exists("a.txt").await.unwrap());

        let err = open_provider("nope", Some(&config_path)).await.err().unwrap();
        assert!(format!("{:#}", err).contains("not in the provider list"));
    }
}
